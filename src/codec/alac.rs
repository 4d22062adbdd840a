//! ALAC (Apple Lossless) magic-cookie construction from encoder parameters.
//!
//! Unlike the other codec modules, ALAC has no sync-frame header to scan --
//! the magic cookie is built directly from the frame-length/sample-size/
//! channel parameters the encoder already knows, via
//! `AlacSpecificBox::construct` (the box-level constructor already does the
//! fixed-field layout; this just names the entry point the rest of `codec::*`
//! uses).

use std::io;

use crate::boxes::alac::AlacSpecificBox;

/// Build an `alac` magic cookie (`construct_from_frame` in the distilled
/// spec's vocabulary, though ALAC has no per-frame header to parse from).
pub fn construct(frame_length: u32, bit_depth: u8, num_channels: u8, sample_rate: u32) -> io::Result<AlacSpecificBox> {
    if num_channels == 0 {
        return Err(ioerr!(InvalidData, "ALAC channel count must be nonzero"));
    }
    if sample_rate == 0 {
        return Err(ioerr!(InvalidData, "ALAC sample rate must be nonzero"));
    }
    Ok(AlacSpecificBox::construct(frame_length, bit_depth, num_channels, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_cookie_from_parameters() {
        let cookie = construct(4096, 16, 2, 44100).unwrap();
        assert_eq!(cookie.num_channels, 2);
        assert_eq!(cookie.sample_rate, 44100);
    }

    #[test]
    fn rejects_zero_channels() {
        assert!(construct(4096, 16, 0, 44100).is_err());
    }
}
