//! ADTS header parsing (ISO/IEC 13818-7 Annex B), for ingesting elementary-
//! stream AAC into the already-present `AudioSpecificConfig`/`esds`
//! machinery. LATM/LOAS framing is out of scope.

use std::io;

use crate::bitreader::BitReader;
use crate::boxes::mp4a::AudioSpecificConfig;

/// One parsed ADTS frame header.
#[derive(Debug, Clone, Copy)]
pub struct AdtsHeader {
    pub profile:                  u8,
    pub sampling_frequency_index: u8,
    pub channel_configuration:    u8,
    /// Total frame length in bytes, including the header.
    pub frame_length:             u16,
    /// Whether the fixed header is followed by a 2-byte CRC.
    pub protection_absent:        bool,
}

/// Parse one ADTS frame header starting at `data[0]`.
pub fn parse_header(data: &[u8]) -> io::Result<AdtsHeader> {
    if data.len() < 7 {
        return Err(ioerr!(UnexpectedEof, "ADTS header shorter than 7 bytes"));
    }
    let mut r = BitReader::new(data);
    let syncword = r.read_bits(12)?;
    if syncword != 0xfff {
        return Err(ioerr!(InvalidData, "missing ADTS sync word"));
    }
    let _id = r.read_bits(1)?;
    let _layer = r.read_bits(2)?;
    let protection_absent = r.read_bits(1)? != 0;
    let profile = r.read_bits(2)? as u8;
    let sampling_frequency_index = r.read_bits(4)? as u8;
    let _private_bit = r.read_bits(1)?;
    let channel_configuration = r.read_bits(3)? as u8;
    let _original_copy = r.read_bits(1)?;
    let _home = r.read_bits(1)?;
    let _copyright_id_bit = r.read_bits(1)?;
    let _copyright_id_start = r.read_bits(1)?;
    let frame_length = r.read_bits(13)? as u16;
    let _buffer_fullness = r.read_bits(11)?;
    let _num_raw_blocks_minus1 = r.read_bits(2)?;

    if sampling_frequency_index >= 13 {
        return Err(ioerr!(InvalidData, "invalid ADTS sampling_frequency_index {}", sampling_frequency_index));
    }
    if (frame_length as usize) < 7 {
        return Err(ioerr!(InvalidData, "ADTS frame_length {} shorter than the header", frame_length));
    }

    Ok(AdtsHeader {
        profile,
        sampling_frequency_index,
        channel_configuration,
        frame_length,
        protection_absent,
    })
}

impl AdtsHeader {
    /// Size of the fixed header plus optional CRC, i.e. where the raw AAC
    /// payload starts within the frame.
    pub fn header_size(&self) -> usize {
        if self.protection_absent { 7 } else { 9 }
    }

    /// Build an `AudioSpecificConfig` (MPEG-4 audio object type `profile + 1`,
    /// ISO/IEC 14496-3 1.6.2.1) for the `esds` box that will carry this
    /// elementary stream once muxed into ISOBMFF.
    pub fn to_audio_specific_config(&self) -> AudioSpecificConfig {
        AudioSpecificConfig {
            profile: self.profile + 1,
            sampling_frequency_index: self.sampling_frequency_index,
            sampling_frequency: 0,
            channel_config: self.channel_configuration,
        }
    }
}

/// Split a byte stream of back-to-back ADTS frames into individual raw AAC
/// access units (header stripped).
pub fn split_frames(data: &[u8]) -> io::Result<Vec<&[u8]>> {
    let mut frames = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let header = parse_header(&data[pos..])?;
        let len = header.frame_length as usize;
        if pos + len > data.len() {
            return Err(ioerr!(UnexpectedEof, "ADTS frame_length overruns buffer"));
        }
        frames.push(&data[pos + header.header_size()..pos + len]);
        pos += len;
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_frame(profile: u8, sfi: u8, channels: u8, payload_len: usize) -> Vec<u8> {
        let frame_length = 7 + payload_len;
        let mut w = crate::bitreader::BitWriter::new();
        w.write_bits(0xfff, 12);
        w.write_bit(false); // id
        w.write_bits(0, 2); // layer
        w.write_bit(true); // protection_absent
        w.write_bits(profile as u32, 2);
        w.write_bits(sfi as u32, 4);
        w.write_bit(false); // private_bit
        w.write_bits(channels as u32, 3);
        w.write_bit(false);
        w.write_bit(false);
        w.write_bit(false);
        w.write_bit(false);
        w.write_bits(frame_length as u32, 13);
        w.write_bits(0x7ff, 11);
        w.write_bits(0, 2);
        let mut bytes = w.into_bytes();
        bytes.extend(std::iter::repeat(0xAAu8).take(payload_len));
        bytes
    }

    #[test]
    fn parses_header_fields() {
        let frame = build_frame(1, 3, 2, 10);
        let h = parse_header(&frame).unwrap();
        assert_eq!(h.profile, 1);
        assert_eq!(h.sampling_frequency_index, 3);
        assert_eq!(h.channel_configuration, 2);
        assert_eq!(h.frame_length as usize, frame.len());
        assert!(h.protection_absent);

        let config = h.to_audio_specific_config();
        assert_eq!(config.profile, 2); // AAC-LC object type
        assert_eq!(config.channel_config, 2);
    }

    #[test]
    fn rejects_bad_sync_word() {
        let mut frame = build_frame(1, 3, 2, 10);
        frame[0] = 0;
        assert!(parse_header(&frame).is_err());
    }

    #[test]
    fn splits_two_back_to_back_frames() {
        let mut data = build_frame(1, 3, 2, 5);
        data.extend(build_frame(1, 3, 2, 8));
        let frames = split_frames(&data).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].len(), 5);
        assert_eq!(frames[1].len(), 8);
    }
}
