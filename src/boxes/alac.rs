//
// ALAC (Apple Lossless) in ISOBMFF.
//
// Note: the ALAC magic cookie box inconveniently shares its parent sample
// entry's fourcc ("alac" nested inside "alac"), which the box registry
// can't dispatch on fourcc alone (one fourcc, one `MP4Box` variant). Rather
// than special-case the registry, `AlacSampleEntry` parses its single
// child as a raw size+fourcc+payload record directly into
// `AlacSpecificBox`, bypassing `boxes::MP4Box` for this one nested box.

use std::io;

use crate::boxes::prelude::*;
use crate::track::AudioTrackInfo;

def_box! {
    /// ALAC sample entry (AudioSampleEntry).
    AlacSampleEntry {
        skip:                   6,
        data_reference_index:   u16,
        skip:                   8,
        channel_count:          u16,
        sample_size:            u16,
        skip:                   4,
        sample_rate_hi:         u16,
        sample_rate_lo:         u16,
        cookie:                 AlacSpecificBox,
    },
    fourcc => "alac",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl Default for AlacSampleEntry {
    fn default() -> Self {
        AlacSampleEntry {
            data_reference_index: 1,
            channel_count:        2,
            sample_size:          16,
            sample_rate_hi:       0,
            sample_rate_lo:       0,
            cookie:               AlacSpecificBox::default(),
        }
    }
}

impl AlacSampleEntry {
    pub fn track_info(&self) -> AudioTrackInfo {
        AudioTrackInfo {
            codec_id:      "alac".to_string(),
            codec_name:    Some("Apple Lossless".to_string()),
            channel_count: self.cookie.num_channels as u16,
            bit_depth:     Some(self.cookie.bit_depth as u16),
            sample_rate:   Some(self.cookie.sample_rate),
            avg_bitrate:   if self.cookie.avg_bit_rate > 0 { Some(self.cookie.avg_bit_rate) } else { None },
            max_bitrate:   if self.cookie.max_bit_rate > 0 { Some(self.cookie.max_bit_rate) } else { None },
            ..AudioTrackInfo::default()
        }
    }
}

/// ALAC magic cookie (`alacMagicCookieDescription`, one struct, 24 bytes
/// after `frame_length`/`compatible_version`).
#[derive(Debug, Clone, Default)]
pub struct AlacSpecificBox {
    pub frame_length:        u32,
    pub compatible_version:  u8,
    pub bit_depth:           u8,
    pub pb:                  u8,
    pub mb:                  u8,
    pub kb:                  u8,
    pub num_channels:        u8,
    pub max_run:             u16,
    pub max_frame_bytes:     u32,
    pub avg_bit_rate:        u32,
    pub sample_rate:         u32,
}

impl FromBytes for AlacSpecificBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<AlacSpecificBox> {
        let size = u32::from_bytes(stream)? as u64;
        let fourcc = FourCC::from_bytes(stream)?;
        if fourcc != b"alac" {
            return Err(ioerr!(InvalidData, "expected nested 'alac' magic cookie box, got {:?}", fourcc));
        }
        // version/flags (fullbox-style, version always 0 in practice).
        let _version_flags = u32::from_bytes(stream)?;
        let payload_len = size.saturating_sub(12);
        if payload_len < 24 {
            return Err(ioerr!(UnexpectedEof, "truncated ALAC magic cookie"));
        }
        Ok(AlacSpecificBox {
            frame_length:       u32::from_bytes(stream)?,
            compatible_version: u8::from_bytes(stream)?,
            bit_depth:          u8::from_bytes(stream)?,
            pb:                 u8::from_bytes(stream)?,
            mb:                 u8::from_bytes(stream)?,
            kb:                 u8::from_bytes(stream)?,
            num_channels:       u8::from_bytes(stream)?,
            max_run:            u16::from_bytes(stream)?,
            max_frame_bytes:    u32::from_bytes(stream)?,
            avg_bit_rate:       u32::from_bytes(stream)?,
            sample_rate:        u32::from_bytes(stream)?,
        })
    }

    fn min_size() -> usize {
        36
    }
}

impl ToBytes for AlacSpecificBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        let size = 36u32;
        size.to_bytes(stream)?;
        FourCC::new("alac").to_bytes(stream)?;
        0u32.to_bytes(stream)?;
        self.frame_length.to_bytes(stream)?;
        self.compatible_version.to_bytes(stream)?;
        self.bit_depth.to_bytes(stream)?;
        self.pb.to_bytes(stream)?;
        self.mb.to_bytes(stream)?;
        self.kb.to_bytes(stream)?;
        self.num_channels.to_bytes(stream)?;
        self.max_run.to_bytes(stream)?;
        self.max_frame_bytes.to_bytes(stream)?;
        self.avg_bit_rate.to_bytes(stream)?;
        self.sample_rate.to_bytes(stream)
    }
}

impl AlacSpecificBox {
    /// Build a magic cookie from the parameters an ALAC encoder would hand
    /// the muxer.
    pub fn construct(
        frame_length: u32,
        bit_depth: u8,
        num_channels: u8,
        sample_rate: u32,
    ) -> AlacSpecificBox {
        AlacSpecificBox {
            frame_length,
            compatible_version: 0,
            bit_depth,
            pb: 40,
            mb: 10,
            kb: 14,
            num_channels,
            max_run: 255,
            max_frame_bytes: 0,
            avg_bit_rate: 0,
            sample_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_cookie_roundtrips() {
        let cookie = AlacSpecificBox::construct(4096, 16, 2, 44100);
        let mut buf = crate::io::MemBuffer::new();
        cookie.to_bytes(&mut buf).unwrap();
        let bytes = buf.into_vec();

        let mut slice: &[u8] = &bytes;
        let parsed = AlacSpecificBox::from_bytes(&mut slice).unwrap();
        assert_eq!(parsed.frame_length, 4096);
        assert_eq!(parsed.bit_depth, 16);
        assert_eq!(parsed.num_channels, 2);
        assert_eq!(parsed.sample_rate, 44100);
    }
}
