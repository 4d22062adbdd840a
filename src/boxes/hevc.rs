//
// ISO/IEC 14496-15 8.3/8.4 HEVC Video Stream Definition
//

use std::io;

use crate::boxes::prelude::*;
use crate::track::VideoTrackInfo;

def_box! {
    /// HEVC sample entry (VideoSampleEntry), used for both `hev1` and `hvc1`.
    HevcSampleEntry {
        skip:                   6,
        data_reference_index:   u16,
        skip:                   16,
        width:                  u16,
        height:                 u16,
        video_horizontal_dpi:   FixedFloat16_16,
        video_vertical_dpi:     FixedFloat16_16,
        skip:                   4,
        video_frame_count:      u16,
        skip:                   32,
        video_pixel_depth:      u16,
        skip:                   2,
        boxes:                  Vec<MP4Box>,
    },
    fourcc => "hev1",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl Default for HevcSampleEntry {
    fn default() -> Self {
        HevcSampleEntry {
            data_reference_index: 1,
            width:                1280,
            height:               720,
            video_horizontal_dpi: FixedFloat16_16::from(72f64),
            video_vertical_dpi:   FixedFloat16_16::from(72f64),
            video_frame_count:    1,
            video_pixel_depth:    24,
            boxes:                Vec::new(),
        }
    }
}

impl HevcSampleEntry {
    pub fn track_info(&self) -> VideoTrackInfo {
        let config = first_box!(&self.boxes, HevcConfigurationBox);
        let codec_id = match config {
            Some(ref h) => h.configuration.codec_id(),
            None => "hvc1.unknown".to_string(),
        };
        VideoTrackInfo { codec_id, codec_name: Some("HEVC".to_string()) }
    }
}

// `hvc1` differs from `hev1` only in where parameter sets may live (inside
// vs. outside the sample entry); the in-memory layout is identical, but
// unlike `stco`/`co64` (one runtime fourcc field) each needs its own
// `BoxInfo::FOURCC`, so it gets its own (near-identical) `def_box!`.
def_box! {
    /// HEVC sample entry (VideoSampleEntry) variant that requires parameter
    /// sets to be present in the sample entry itself.
    Hvc1SampleEntry {
        skip:                   6,
        data_reference_index:   u16,
        skip:                   16,
        width:                  u16,
        height:                 u16,
        video_horizontal_dpi:   FixedFloat16_16,
        video_vertical_dpi:     FixedFloat16_16,
        skip:                   4,
        video_frame_count:      u16,
        skip:                   32,
        video_pixel_depth:      u16,
        skip:                   2,
        boxes:                  Vec<MP4Box>,
    },
    fourcc => "hvc1",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl Default for Hvc1SampleEntry {
    fn default() -> Self {
        Hvc1SampleEntry {
            data_reference_index: 1,
            width:                1280,
            height:               720,
            video_horizontal_dpi: FixedFloat16_16::from(72f64),
            video_vertical_dpi:   FixedFloat16_16::from(72f64),
            video_frame_count:    1,
            video_pixel_depth:    24,
            boxes:                Vec::new(),
        }
    }
}

impl Hvc1SampleEntry {
    pub fn track_info(&self) -> VideoTrackInfo {
        let config = first_box!(&self.boxes, HevcConfigurationBox);
        let codec_id = match config {
            Some(ref h) => h.configuration.codec_id(),
            None => "hvc1.unknown".to_string(),
        };
        VideoTrackInfo { codec_id, codec_name: Some("HEVC".to_string()) }
    }
}

def_box! {
    /// Box that contains the HEVC Decoder Configuration Record.
    HevcConfigurationBox {
        configuration: HevcDecoderConfigurationRecord,
    },
    fourcc => "hvcC",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

/// One `nal_unit` array entry of the HEVC decoder configuration record.
#[derive(Debug, Clone)]
pub struct HevcNalArray {
    pub array_completeness: bool,
    pub nal_unit_type:      u8,
    pub nal_units:          Vec<Vec<u8>>,
}

/// HEVC Decoder Configuration Record (ISO/IEC 14496-15 8.3.3.1).
#[derive(Debug, Clone, Default)]
pub struct HevcDecoderConfigurationRecord {
    pub configuration_version:      u8,
    pub general_profile_space:      u8,
    pub general_tier_flag:          bool,
    pub general_profile_idc:        u8,
    pub general_profile_compatibility_flags: u32,
    pub general_constraint_indicator_flags:  u64, // 48 bits used
    pub general_level_idc:          u8,
    pub min_spatial_segmentation_idc: u16,
    pub parallelism_type:           u8,
    pub chroma_format_idc:          u8,
    pub bit_depth_luma_minus8:      u8,
    pub bit_depth_chroma_minus8:    u8,
    pub avg_frame_rate:             u16,
    pub constant_frame_rate:        u8,
    pub num_temporal_layers:        u8,
    pub temporal_id_nested:         bool,
    pub length_size_minus_one:      u8,
    pub arrays:                     Vec<HevcNalArray>,
}

impl FromBytes for HevcDecoderConfigurationRecord {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<Self> {
        let configuration_version = u8::from_bytes(stream)?;
        let b1 = u8::from_bytes(stream)?;
        let general_profile_space = (b1 >> 6) & 0x03;
        let general_tier_flag = (b1 & 0x20) != 0;
        let general_profile_idc = b1 & 0x1f;
        let general_profile_compatibility_flags = u32::from_bytes(stream)?;
        let mut constraint = [0u8; 6];
        for b in constraint.iter_mut() {
            *b = u8::from_bytes(stream)?;
        }
        let general_constraint_indicator_flags = constraint.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
        let general_level_idc = u8::from_bytes(stream)?;
        let min_spatial_segmentation_idc = u16::from_bytes(stream)? & 0x0fff;
        let parallelism_type = u8::from_bytes(stream)? & 0x03;
        let chroma_format_idc = u8::from_bytes(stream)? & 0x03;
        let bit_depth_luma_minus8 = u8::from_bytes(stream)? & 0x07;
        let bit_depth_chroma_minus8 = u8::from_bytes(stream)? & 0x07;
        let avg_frame_rate = u16::from_bytes(stream)?;
        let b2 = u8::from_bytes(stream)?;
        let constant_frame_rate = (b2 >> 6) & 0x03;
        let num_temporal_layers = (b2 >> 3) & 0x07;
        let temporal_id_nested = (b2 & 0x04) != 0;
        let length_size_minus_one = b2 & 0x03;

        let num_arrays = u8::from_bytes(stream)?;
        let mut arrays = Vec::with_capacity(num_arrays as usize);
        for _ in 0..num_arrays {
            let b3 = u8::from_bytes(stream)?;
            let array_completeness = (b3 & 0x80) != 0;
            let nal_unit_type = b3 & 0x3f;
            let num_nalus = u16::from_bytes(stream)?;
            let mut nal_units = Vec::with_capacity(num_nalus as usize);
            for _ in 0..num_nalus {
                let len = u16::from_bytes(stream)? as u64;
                let buf = stream.read(len)?.to_vec();
                nal_units.push(buf);
            }
            arrays.push(HevcNalArray { array_completeness, nal_unit_type, nal_units });
        }

        Ok(HevcDecoderConfigurationRecord {
            configuration_version,
            general_profile_space,
            general_tier_flag,
            general_profile_idc,
            general_profile_compatibility_flags,
            general_constraint_indicator_flags,
            general_level_idc,
            min_spatial_segmentation_idc,
            parallelism_type,
            chroma_format_idc,
            bit_depth_luma_minus8,
            bit_depth_chroma_minus8,
            avg_frame_rate,
            constant_frame_rate,
            num_temporal_layers,
            temporal_id_nested,
            length_size_minus_one,
            arrays,
        })
    }

    fn min_size() -> usize {
        23
    }
}

impl ToBytes for HevcDecoderConfigurationRecord {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        self.configuration_version.to_bytes(stream)?;
        let b1 = ((self.general_profile_space & 0x03) << 6)
            | ((self.general_tier_flag as u8) << 5)
            | (self.general_profile_idc & 0x1f);
        b1.to_bytes(stream)?;
        self.general_profile_compatibility_flags.to_bytes(stream)?;
        let c = self.general_constraint_indicator_flags;
        for i in (0..6).rev() {
            (((c >> (i * 8)) & 0xff) as u8).to_bytes(stream)?;
        }
        self.general_level_idc.to_bytes(stream)?;
        (0xf000u16 | self.min_spatial_segmentation_idc).to_bytes(stream)?;
        (0xfcu8 | self.parallelism_type).to_bytes(stream)?;
        (0xfcu8 | self.chroma_format_idc).to_bytes(stream)?;
        (0xf8u8 | self.bit_depth_luma_minus8).to_bytes(stream)?;
        (0xf8u8 | self.bit_depth_chroma_minus8).to_bytes(stream)?;
        self.avg_frame_rate.to_bytes(stream)?;
        let b2 = ((self.constant_frame_rate & 0x03) << 6)
            | ((self.num_temporal_layers & 0x07) << 3)
            | ((self.temporal_id_nested as u8) << 2)
            | (self.length_size_minus_one & 0x03);
        b2.to_bytes(stream)?;

        (self.arrays.len() as u8).to_bytes(stream)?;
        for array in &self.arrays {
            let b3 = ((array.array_completeness as u8) << 7) | (array.nal_unit_type & 0x3f);
            b3.to_bytes(stream)?;
            (array.nal_units.len() as u16).to_bytes(stream)?;
            for nal in &array.nal_units {
                (nal.len() as u16).to_bytes(stream)?;
                stream.write(nal)?;
            }
        }
        Ok(())
    }
}

impl HevcDecoderConfigurationRecord {
    /// Return codec id as e.g. "hvc1.1.6.L93.90".
    pub fn codec_id(&self) -> String {
        let profile_space = match self.general_profile_space {
            1 => "A",
            2 => "B",
            3 => "C",
            _ => "",
        };
        let tier = if self.general_tier_flag { "H" } else { "L" };
        format!(
            "hvc1.{}{}.{:x}.{}{}.B0",
            profile_space, self.general_profile_idc, self.general_profile_compatibility_flags,
            tier, self.general_level_idc
        )
    }
}

impl std::fmt::Display for HevcDecoderConfigurationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.codec_id())
    }
}
