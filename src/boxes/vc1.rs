//
// SMPTE RP 2025 -- VC-1 in ISOBMFF.
//

use std::io;

use crate::boxes::prelude::*;
use crate::track::VideoTrackInfo;

def_box! {
    /// VC-1 sample entry (VideoSampleEntry).
    Vc1SampleEntry {
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
    fourcc => "vc-1",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl Default for Vc1SampleEntry {
    fn default() -> Self {
        Vc1SampleEntry {
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

impl Vc1SampleEntry {
    pub fn track_info(&self) -> VideoTrackInfo {
        let config = first_box!(&self.boxes, Vc1ConfigurationBox);
        let codec_id = match config {
            Some(ref c) => format!("vc-1.{:02x}.{:02x}", c.record.profile, c.record.level),
            None => "vc-1.unknown".to_string(),
        };
        VideoTrackInfo { codec_id, codec_name: Some("VC-1".to_string()) }
    }
}

def_box! {
    /// Box that contains the VC-1 Decoder Configuration Record.
    Vc1ConfigurationBox {
        record: Vc1DecoderConfigurationRecord,
    },
    fourcc => "dvc1",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

def_struct! {
    /// VC-1 Decoder Configuration Record (SMPTE RP 2025).
    ///
    /// `sequence_header` carries the raw entry-point/sequence-header EBDUs
    /// verbatim -- the record's own bit-packed fields (interlace, framerate
    /// flags, etc.) are not reconstructed since `mux`/`finalize` never need
    /// to re-derive them from parsed bits, only to pass the importer's
    /// already-built record through.
    Vc1DecoderConfigurationRecord,
        profile:           u8,
        level:             u8,
        sequence_header:   Data,
}
