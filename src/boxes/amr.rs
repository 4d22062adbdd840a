//
// 3GPP TS 26.244 -- AMR (Adaptive Multi-Rate) audio in ISOBMFF.
//

use std::io;

use crate::boxes::prelude::*;
use crate::track::AudioTrackInfo;

macro_rules! amr_sample_entry {
    ($name:ident, $fourcc:expr, $codec_name:expr) => {
        def_box! {
            $name {
                skip:                   6,
                data_reference_index:   u16,
                skip:                   8,
                channel_count:          u16,
                sample_size:            u16,
                skip:                   4,
                sample_rate_hi:         u16,
                sample_rate_lo:         u16,
                // sub boxes, always a damr.
                boxes: Vec<MP4Box>,
            },
            fourcc => $fourcc,
            version => [],
            impls => [ basebox, boxinfo, debug, fromtobytes ],
        }

        impl Default for $name {
            fn default() -> $name {
                $name {
                    data_reference_index: 1,
                    channel_count:        1,
                    sample_size:          16,
                    sample_rate_hi:       0,
                    sample_rate_lo:       0,
                    boxes:                Vec::new(),
                }
            }
        }

        impl $name {
            pub fn track_info(&self) -> AudioTrackInfo {
                let mut ai = AudioTrackInfo {
                    codec_id:   $fourcc.to_string(),
                    codec_name: Some($codec_name.to_string()),
                    channel_count: self.channel_count,
                    bit_depth: if self.sample_size > 0 { Some(self.sample_size) } else { None },
                    sample_rate: if self.sample_rate_hi > 0 { Some(self.sample_rate_hi as u32) } else { None },
                    ..AudioTrackInfo::default()
                };
                if let Some(damr) = first_box!(&self.boxes, AmrSpecificBox) {
                    ai.codec_name = Some(format!("{} ({} frames/sample)", $codec_name, damr.frames_per_sample));
                }
                ai
            }
        }
    };
}

amr_sample_entry!(AmrNbSampleEntry, "samr", "AMR Narrowband");
amr_sample_entry!(AmrWbSampleEntry, "sawb", "AMR Wideband");

def_struct! {
    /// AMR Specific Box (`damr`, 3GPP TS 26.244 6.7).
    AmrSpecificBox,
        vendor:                FourCC,
        decoder_version:       u8,
        mode_set:               u16,
        mode_change_period:     u8,
        frames_per_sample:      u8,
}

impl BoxInfo for AmrSpecificBox {
    const FOURCC: &'static str = "damr";
}

impl FullBox for AmrSpecificBox {}
