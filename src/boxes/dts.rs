//
// ETSI TS 102 114 / DTS in ISOBMFF.
//
// `dtsc` (core), `dtsh` (core, backward compatible with legacy decoders)
// and `dtse` (low bit-rate, LBR-only) share the same sample entry layout;
// each gets its own `def_box!` instantiation for the same reason `hvc1`
// does (distinct `BoxInfo::FOURCC`, no per-instance fourcc override).
//

use std::io;

use crate::boxes::prelude::*;
use crate::track::AudioTrackInfo;

macro_rules! dts_sample_entry {
    ($name:ident, $fourcc:expr) => {
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
                // sub boxes, probably only ddts.
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
                    channel_count:         2,
                    sample_size:           16,
                    sample_rate_hi:        0,
                    sample_rate_lo:        0,
                    boxes:                 Vec::new(),
                }
            }
        }

        impl $name {
            pub fn track_info(&self) -> AudioTrackInfo {
                let mut ai = AudioTrackInfo {
                    codec_id:   $fourcc.to_string(),
                    codec_name: Some("DTS".to_string()),
                    channel_count: self.channel_count,
                    bit_depth: if self.sample_size > 0 { Some(self.sample_size) } else { None },
                    sample_rate: if self.sample_rate_hi > 0 { Some(self.sample_rate_hi as u32) } else { None },
                    ..AudioTrackInfo::default()
                };
                if let Some(ddts) = first_box!(&self.boxes, DTSSpecificBox) {
                    ai.sample_rate = Some(ddts.sample_rate);
                    ai.avg_bitrate = Some(ddts.avg_bit_rate);
                    ai.max_bitrate = Some(ddts.peak_bit_rate.max(ddts.avg_bit_rate));
                }
                ai
            }
        }
    };
}

dts_sample_entry!(DtsCoreSampleEntry, "dtsc");
dts_sample_entry!(DtsHdSampleEntry, "dtsh");
dts_sample_entry!(DtsExpressSampleEntry, "dtse");

def_struct! {
    /// `ddts`: DTS Specific Box (ETSI TS 102 114 Annex F).
    DTSSpecificBox,
        sample_rate:            u32,
        max_bit_rate:           u32,
        avg_bit_rate:           u32,
        peak_bit_rate:          u32,
        pcm_sample_depth:       u8,
        frame_duration_code:    u8,
        stream_construction:    u8,
        coreLFE_present:        bool,
        core_layout:            u8,
        core_size:              u16,
        stereo_downmix_present: bool,
        rep_type:               u8,
}

impl BoxInfo for DTSSpecificBox {
    const FOURCC: &'static str = "ddts";
}

impl FullBox for DTSSpecificBox {}
