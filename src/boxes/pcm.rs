//
// QuickTime / ISO raw PCM sample entries (`sowt`, `twos`, `in24`, `in32`,
// `fl32`, `fl64`, `lpcm`). All share the plain `AudioSampleEntry` layout;
// any accompanying channel layout (`chan`) is read back as a `GenericBox`
// and passed through unmodified -- nothing downstream needs to interpret
// it, only preserve it across a remux.
//

use std::io;

use crate::boxes::prelude::*;
use crate::track::AudioTrackInfo;

macro_rules! pcm_sample_entry {
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
                // e.g. a passthrough 'chan' box.
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
                    channel_count:        2,
                    sample_size:          16,
                    sample_rate_hi:       0,
                    sample_rate_lo:       0,
                    boxes:                Vec::new(),
                }
            }
        }

        impl $name {
            pub fn track_info(&self) -> AudioTrackInfo {
                AudioTrackInfo {
                    codec_id:   $fourcc.to_string(),
                    codec_name: Some($codec_name.to_string()),
                    channel_count: self.channel_count,
                    bit_depth: if self.sample_size > 0 { Some(self.sample_size) } else { None },
                    sample_rate: if self.sample_rate_hi > 0 { Some(self.sample_rate_hi as u32) } else { None },
                    ..AudioTrackInfo::default()
                }
            }
        }
    };
}

pcm_sample_entry!(SowtSampleEntry, "sowt", "PCM (little-endian)");
pcm_sample_entry!(TwosSampleEntry, "twos", "PCM (big-endian)");
pcm_sample_entry!(In24SampleEntry, "in24", "PCM 24-bit (little-endian)");
pcm_sample_entry!(In32SampleEntry, "in32", "PCM 32-bit (little-endian)");
pcm_sample_entry!(Fl32SampleEntry, "fl32", "PCM float 32-bit");
pcm_sample_entry!(Fl64SampleEntry, "fl64", "PCM float 64-bit");
pcm_sample_entry!(LpcmSampleEntry, "lpcm", "PCM (QuickTime lpcm)");
