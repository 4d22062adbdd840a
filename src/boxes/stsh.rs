//
// ISO/IEC 14496-12:2015(E)
// 8.7.6 Shadow Sync Sample Box
//

use std::io;

use crate::boxes::prelude::*;

def_box! {
    /// Shadow Sync Sample Box (`stsh`). Maps samples that are not
    /// themselves sync samples to a nearby sync sample that can stand in
    /// for them when seeking (rarely produced by modern muxers, but read
    /// and round-tripped when remuxing an existing file that has one).
    ShadowSyncSampleBox {
        entries: ArraySized32<ShadowSyncSampleEntry>,
    },
    fourcc => "stsh",
    version => [0],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

def_struct! {
    /// Entry in a `ShadowSyncSampleBox`.
    ShadowSyncSampleEntry,
        shadowed_sample_number: u32,
        sync_sample_number:     u32,
}
