use std::io;

use crate::boxes::prelude::*;
use crate::boxes::{SampleDescriptionBox, SampleSizeBox, TimeToSampleBox, SampleToChunkBox};
use crate::boxes::ChunkOffsetBox;
use crate::boxes::{CompositionOffsetBox, SyncSampleBox};
use crate::boxes::{SampleDependencyTypeBox, SampleToGroupBox, SampleGroupDescriptionBox};
use crate::boxes::{CompositionToDecodeBox, ShadowSyncSampleBox};

def_box! {
    /// 8.1.1 Sample Table Box (ISO/IEC 14496-12:2015(E))
    ///
    /// It usually contains:
    ///
    /// - TimeToSampleBox, stts
    /// - CompositionOffsetBox. ctts
    /// - SampleDescriptionBox, stsd
    /// - SampleSizeBox, stsz, or CompactSampleSizeBox, stz2
    /// - SampleToChunkBox, stsc
    /// - ChunkOffsetBox, stco, or ChunkLargeOffsetBox, co64
    /// 
    /// Optionally:
    ///
    /// - SyncSampleBox, stss
    /// - SampleToGroupBox, sbgp
    /// - SampleGroupDescriptionBox, sgpd (minimal support)
    ///
    /// We don't implement:
    ///
    /// - CompositionToDecodeBox, cslg
    /// - ShadowSyncBox, stsh
    /// - DegrationPriorityBox, stdp
    /// - SamplePaddingBitsBox, padb
    /// - SampleDependencyTypeBox, sdtp
    /// - SubSampleInformationBox, subs
    /// - SampleAuxiliaryInformationSizesBox, saiz
    /// - SampleAuxiliaryInformationOffsetsBox, saio
    ///
    #[derive(Default)]
    SampleTableBox {
        boxes:      Vec<MP4Box>,
    },
    fourcc => "stbl",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl SampleTableBox {

    declare_box_methods!(SampleDescriptionBox, sample_description, sample_description_mut);
    declare_box_methods!(SampleSizeBox, sample_size, sample_size_mut);
    declare_box_methods!(TimeToSampleBox, time_to_sample, time_to_sample_mut);
    declare_box_methods!(SampleToChunkBox, sample_to_chunk, sample_to_chunk_mut);
    declare_box_methods!(ChunkOffsetBox, chunk_offset, chunk_offset_mut);
    declare_box_methods_opt!(CompositionOffsetBox, composition_time_to_sample, composition_time_to_sample_mut);
    declare_box_methods_opt!(SyncSampleBox, sync_samples, sync_samples_mut);
    declare_box_methods_opt!(SampleDependencyTypeBox, sample_dependency, sample_dependency_mut);
    declare_box_methods_opt!(CompositionToDecodeBox, composition_to_decode, composition_to_decode_mut);
    declare_box_methods_opt!(ShadowSyncSampleBox, shadow_sync, shadow_sync_mut);

    /// All `SampleToGroupBox`es present, one per grouping type.
    pub fn sample_to_group(&self) -> impl Iterator<Item = &SampleToGroupBox> {
        iter_box!(&self.boxes, SampleToGroupBox)
    }

    /// All `SampleGroupDescriptionBox`es present, one per grouping type.
    pub fn sample_group_description(&self) -> impl Iterator<Item = &SampleGroupDescriptionBox> {
        iter_box!(&self.boxes, SampleGroupDescriptionBox)
    }

    /// The `SampleToGroupBox`/`SampleGroupDescriptionBox` pair for a grouping type
    /// such as `"rap "` or `"roll"`, if both halves are present.
    pub fn sample_group(&self, grouping_type: &FourCC) -> Option<(&SampleToGroupBox, &SampleGroupDescriptionBox)> {
        let sbgp = self.sample_to_group().find(|b| &b.grouping_type == grouping_type)?;
        let sgpd = self.sample_group_description().find(|b| &b.grouping_type() == grouping_type)?;
        Some((sbgp, sgpd))
    }

    /// Add `delta` to every entry in the chunk-offset table.
    ///
    /// Used by `moov`-to-front relocation: once the metadata header is
    /// known to precede the media data, every stored chunk offset has to
    /// shift by exactly the header's serialized size.
    pub fn move_chunk_offsets_up(&mut self, delta: u64) {
        let co = self.chunk_offset_mut();
        for e in co.entries.iter_mut() {
            *e += delta;
        }
        co.check_sizes();
    }

    /// Check if this SampleTableBox is valid (has stsd, stts, stsc, stco boxes).
    pub fn is_valid(&self) -> bool {
        let mut valid = true;
        if first_box!(&self.boxes, SampleDescriptionBox).is_none() {
            log::error!("SampleTableBox: no SampleDescriptionBox present");
            valid = false;
        }
        if first_box!(&self.boxes, TimeToSampleBox).is_none() {
            log::error!("SampleTableBox: no TimeToSampleBox present");
            valid = false;
        }
        if first_box!(&self.boxes, SampleToChunkBox).is_none() {
            log::error!("SampleTableBox: no SampleDescriptionBox present");
            valid = false;
        }
        if first_box!(&self.boxes, ChunkOffsetBox).is_none() {
            log::error!("SampleTableBox: no ChunkOffsetBox present");
            valid = false;
        }
        valid
    }
}

