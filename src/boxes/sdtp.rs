//
// ISO/IEC 14496-12:2015(E)
// 8.7.6 Independent and Disposable Samples Box
//

use std::io;

use crate::boxes::prelude::*;

def_box! {
    /// 8.7.6 Independent and Disposable Samples Box (ISO/IEC 14496-12:2015(E))
    ///
    /// One entry per sample, in sample-table order. Mirrors the
    /// leading/depends-on/depended-on/redundancy classification that
    /// `trun`/`tfhd` pack into `SampleFlags`, but stored byte-per-sample
    /// here instead of as fragment defaults.
    #[derive(Default)]
    SampleDependencyTypeBox {
        entries:    Vec<SampleDependsOn>,
    },
    fourcc => "sdtp",
    version => [0],
    impls => [ boxinfo, debug, fullbox ],
}

/// One `sdtp` entry, unpacked from its single byte.
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleDependsOn {
    pub is_leading:             u8,
    pub sample_depends_on:      u8,
    pub sample_is_depended_on:  u8,
    pub sample_has_redundancy:  u8,
}

impl FromBytes for SampleDependsOn {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<Self> {
        let b = u8::from_bytes(stream)?;
        Ok(SampleDependsOn {
            is_leading:            (b & 0b1100_0000) >> 6,
            sample_depends_on:     (b & 0b0011_0000) >> 4,
            sample_is_depended_on: (b & 0b0000_1100) >> 2,
            sample_has_redundancy:  b & 0b0000_0011,
        })
    }

    fn min_size() -> usize {
        1
    }
}

impl ToBytes for SampleDependsOn {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        let b = ((self.is_leading & 0b11) << 6)
            | ((self.sample_depends_on & 0b11) << 4)
            | ((self.sample_is_depended_on & 0b11) << 2)
            | (self.sample_has_redundancy & 0b11);
        b.to_bytes(stream)
    }
}

impl SampleDependsOn {
    /// True if this sample is not used as a reference by any other sample.
    pub fn is_disposable(&self) -> bool {
        self.sample_is_depended_on == 2
    }

    /// True if this sample doesn't depend on other samples (a sync/RAP-ish sample).
    pub fn is_independent(&self) -> bool {
        self.sample_depends_on == 2
    }
}
