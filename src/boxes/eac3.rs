//
// ETSI TS 102 366 Annex F -- E-AC-3 in ISOBMFF.
//

use std::io;

use crate::boxes::prelude::*;
use crate::bitreader::{BitReader, BitWriter};
use crate::track::AudioTrackInfo;

def_box! {
    /// Enhanced AC-3 (E-AC-3) sample entry.
    Eac3SampleEntry {
        skip:                   6,
        data_reference_index:   u16,
        skip:                   8,
        channel_count: u16,
        sample_size: u16,
        skip:                   4,
        sample_rate_hi:         u16,
        sample_rate_lo:         u16,
        // sub boxes, probably only dec3.
        boxes: Vec<MP4Box>,
    },
    fourcc => "ec-3",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

impl Default for Eac3SampleEntry {
    fn default() -> Eac3SampleEntry {
        Eac3SampleEntry {
            data_reference_index:   1,
            channel_count:          2,
            sample_size:            16,
            sample_rate_hi:         0,
            sample_rate_lo:         0,
            boxes:                  Vec::new(),
        }
    }
}

impl Eac3SampleEntry {
    pub fn track_info(&self) -> AudioTrackInfo {
        let mut ai = AudioTrackInfo {
            codec_id:   "ec-3".to_string(),
            codec_name: Some("Enhanced AC-3 Dolby Digital Plus".to_string()),
            channel_count:  self.channel_count,
            bit_depth: if self.sample_size > 0 { Some(self.sample_size) } else { None },
            sample_rate: if self.sample_rate_hi > 0 { Some(self.sample_rate_hi as u32) } else { None },
            ..AudioTrackInfo::default()
        };
        if let Some(dec3) = first_box!(&self.boxes, EC3SpecificBox) {
            if let Some(first) = dec3.independent_substreams.first() {
                ai.channel_configuration = Some(first.channel_configuration().to_string());
                ai.lfe_channel = first.lfeon;
            }
            if dec3.data_rate > 0 {
                ai.avg_bitrate = Some(dec3.data_rate as u32 * 1000);
                ai.max_bitrate = Some(dec3.data_rate as u32 * 1000);
            }
        }
        ai
    }
}

/// One independent substream entry of the `dec3` box.
#[derive(Debug, Clone, Default)]
pub struct Eac3SubstreamInfo {
    pub fscod:       u8,
    pub bsid:        u8,
    pub asvc:        bool,
    pub bsmod:       u8,
    pub acmod:       u8,
    pub lfeon:       bool,
    /// Channel locations of the dependent substreams bound to this one, if
    /// `num_dep_sub > 0` (9-bit `chan_loc` bitmask).
    pub dependent_substream_chan_locs: Option<u16>,
}

impl Eac3SubstreamInfo {
    /// Same channel-configuration labels as AC-3's `acmod`.
    pub fn channel_configuration(&self) -> &'static str {
        match self.acmod {
            0 => "1+2",
            1 => "C",
            2 => "L,R",
            3 => "L,C,R",
            4 => "L,R,S",
            5 => "L,C,R,S",
            6 => "L,R,SL,SR",
            7 => "L,C,R,SL,SR",
            _ => "unknown",
        }
    }
}

/// `dec3`: E-AC-3 Specific Box.
#[derive(Debug, Clone, Default)]
pub struct EC3SpecificBox {
    /// Data rate in kbit/s. 0 means "unknown / not CBR".
    pub data_rate: u16,
    pub independent_substreams: Vec<Eac3SubstreamInfo>,
}

impl FromBytes for EC3SpecificBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<EC3SpecificBox> {
        let mut reader = BoxReader::new(stream)?;
        let size = reader.left() as usize;
        let data = Data::read(&mut reader, size)?;
        let mut b = BitReader::new(&data.0);

        let data_rate = b.read_bits(13)? as u16;
        let num_ind_sub = b.read_bits(3)? as u8 + 1;
        let mut independent_substreams = Vec::with_capacity(num_ind_sub as usize);
        for _ in 0..num_ind_sub {
            let fscod = b.read_bits(2)? as u8;
            let bsid = b.read_bits(5)? as u8;
            let _reserved = b.read_bits(1)?;
            let asvc = b.read_bits(1)? != 0;
            let bsmod = b.read_bits(3)? as u8;
            let acmod = b.read_bits(3)? as u8;
            let lfeon = b.read_bits(1)? != 0;
            let _reserved = b.read_bits(3)?;
            let num_dep_sub = b.read_bits(4)? as u8;
            let dependent_substream_chan_locs = if num_dep_sub > 0 {
                Some(b.read_bits(9)? as u16)
            } else {
                let _reserved = b.read_bits(1)?;
                None
            };
            independent_substreams.push(Eac3SubstreamInfo {
                fscod, bsid, asvc, bsmod, acmod, lfeon, dependent_substream_chan_locs,
            });
        }

        Ok(EC3SpecificBox { data_rate, independent_substreams })
    }

    fn min_size() -> usize {
        11
    }
}

impl ToBytes for EC3SpecificBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;

        let mut w = BitWriter::new();
        w.write_bits(self.data_rate as u32, 13);
        let num_ind_sub = self.independent_substreams.len().max(1) as u32 - 1;
        w.write_bits(num_ind_sub, 3);
        for sub in &self.independent_substreams {
            w.write_bits(sub.fscod as u32, 2);
            w.write_bits(sub.bsid as u32, 5);
            w.write_bits(0, 1);
            w.write_bit(sub.asvc);
            w.write_bits(sub.bsmod as u32, 3);
            w.write_bits(sub.acmod as u32, 3);
            w.write_bit(sub.lfeon);
            w.write_bits(0, 3);
            match sub.dependent_substream_chan_locs {
                Some(locs) => {
                    w.write_bits(1, 4);
                    w.write_bits(locs as u32, 9);
                }
                None => {
                    w.write_bits(0, 4);
                    w.write_bit(false);
                }
            }
        }
        stream.write(&w.into_bytes())?;

        writer.finalize()
    }
}

impl BoxInfo for EC3SpecificBox {
    const FOURCC: &'static str = "dec3";
}

impl FullBox for EC3SpecificBox {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_substream_roundtrips() {
        let b = EC3SpecificBox {
            data_rate: 640,
            independent_substreams: vec![Eac3SubstreamInfo {
                fscod: 0, bsid: 16, asvc: false, bsmod: 0, acmod: 7,
                lfeon: true, dependent_substream_chan_locs: None,
            }],
        };

        let mut buf = crate::io::MemBuffer::new();
        b.to_bytes(&mut buf).unwrap();
        let bytes = buf.into_vec();

        let mut slice: &[u8] = &bytes;
        let parsed = EC3SpecificBox::from_bytes(&mut slice).unwrap();
        assert_eq!(parsed.data_rate, 640);
        assert_eq!(parsed.independent_substreams.len(), 1);
        assert_eq!(parsed.independent_substreams[0].acmod, 7);
        assert!(parsed.independent_substreams[0].lfeon);
    }
}
