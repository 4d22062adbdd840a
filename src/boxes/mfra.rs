//
// ISO/IEC 14496-12:2015(E)
// 8.8.9 - 8.8.11 Movie Fragment Random Access family
//

use std::io;

use crate::boxes::prelude::*;

def_box! {
    /// Movie Fragment Random Access Box (`mfra`). A trailing index of
    /// every fragment's random access points, one `TrackFragmentRandomAccessBox`
    /// per track, terminated by `MovieFragmentRandomAccessOffsetBox`.
    MovieFragmentRandomAccessBox {
        boxes: Vec<MP4Box>,
    },
    fourcc => "mfra",
    version => [],
    impls => [ basebox, boxinfo, debug, fromtobytes ],
}

/// Track Fragment Random Access Box (`tfra`).
#[derive(Clone, Debug)]
pub struct TrackFragmentRandomAccessBox {
    pub track_id:                  u32,
    pub length_size_of_traf_num:   u8,
    pub length_size_of_trun_num:   u8,
    pub length_size_of_sample_num: u8,
    pub entries:                   Vec<TrackFragmentRandomAccessEntry>,
}

/// One random access point named by a `tfra` entry.
#[derive(Clone, Copy, Debug)]
pub struct TrackFragmentRandomAccessEntry {
    pub time:         u64,
    pub moof_offset:  u64,
    pub traf_number:  u32,
    pub trun_number:  u32,
    pub sample_number: u32,
}

fn read_sized<R: ReadBytes>(stream: &mut R, size_minus_one: u8) -> io::Result<u32> {
    Ok(match size_minus_one {
        0 => u8::from_bytes(stream)? as u32,
        1 => u16::from_bytes(stream)? as u32,
        2 => {
            let hi = u8::from_bytes(stream)? as u32;
            let lo = u16::from_bytes(stream)? as u32;
            (hi << 16) | lo
        },
        3 => u32::from_bytes(stream)?,
        _ => unreachable!(),
    })
}

fn write_sized<W: WriteBytes>(stream: &mut W, size_minus_one: u8, value: u32) -> io::Result<()> {
    match size_minus_one {
        0 => (value as u8).to_bytes(stream),
        1 => (value as u16).to_bytes(stream),
        2 => {
            ((value >> 16) as u8).to_bytes(stream)?;
            ((value & 0xffff) as u16).to_bytes(stream)
        },
        3 => value.to_bytes(stream),
        _ => unreachable!(),
    }
}

impl FromBytes for TrackFragmentRandomAccessBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<TrackFragmentRandomAccessBox> {
        let mut reader = BoxReader::new(stream)?;
        let stream = &mut reader;

        let version = stream.version();
        let track_id = u32::from_bytes(stream)?;
        let sizes = u32::from_bytes(stream)?;
        let length_size_of_traf_num = ((sizes >> 4) & 0x3) as u8;
        let length_size_of_trun_num = ((sizes >> 2) & 0x3) as u8;
        let length_size_of_sample_num = (sizes & 0x3) as u8;

        let number_of_entries = u32::from_bytes(stream)? as usize;
        let mut entries = Vec::with_capacity(number_of_entries);
        for _ in 0..number_of_entries {
            let (time, moof_offset) = if version == 1 {
                (u64::from_bytes(stream)?, u64::from_bytes(stream)?)
            } else {
                (u32::from_bytes(stream)? as u64, u32::from_bytes(stream)? as u64)
            };
            let traf_number = read_sized(stream, length_size_of_traf_num)?;
            let trun_number = read_sized(stream, length_size_of_trun_num)?;
            let sample_number = read_sized(stream, length_size_of_sample_num)?;
            entries.push(TrackFragmentRandomAccessEntry {
                time,
                moof_offset,
                traf_number,
                trun_number,
                sample_number,
            });
        }

        Ok(TrackFragmentRandomAccessBox {
            track_id,
            length_size_of_traf_num,
            length_size_of_trun_num,
            length_size_of_sample_num,
            entries,
        })
    }

    fn min_size() -> usize { 16 }
}

impl ToBytes for TrackFragmentRandomAccessBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        let stream = &mut writer;

        let version = stream.version();

        self.track_id.to_bytes(stream)?;
        let sizes = ((self.length_size_of_traf_num as u32 & 0x3) << 4)
            | ((self.length_size_of_trun_num as u32 & 0x3) << 2)
            | (self.length_size_of_sample_num as u32 & 0x3);
        sizes.to_bytes(stream)?;

        (self.entries.len() as u32).to_bytes(stream)?;
        for e in &self.entries {
            if version == 1 {
                e.time.to_bytes(stream)?;
                e.moof_offset.to_bytes(stream)?;
            } else {
                (e.time as u32).to_bytes(stream)?;
                (e.moof_offset as u32).to_bytes(stream)?;
            }
            write_sized(stream, self.length_size_of_traf_num, e.traf_number)?;
            write_sized(stream, self.length_size_of_trun_num, e.trun_number)?;
            write_sized(stream, self.length_size_of_sample_num, e.sample_number)?;
        }

        stream.finalize()
    }
}

impl BoxInfo for TrackFragmentRandomAccessBox {
    const FOURCC: &'static str = "tfra";

    #[inline]
    fn max_version() -> Option<u8> {
        Some(1)
    }
}

impl FullBox for TrackFragmentRandomAccessBox {
    fn version(&self) -> Option<u8> {
        if self.entries.iter().any(|e| e.time > u32::MAX as u64 || e.moof_offset > u32::MAX as u64) {
            Some(1)
        } else {
            Some(0)
        }
    }
}

def_box! {
    /// Movie Fragment Random Access Offset Box (`mfro`). Names the total
    /// size of the enclosing `mfra` box so a reader seeking from EOF can
    /// jump straight to its start.
    MovieFragmentRandomAccessOffsetBox {
        size: u32,
    },
    fourcc => "mfro",
    version => [0],
    impls => [ boxinfo, debug, fromtobytes, fullbox ],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemBuffer;

    #[test]
    fn tfra_roundtrips_version0() {
        let tfra = TrackFragmentRandomAccessBox {
            track_id: 1,
            length_size_of_traf_num: 0,
            length_size_of_trun_num: 0,
            length_size_of_sample_num: 1,
            entries: vec![
                TrackFragmentRandomAccessEntry { time: 0, moof_offset: 100, traf_number: 1, trun_number: 1, sample_number: 1 },
                TrackFragmentRandomAccessEntry { time: 1000, moof_offset: 5000, traf_number: 1, trun_number: 1, sample_number: 42 },
            ],
        };
        let mut buf = MemBuffer::new();
        tfra.to_bytes(&mut buf).unwrap();
        let bytes = buf.into_vec();
        let mut slice: &[u8] = &bytes;
        let parsed = TrackFragmentRandomAccessBox::from_bytes(&mut slice).unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[1].moof_offset, 5000);
        assert_eq!(parsed.entries[1].sample_number, 42);
    }

    #[test]
    fn tfra_upgrades_to_version1_for_large_offsets() {
        let tfra = TrackFragmentRandomAccessBox {
            track_id: 1,
            length_size_of_traf_num: 0,
            length_size_of_trun_num: 0,
            length_size_of_sample_num: 0,
            entries: vec![
                TrackFragmentRandomAccessEntry { time: 0, moof_offset: 1 << 40, traf_number: 1, trun_number: 1, sample_number: 1 },
            ],
        };
        assert_eq!(tfra.version(), Some(1));
    }
}
