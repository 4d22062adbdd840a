//
// ISO/IEC 14496-12:2015(E)
// 8.7.3.3 Compact Sample Size Box
//

use std::io;

use crate::boxes::prelude::*;

/// 8.7.3.3 Compact Sample Size Box (ISO/IEC 14496-12:2015(E))
#[derive(Clone, Debug)]
pub struct CompactSampleSizeBox {
    pub field_size:     u8,
    pub sample_entries: Vec<u16>,
}

impl FromBytes for CompactSampleSizeBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<CompactSampleSizeBox> {
        let mut reader = BoxReader::new(stream)?;
        let stream = &mut reader;

        stream.skip(3)?;
        let field_size = u8::from_bytes(stream)?;
        let sample_count = u32::from_bytes(stream)?;

        let mut sample_entries = Vec::new();
        while sample_entries.len() < sample_count as usize {
            match field_size {
                4 => {
                    let b = u8::from_bytes(stream)?;
                    sample_entries.push(((b & 0xf0) >> 4) as u16);
                    if sample_entries.len() < sample_count as usize {
                        sample_entries.push((b & 0x0f) as u16);
                    }
                },
                8 => sample_entries.push(u8::from_bytes(stream)? as u16),
                16 => sample_entries.push(u16::from_bytes(stream)?),
                _ => {
                    return Err(ioerr!(InvalidData, "CompactSampleSizeBox: invalid field_size {}", field_size));
                },
            }
        }

        Ok(CompactSampleSizeBox {
            field_size,
            sample_entries,
        })
    }

    fn min_size() -> usize {
        16
    }
}

impl ToBytes for CompactSampleSizeBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        let stream = &mut writer;

        stream.skip(3)?;
        (self.field_size as u8).to_bytes(stream)?;
        (self.sample_entries.len() as u32).to_bytes(stream)?;

        let mut i = 0;
        while i < self.sample_entries.len() {
            match self.field_size {
                4 => {
                    let mut b: u8 = ((self.sample_entries[i] & 0xf) as u8) << 4;
                    i += 1;
                    if i < self.sample_entries.len() {
                        b |= (self.sample_entries[i] & 0xf) as u8;
                        i += 1;
                    }
                    b.to_bytes(stream)?;
                },
                8 => {
                    (self.sample_entries[i] as u8).to_bytes(stream)?;
                    i += 1;
                },
                16 => {
                    self.sample_entries[i].to_bytes(stream)?;
                    i += 1;
                },
                _ => break,
            }
        }

        stream.finalize()
    }
}

impl BoxInfo for CompactSampleSizeBox {
    const FOURCC: &'static str = "stz2";

    #[inline]
    fn max_version() -> Option<u8> {
        Some(0)
    }
}

impl FullBox for CompactSampleSizeBox {
    fn version(&self) -> Option<u8> {
        Some(0)
    }
}
