//
// Nero "chpl" Chapter List Box (not in ISO/IEC 14496-12; a de-facto
// extension supported by Nero, L-SMASH and most other muxers that emit
// chapter tracks via `udta`).
//

use std::io;

use crate::boxes::prelude::*;

/// Chapter List Box (`chpl`).
///
/// Each entry names a chapter start time (in 100ns units, matching
/// QuickTime/Nero's convention) and a UTF-8 title, optionally BOM-prefixed.
#[derive(Clone, Debug, Default)]
pub struct ChapterListBox {
    pub entries: Vec<ChapterListEntry>,
}

impl FromBytes for ChapterListBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<ChapterListBox> {
        let mut reader = BoxReader::new(stream)?;
        let stream = &mut reader;

        // one reserved byte, matching Nero's original layout.
        stream.skip(1)?;
        let count = u8::from_bytes(stream)?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            entries.push(ChapterListEntry::from_bytes(stream)?);
        }
        Ok(ChapterListBox { entries })
    }

    fn min_size() -> usize { 2 }
}

impl ToBytes for ChapterListBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        let stream = &mut writer;

        0u8.to_bytes(stream)?;
        (self.entries.len() as u8).to_bytes(stream)?;
        for e in &self.entries {
            e.to_bytes(stream)?;
        }
        stream.finalize()
    }
}

impl BoxInfo for ChapterListBox {
    const FOURCC: &'static str = "chpl";
}

impl FullBox for ChapterListBox {
    fn version(&self) -> Option<u8> { Some(1) }
}

/// One chapter: a start time in 100ns units and a title.
#[derive(Clone, Debug)]
pub struct ChapterListEntry {
    pub start_time: u64,
    pub title:      String,
}

impl FromBytes for ChapterListEntry {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<ChapterListEntry> {
        let start_time = u64::from_bytes(stream)?;
        let len = u8::from_bytes(stream)? as usize;
        let data = crate::types::Data::read(stream, len)?;
        let title = String::from_utf8(data.0)
            .map_err(|_| ioerr!(InvalidData, "chpl entry title is not valid UTF-8"))?;
        Ok(ChapterListEntry { start_time, title })
    }

    fn min_size() -> usize { 9 }
}

impl ToBytes for ChapterListEntry {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        self.start_time.to_bytes(stream)?;
        let bytes = self.title.as_bytes();
        if bytes.len() > u8::MAX as usize {
            return Err(ioerr!(InvalidData, "chpl chapter title longer than 255 bytes"));
        }
        (bytes.len() as u8).to_bytes(stream)?;
        stream.write(bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemBuffer;

    #[test]
    fn roundtrips_entries() {
        let chpl = ChapterListBox {
            entries: vec![
                ChapterListEntry { start_time: 0, title: "Intro".into() },
                ChapterListEntry { start_time: 5_000_0000, title: "Chapter 2".into() },
            ],
        };
        let mut buf = MemBuffer::new();
        chpl.to_bytes(&mut buf).unwrap();
        let bytes = buf.into_vec();
        let mut slice: &[u8] = &bytes;
        let parsed = ChapterListBox::from_bytes(&mut slice).unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[1].title, "Chapter 2");
    }
}
