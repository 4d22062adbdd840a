use std::fmt::Debug;
use std::io;

use crate::boxes::prelude::*;
use crate::io::DataRef;

/// 8.1.1 Media Data Box (ISO/IEC 14496-12:2015(E))
///
/// Never goes through `BoxReader`/`BoxWriter` -- its payload is read and
/// written directly via `DataRef`, and (unlike every other box) it may need
/// a 64-bit "large size" header to describe payloads over 4GB.
#[derive(Debug, Default)]
pub struct MediaDataBox {
    pub data: DataRef,
}

impl FromBytes for MediaDataBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<MediaDataBox> {
        let mut reader = BoxReader::new(stream)?;
        let size = reader.left();
        let data = DataRef::from_bytes_limit(&mut reader, size)?;
        Ok(MediaDataBox { data })
    }
    fn min_size() -> usize {
        8
    }
}

impl ToBytes for MediaDataBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        let fourcc = FourCC::new("mdat");
        let data_size = self.data.len();
        if self.data.is_large() {
            1u32.to_bytes(stream)?;
            fourcc.to_bytes(stream)?;
            (data_size + 16).to_bytes(stream)?;
        } else {
            ((data_size + 8) as u32).to_bytes(stream)?;
            fourcc.to_bytes(stream)?;
        }
        self.data.to_bytes(stream)
    }
}

impl BoxInfo for MediaDataBox {
    const FOURCC: &'static str = "mdat";
}

impl FullBox for MediaDataBox {}
