//
// Apple iTunes metadata ("ilst" / "meta" / "udta").
//

use std::io;

use crate::boxes::prelude::*;
use crate::io::DataRef;

def_box! {
    /// Apple Item List.
    AppleItemListBox {
        items: Vec<AppleItem>,
    },
    fourcc => "ilst",
    version => [],
    impls => [ basebox, boxinfo, debug ],
}

impl FromBytes for AppleItemListBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<AppleItemListBox> {
        let mut reader = BoxReader::new(stream)?;
        let stream = &mut reader;

        let mut items = Vec::new();
        while stream.left() >= 8 {
            items.push(AppleItem::from_bytes(stream)?);
        }

        Ok(AppleItemListBox { items })
    }

    fn min_size() -> usize {
        8
    }
}

impl ToBytes for AppleItemListBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        let stream = &mut writer;

        for item in &self.items {
            item.to_bytes(stream)?;
        }

        stream.finalize()
    }
}

/// Generic Apple metadata item (e.g. "\xa9nam", "\xa9day", "covr", ...).
///
/// Not registered with a fixed fourcc since iTunes uses dozens of them;
/// callers match on `fourcc()` / `GenericBox` the way they match on any
/// other unrecognized-but-parseable box.
#[derive(Debug, Default, Clone)]
pub struct AppleItem {
    pub fourcc: FourCC,
    pub boxes:  Vec<MP4Box>,
}

impl FromBytes for AppleItem {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<AppleItem> {
        let mut reader = BoxReader::new(stream)?;
        let fourcc = reader.header.fourcc;
        let stream = &mut reader;

        let mut boxes = Vec::new();
        while stream.left() >= 8 {
            boxes.push(MP4Box::from_bytes(stream)?);
        }

        Ok(AppleItem { fourcc, boxes })
    }

    fn min_size() -> usize {
        8
    }
}

impl ToBytes for AppleItem {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        let stream = &mut writer;

        for b in &self.boxes {
            b.to_bytes(stream)?;
        }

        stream.finalize()
    }
}

impl BoxInfo for AppleItem {
    #[inline]
    fn fourcc(&self) -> FourCC {
        self.fourcc
    }
}

impl FullBox for AppleItem {}

/// Apple item's "data" atom.
#[derive(Debug)]
pub struct IDataBox {
    pub flags: u32,
    pub data:  AppleData,
}

#[derive(Debug)]
pub enum AppleData {
    Text(String),
    Binary(Data),
    Extern(DataRef),
}

impl FromBytes for IDataBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<Self> {
        let mut reader = BoxReader::new(stream)?;
        let stream = &mut reader;

        stream.skip(4)?;
        let flags = stream.flags();
        let size = stream.left();

        // If it's too big, don't read it into memory.
        if size > 32768 {
            let data = DataRef::from_bytes_limit(stream, size)?;
            return Ok(IDataBox {
                flags,
                data: AppleData::Extern(data),
            });
        }

        let rawdata = stream.read(size)?.to_vec();
        let data = if flags == 1 {
            match String::from_utf8(rawdata) {
                Ok(text) => AppleData::Text(text),
                Err(e) => AppleData::Binary(Data(e.into_bytes())),
            }
        } else {
            AppleData::Binary(Data(rawdata))
        };

        Ok(IDataBox { flags, data })
    }

    fn min_size() -> usize {
        16
    }
}

impl ToBytes for IDataBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        let mut writer = BoxWriter::new(stream, self)?;
        let stream = &mut writer;

        0u32.to_bytes(stream)?;
        match &self.data {
            &AppleData::Text(ref s) => stream.write(s.as_bytes())?,
            &AppleData::Binary(ref b) => b.to_bytes(stream)?,
            &AppleData::Extern(ref e) => e.to_bytes(stream)?,
        }

        stream.finalize()
    }
}

impl BoxInfo for IDataBox {
    const FOURCC: &'static str = "data";

    #[inline]
    fn max_version() -> Option<u8> {
        Some(0)
    }
}

impl FullBox for IDataBox {
    fn version(&self) -> Option<u8> {
        Some(0)
    }
    fn flags(&self) -> u32 {
        self.flags
    }
}
