//! Box header parsing, the `BoxReader`/`BoxWriter` cursors, and the root `MP4` type.
use std::convert::TryInto;
use std::fmt::Debug;
use std::io;
use std::path::Path;

use crate::boxes::MP4Box;
use crate::io::Mp4File;
use crate::serialize::{BoxBytes, FromBytes, ReadBytes, ToBytes, WriteBytes};
use crate::types::FourCC;

/// Implemented by every parsed box type.
///
/// `FOURCC` / `fourcc()` name the box on disk. Almost every box has one
/// fixed fourcc; `ChunkOffsetBox` is the one exception (it is "stco" or
/// "co64" depending on the data) and overrides `fourcc()`.
pub trait BoxInfo {
    const FOURCC: &'static str = "";

    fn fourcc(&self) -> FourCC {
        FourCC::new(Self::FOURCC)
    }

    /// Highest full-box version this type understands. `None` for boxes
    /// that are not full boxes (no version/flags header).
    fn max_version() -> Option<u8>
    where
        Self: Sized,
    {
        None
    }
}

/// Implemented by every box. Plain ("base") boxes use the defaults.
pub trait FullBox {
    fn version(&self) -> Option<u8> {
        None
    }
    fn flags(&self) -> u32 {
        0
    }
}

//
// BoxReader / BoxWriter.
//

/// The parsed base header of a box: size, fourcc, and (if this fourcc is
/// registered as a full box) version.
#[derive(Clone, Copy, Debug)]
pub struct BoxHeader {
    pub fourcc: FourCC,
    pub size: u64,
    pub version: Option<u8>,
    pub max_version: Option<u8>,
}

impl BoxHeader {
    /// Look at the next box's header without consuming it, so the
    /// `MP4Box` enum can decide which concrete type to parse with.
    pub fn peek<R: ReadBytes>(stream: &mut R) -> io::Result<BoxHeader> {
        let buf = stream.peek(8)?;
        if buf.len() < 8 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        let size1 = u32::from_be_bytes(buf[0..4].try_into().unwrap());
        let fourcc = FourCC::from(&buf[4..8]);

        let (size, hdrlen) = match size1 {
            // Real size is "whatever is left"; unknown until we know our
            // position, which BoxReader will work out - not needed here.
            0 => (0u64, 8u64),
            1 => {
                let buf = stream.peek(16)?;
                if buf.len() < 16 {
                    return Err(io::ErrorKind::UnexpectedEof.into());
                }
                (u64::from_be_bytes(buf[8..16].try_into().unwrap()), 16)
            }
            x => (x as u64, 8),
        };

        let max_version = crate::boxes::MP4Box::max_version_from_fourcc(fourcc);
        let version = if max_version.is_some() {
            let buf = stream.peek(hdrlen + 1)?;
            if (buf.len() as u64) < hdrlen + 1 {
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
            Some(buf[hdrlen as usize])
        } else {
            None
        };

        Ok(BoxHeader { fourcc, size, version, max_version })
    }
}

/// Reads one box header, then hands back a reader limited to the box body.
///
/// Whether the four version/flags bytes are consumed is decided by looking
/// up the fourcc in the box registry (`MP4Box::max_version_from_fourcc`),
/// not by the caller -- so `BoxReader::new` needs no type parameter and
/// works the same whether it's called from a generic `def_box!`-generated
/// `from_bytes` or from a hand-written one (stsz, stco, ...).
pub struct BoxReader<'a> {
    pub header: BoxHeader,
    flags: u32,
    maxsize: u64,
    inner: Box<dyn ReadBytes + 'a>,
}

impl<'a> BoxReader<'a> {
    pub fn new<R: ReadBytes + 'a>(stream: &'a mut R) -> io::Result<BoxReader<'a>> {
        let start = stream.pos();
        let size1 = u32::from_bytes(stream)?;
        let fourcc = FourCC::from_bytes(stream)?;
        let (size, hdrlen) = match size1 {
            0 => (stream.size().saturating_sub(start), 8),
            1 => (u64::from_bytes(stream)?, 16),
            x => (x as u64, 8),
        };

        let max_version = crate::boxes::MP4Box::max_version_from_fourcc(fourcc);
        let (version, flags) = if max_version.is_some() {
            let v = u8::from_bytes(stream)?;
            let f = stream.read(3)?;
            let flags = u32::from_be_bytes([0, f[0], f[1], f[2]]);
            (Some(v), flags)
        } else {
            (None, 0)
        };

        let maxsize = start + size.max(hdrlen as u64);

        Ok(BoxReader {
            header: BoxHeader { fourcc, size, version, max_version },
            flags,
            maxsize,
            inner: Box::new(stream),
        })
    }
}

impl<'a> Drop for BoxReader<'a> {
    fn drop(&mut self) {
        let left = self.left();
        if left > 0 {
            let _ = self.inner.skip(left);
        }
    }
}

impl<'a> ReadBytes for BoxReader<'a> {
    fn read(&mut self, amount: u64) -> io::Result<&[u8]> {
        let amount = if amount == 0 { self.left() } else { amount };
        if self.inner.pos() + amount > self.maxsize {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        self.inner.read(amount)
    }
    fn peek(&mut self, amount: u64) -> io::Result<&[u8]> {
        self.inner.peek(amount)
    }
    fn skip(&mut self, amount: u64) -> io::Result<()> {
        if self.inner.pos() + amount > self.maxsize {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        self.inner.skip(amount)
    }
    fn left(&mut self) -> u64 {
        let pos = self.inner.pos();
        if pos > self.maxsize {
            0
        } else {
            self.maxsize - pos
        }
    }
}

impl<'a> BoxBytes for BoxReader<'a> {
    fn pos(&mut self) -> u64 {
        self.inner.pos()
    }
    fn seek(&mut self, pos: u64) -> io::Result<()> {
        self.inner.seek(pos)
    }
    fn size(&self) -> u64 {
        self.maxsize
    }
    fn version(&self) -> u8 {
        self.header.version.unwrap_or(0)
    }
    fn flags(&self) -> u32 {
        self.flags
    }
    fn fourcc(&self) -> FourCC {
        self.header.fourcc
    }
    fn data_ref(&self, size: u64) -> io::Result<crate::io::DataRef> {
        self.inner.data_ref(size)
    }
    fn input_filename(&self) -> Option<&str> {
        self.inner.input_filename()
    }
}

/// Writes a provisional box header; `finalize` (called automatically on
/// drop) seeks back and patches in the real size.
pub struct BoxWriter<W: WriteBytes> {
    fourcc: FourCC,
    version: Option<u8>,
    flags: u32,
    offset: u64,
    inner: W,
    finalized: bool,
}

impl<W> BoxWriter<W>
where
    W: WriteBytes,
{
    pub fn new<C: BoxInfo + FullBox>(mut stream: W, content: &C) -> io::Result<BoxWriter<W>> {
        let offset = stream.pos();
        let fourcc = content.fourcc();
        let version = FullBox::version(content);
        let flags = FullBox::flags(content);

        0u32.to_bytes(&mut stream)?;
        fourcc.to_bytes(&mut stream)?;
        if let Some(v) = version {
            v.to_bytes(&mut stream)?;
            let f = flags.to_be_bytes();
            stream.write(&f[1..])?;
        }

        Ok(BoxWriter { fourcc, version, flags, offset, inner: stream, finalized: false })
    }

    /// Seek back to the header and write the real size. Called
    /// automatically on drop; calling it explicitly surfaces I/O errors.
    pub fn finalize(&mut self) -> io::Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;
        let pos = self.inner.pos();
        self.inner.seek(self.offset)?;
        let sz = pos - self.offset;
        (sz as u32).to_bytes(&mut self.inner)?;
        self.inner.seek(pos)?;
        Ok(())
    }
}

impl<W> Drop for BoxWriter<W>
where
    W: WriteBytes,
{
    fn drop(&mut self) {
        let _ = self.finalize();
    }
}

impl<W> WriteBytes for BoxWriter<W>
where
    W: WriteBytes,
{
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.inner.write(data)
    }
    fn skip(&mut self, amount: u64) -> io::Result<()> {
        self.inner.skip(amount)
    }
}

impl<W> BoxBytes for BoxWriter<W>
where
    W: WriteBytes,
{
    fn pos(&mut self) -> u64 {
        self.inner.pos()
    }
    fn seek(&mut self, pos: u64) -> io::Result<()> {
        self.inner.seek(pos)
    }
    fn size(&self) -> u64 {
        self.inner.size()
    }
    fn version(&self) -> u8 {
        self.version.unwrap_or(0)
    }
    fn flags(&self) -> u32 {
        self.flags
    }
    fn fourcc(&self) -> FourCC {
        self.fourcc
    }
    fn data_ref(&self, size: u64) -> io::Result<crate::io::DataRef> {
        self.inner.data_ref(size)
    }
    fn input_filename(&self) -> Option<&str> {
        self.inner.input_filename()
    }
}

/// Read a top-level sequence of boxes (the contents of a file, or of any
/// plain container box) from a stream.
pub fn read_boxes<R: ReadBytes>(mut stream: R) -> io::Result<Vec<MP4Box>> {
    let mut boxes = Vec::new();
    while stream.left() >= 8 {
        boxes.push(MP4Box::from_bytes(&mut stream)?);
    }
    Ok(boxes)
}

//
// GenericBox: fallback for unrecognized or unsupported-version boxes.
//

/// Any box we don't have a registered parser for (or whose version we
/// don't support) is kept around as an opaque blob, so that round-tripping
/// an unmodified file never silently drops data.
#[derive(Clone)]
pub struct GenericBox {
    fourcc: FourCC,
    data: Vec<u8>,
}

impl FromBytes for GenericBox {
    fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<GenericBox> {
        let mut reader = BoxReader::new(stream)?;
        let fourcc = reader.header.fourcc;
        let size = reader.left();
        let data = reader.read(size)?.to_vec();
        Ok(GenericBox { fourcc, data })
    }
    fn min_size() -> usize {
        8
    }
}

impl ToBytes for GenericBox {
    fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
        let size = (self.data.len() + 8) as u32;
        size.to_bytes(stream)?;
        self.fourcc.to_bytes(stream)?;
        stream.write(&self.data)
    }
}

impl BoxInfo for GenericBox {
    fn fourcc(&self) -> FourCC {
        self.fourcc
    }
}

impl FullBox for GenericBox {}

impl Debug for GenericBox {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("GenericBox")
            .field("fourcc", &self.fourcc)
            .field("size", &self.data.len())
            .finish()
    }
}

//
// The root MP4 file.
//

/// The in-memory representation of one ISOBMFF file: the top-level boxes
/// in on-disk order, plus the name of the file they were read from (if
/// any), used when a box needs to stream its payload lazily (see
/// `crate::io::DataRef`).
pub struct MP4 {
    pub boxes: Vec<MP4Box>,
    pub(crate) input_file: Option<String>,
}

impl MP4 {
    /// An empty, writable root -- used when muxing from scratch.
    pub fn new() -> MP4 {
        MP4 { boxes: Vec::new(), input_file: None }
    }

    /// Read and parse a whole file.
    pub fn read<P: AsRef<Path>>(path: P) -> io::Result<MP4> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        let mut file = Mp4File::open(&path_str, false)?;
        let boxes = read_boxes(&mut file)?;
        Ok(MP4 { boxes, input_file: Some(path_str) })
    }

    /// Serialize the whole file.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        for b in &self.boxes {
            b.to_bytes(&mut file)?;
        }
        Ok(())
    }

    /// The (single, currently mandatory) `MovieBox`.
    pub fn movie(&self) -> &crate::boxes::MovieBox {
        crate::first_box!(&self.boxes, MovieBox).expect("MP4 file has no MovieBox")
    }

    /// Mutable access to the `MovieBox`.
    pub fn movie_mut(&mut self) -> &mut crate::boxes::MovieBox {
        crate::first_box_mut!(&mut self.boxes, MovieBox).expect("MP4 file has no MovieBox")
    }

    /// Whether this root has a movie yet.
    pub fn has_movie(&self) -> bool {
        crate::first_box!(&self.boxes, MovieBox).is_some()
    }
}

impl Default for MP4 {
    fn default() -> MP4 {
        MP4::new()
    }
}

impl Debug for MP4 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("MP4")
            .field("input_file", &self.input_file)
            .field("boxes", &self.boxes)
            .finish()
    }
}
