use std::io;

use crate::boxes::prelude::*;

macro_rules! free_box {
    ($name:ident, $fourcc:expr) => {
        #[derive(Clone, Default)]
        pub struct $name(pub u64);

        impl FromBytes for $name {
            fn from_bytes<R: ReadBytes>(stream: &mut R) -> io::Result<$name> {
                let mut reader = BoxReader::new(stream)?;
                let size = reader.left();
                reader.skip(size)?;
                Ok($name(size))
            }

            fn min_size() -> usize {
                8
            }
        }

        impl ToBytes for $name {
            fn to_bytes<W: WriteBytes>(&self, stream: &mut W) -> io::Result<()> {
                let mut stream = BoxWriter::new(stream, self)?;
                stream.skip(self.0)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl BoxInfo for $name {
            const FOURCC: &'static str = $fourcc;
        }

        impl FullBox for $name {}
    };
}

free_box!(Free, "free");
free_box!(Skip, "skip");
free_box!(Wide, "wide");
