pub(crate) use crate::boxes::MP4Box;
pub(crate) use crate::mp4box::{BoxInfo, BoxReader, BoxWriter, FullBox};
pub(crate) use crate::serialize::{BoxBytes, FromBytes, ReadBytes, ToBytes, WriteBytes};
pub(crate) use crate::types::*;
