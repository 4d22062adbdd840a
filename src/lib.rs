#[macro_use]
extern crate log;

#[macro_use]
mod ioerr;
#[macro_use]
mod macros;
#[macro_use]
pub mod serialize;
mod bitreader;
pub mod io;
pub mod mp4box;
pub mod boxes;
pub mod track;
pub mod types;

pub mod error;
pub mod codec;
pub mod sample_info;
pub mod timeline;
pub mod chapters;
pub mod timecode;
pub mod mux;
pub mod finalize;
pub mod api;

pub mod fragment;
pub mod rewrite;
pub mod subtitle;
pub mod debug;
