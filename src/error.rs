//! Public-API error type.
//!
//! Internal code (`io`, `serialize`, `mp4box`, `boxes`, `codec`, `timeline`,
//! `mux`, `finalize`) keeps returning `io::Result<T>`, exactly as the
//! teacher's code does. `api.rs` is the only place that converts to
//! `MuxError`, so that callers of the public surface can match on a cause
//! without parsing message strings.

use std::fmt;
use std::io;

/// Failure kinds surfaced by the public API.
#[derive(Debug)]
pub enum MuxError {
    /// A caller-supplied parameter was out of range or otherwise invalid.
    FunctionParam(String),
    /// Allocation failed, or an internal table grew past a sane bound.
    MemoryAlloc(String),
    /// The input was truncated -- fewer bytes than a box/record declared.
    Truncated(String),
    /// The input was present but did not parse as valid ISOBMFF/codec data.
    InvalidData(String),
    /// The operation is recognized but not implemented for this input.
    Unsupported(String),
    /// A corner case was detected that the implementation does not (yet)
    /// handle gracefully; contributions welcome.
    PatchWelcome(String),
    /// Any other I/O failure (reading/writing the underlying file).
    Io(io::Error),
    /// A progress callback returned `true`, requesting cancellation.
    Aborted,
}

impl fmt::Display for MuxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MuxError::FunctionParam(s) => write!(f, "invalid parameter: {}", s),
            MuxError::MemoryAlloc(s) => write!(f, "allocation failed: {}", s),
            MuxError::Truncated(s) => write!(f, "truncated input: {}", s),
            MuxError::InvalidData(s) => write!(f, "invalid data: {}", s),
            MuxError::Unsupported(s) => write!(f, "unsupported: {}", s),
            MuxError::PatchWelcome(s) => write!(f, "unhandled case (patch welcome): {}", s),
            MuxError::Io(e) => write!(f, "i/o error: {}", e),
            MuxError::Aborted => write!(f, "aborted by progress callback"),
        }
    }
}

impl std::error::Error for MuxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MuxError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MuxError {
    fn from(e: io::Error) -> MuxError {
        match e.kind() {
            io::ErrorKind::InvalidData => MuxError::InvalidData(e.to_string()),
            io::ErrorKind::UnexpectedEof => MuxError::Truncated(e.to_string()),
            _ => MuxError::Io(e),
        }
    }
}

pub type MuxResult<T> = Result<T, MuxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_data_maps_to_invalid_data() {
        let e: MuxError = io::Error::new(io::ErrorKind::InvalidData, "bad").into();
        assert!(matches!(e, MuxError::InvalidData(_)));
    }

    #[test]
    fn eof_maps_to_truncated() {
        let e: MuxError = io::Error::new(io::ErrorKind::UnexpectedEof, "short").into();
        assert!(matches!(e, MuxError::Truncated(_)));
    }

    #[test]
    fn other_maps_to_io() {
        let e: MuxError = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert!(matches!(e, MuxError::Io(_)));
    }
}
