//! Library error types.
use std::fmt;

use crate::compress::CompressionError;

/// A mummy `Result`, normally returning a mummy [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A mummy error. Encompasses any issues that can happen while growing a
/// buffer, feeding a value into it, or reading one back out.
#[derive(Clone, Debug)]
pub enum Error {
    /// A buffer couldn't grow to the requested capacity.
    OutOfMemory,
    /// The cursor ran out of bytes before the tag's payload was fully present.
    ShortBuffer,
    /// The tag byte at the cursor isn't valid for the operation that was
    /// requested.
    BadTag {
        /// What the caller was trying to read.
        expected: &'static str,
        /// The tag byte actually found.
        found: u8,
    },
    /// A copying reader's destination was smaller than the value being
    /// copied. The true length is reported so the caller can retry with a
    /// larger destination.
    Truncated {
        /// The number of bytes the value actually occupies.
        needed: usize,
    },
    /// The encoder was given an out-of-range input.
    InvalidArgument(&'static str),
    /// The LZF compression layer failed, either on the way in or the way
    /// out.
    Compression(CompressionError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OutOfMemory => write!(f, "buffer allocation failed"),
            Error::ShortBuffer => write!(f, "not enough bytes remain in the source buffer"),
            Error::BadTag { expected, found } => {
                write!(f, "expected {}, found tag byte 0x{:02x}", expected, found)
            }
            Error::Truncated { needed } => {
                write!(f, "destination too small, value needs {} bytes", needed)
            }
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::Compression(_) => write!(f, "compression codec error"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Compression(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CompressionError> for Error {
    fn from(e: CompressionError) -> Self {
        Error::Compression(e)
    }
}
