//! A compact, self-describing binary serialization codec.
//!
//! Every encoded value starts with a single tag byte identifying its type,
//! followed by whatever length prefix and payload that type calls for.
//! There is no schema: a decoder can walk a buffer by reading tags alone.
//!
//! The encoder lives on [`EncodeBuffer`] as a family of `feed_*`/`open_*`
//! methods; the decoder lives as free functions over a borrowed [`Cursor`].
//! An optional whole-payload LZF envelope (see [`EncodeBuffer::compress`]
//! and [`decompress`]) can shrink a finished buffer after the fact.
//!
//! ```
//! use mummy::{EncodeBuffer, Cursor, decode};
//!
//! let mut buf = EncodeBuffer::new(32).unwrap();
//! buf.open_list(2).unwrap();
//! buf.feed_int(42).unwrap();
//! buf.feed_string(b"hi").unwrap();
//!
//! let mut cursor = Cursor::wrap(buf.as_bytes());
//! let count = decode::container_size(&mut cursor).unwrap();
//! assert_eq!(count, 2);
//! assert_eq!(decode::read_int(&mut cursor).unwrap(), 42);
//! assert_eq!(decode::point_to_string(&mut cursor).unwrap(), b"hi");
//! ```
//!
//! A finished buffer can optionally be compressed after the fact; decoding
//! transparently probes the high bit of the first byte and unwraps it:
//!
//! ```
//! use mummy::{decompress, decode, Cursor, EncodeBuffer};
//!
//! let mut buf = EncodeBuffer::new(32).unwrap();
//! buf.feed_string(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
//! buf.compress().unwrap();
//!
//! let (payload, _did_decompress) = decompress(buf.as_bytes()).unwrap();
//! let mut cursor = Cursor::wrap(payload.as_ref());
//! assert_eq!(
//!     decode::point_to_string(&mut cursor).unwrap().len(),
//!     48
//! );
//! ```

mod buffer;
mod compress;
pub mod decode;
mod encode;
mod error;
mod tag;

pub use buffer::{Cursor, EncodeBuffer};
pub use compress::{decompress, CompressionError};
pub use error::{Error, Result};
pub use tag::{ContainerKind, SizeClass, SpecialNum, Tag};

pub use decode::{Date, DateTime, Decimal, Time, TimeDelta};
