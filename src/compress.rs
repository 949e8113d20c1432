//! Whole-payload LZF compression envelope (§4.4).
//!
//! A payload is compressed in place only when doing so nets a real size
//! win; otherwise it's left alone. The high bit of the payload's first byte
//! is the only on-wire signal that compression happened, which is why
//! `tag()` and every reader mask it off before looking at the tag.

use std::borrow::Cow;
use std::fmt;

use lzf_rust::CompressionMode;

use crate::buffer::EncodeBuffer;
use crate::error::{Error, Result};
use crate::tag::COMPRESSED_FLAG;

/// Minimum number of bytes a compressed payload must save over its
/// uncompressed form before compression is considered worthwhile. Below
/// this, the 5-byte envelope overhead (flag bit folded into byte 0, plus a
/// 4-byte big-endian uncompressed length) would eat the saving.
const MIN_NET_SAVINGS: usize = 5;

/// An error from the LZF compression or decompression codec.
#[derive(Clone, Debug)]
pub enum CompressionError {
    /// `lzf_rust` couldn't compress the payload (it isn't required to
    /// succeed on all inputs; LZF falls back to "not compressible" rather
    /// than erroring in the common case, so this mostly surfaces in
    /// degenerate or I/O-level failures from the underlying library).
    Encode,
    /// `lzf_rust` couldn't decompress the payload, or the decompressed
    /// length didn't match the envelope's declared uncompressed length.
    Decode,
}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompressionError::Encode => write!(f, "lzf compression failed"),
            CompressionError::Decode => write!(f, "lzf decompression failed"),
        }
    }
}

impl std::error::Error for CompressionError {}

impl EncodeBuffer {
    /// Attempt to compress the whole buffer in place, per §4.4.
    ///
    /// No-ops (returns `Ok(false)`) if:
    /// - the buffer is already marked compressed (byte 0's high bit set),
    /// - the buffer is 6 bytes or smaller (nothing meaningful to save), or
    /// - LZF's output doesn't beat the uncompressed form by at least
    ///   [`MIN_NET_SAVINGS`] bytes once the envelope overhead is counted.
    ///
    /// On success, the buffer's contents become: byte 0 with its high bit
    /// set, a 4-byte big-endian length of the post-tag region as it stood
    /// before compression, then the LZF-compressed bytes of that post-tag
    /// region (the tag byte itself is never fed to the compressor). Returns
    /// `Ok(true)` if compression was applied.
    pub fn compress(&mut self) -> Result<bool> {
        let data = self.as_bytes();
        if data.is_empty() {
            return Ok(false);
        }
        if data[0] & COMPRESSED_FLAG != 0 {
            return Ok(false);
        }
        if data.len() <= 6 {
            return Ok(false);
        }

        // Only try to fit the compressed output into a buffer small enough
        // that success already implies MIN_NET_SAVINGS; this turns "not
        // compressible enough to bother" into the same OutputTooSmall error
        // LZF already reports for "didn't fit", rather than a separate check.
        let max_try = data.len().saturating_sub(4 + MIN_NET_SAVINGS);
        if max_try == 0 {
            return Ok(false);
        }
        // Only the post-tag region is compressed; the tag byte itself is
        // carried separately at envelope offset 0 (with the compressed flag
        // folded in), not duplicated inside the compressed stream.
        let body = &data[1..];
        let mut out = vec![0u8; max_try];
        let compressed_len = match lzf_rust::compress_with_mode(body, &mut out, CompressionMode::Normal) {
            Ok(n) => n,
            Err(lzf_rust::Error::OutputTooSmall) => return Ok(false),
            Err(_) => return Err(CompressionError::Encode.into()),
        };
        out.truncate(compressed_len);

        let envelope_len = 4 + out.len();
        let mut rebuilt = Vec::new();
        rebuilt
            .try_reserve(1 + envelope_len)
            .map_err(|_| Error::OutOfMemory)?;
        rebuilt.push(data[0] | COMPRESSED_FLAG);
        rebuilt.extend_from_slice(&(body.len() as u32).to_be_bytes());
        rebuilt.extend_from_slice(&out);

        self.replace_contents(rebuilt);
        Ok(true)
    }
}

/// Decompress a payload, transparently passing through anything that isn't
/// compressed.
///
/// If `data[0]`'s high bit is clear, this is a no-op: `data` is returned
/// borrowed, unchanged. Otherwise the envelope is unwrapped and the
/// original uncompressed payload (high bit clear) is returned owned. Either
/// way the caller can tell which happened from the returned `bool`, mirroring
/// the spec's `out_did_decompress` flag.
pub fn decompress(data: &[u8]) -> Result<(Cow<[u8]>, bool)> {
    if data.is_empty() || data[0] & COMPRESSED_FLAG == 0 {
        return Ok((Cow::Borrowed(data), false));
    }
    if data.len() < 5 {
        return Err(Error::ShortBuffer);
    }
    // The 4-byte header is the length of the post-tag region that was
    // compressed; the tag byte itself was never part of the compressed
    // stream, so it's restored directly into out[0] rather than decoded.
    let body_len = u32::from_be_bytes([data[1], data[2], data[3], data[4]]) as usize;
    let compressed = &data[5..];

    let mut out = Vec::new();
    out.try_reserve(body_len + 1)
        .map_err(|_| Error::OutOfMemory)?;
    out.push(data[0] & !COMPRESSED_FLAG);
    out.resize(1 + body_len, 0);

    let n = lzf_rust::decompress(compressed, &mut out[1..])
        .map_err(|_| CompressionError::Decode)?;
    if n != body_len {
        return Err(CompressionError::Decode.into());
    }
    Ok((Cow::Owned(out), true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::EncodeBuffer;

    fn compressible_payload() -> EncodeBuffer {
        let mut b = EncodeBuffer::new(4096).unwrap();
        b.open_list(200).unwrap();
        for _ in 0..200 {
            b.feed_string(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
        }
        b
    }

    #[test]
    fn compresses_and_decompresses_round_trip() {
        let mut b = compressible_payload();
        let original = b.as_bytes().to_vec();
        let did = b.compress().unwrap();
        assert!(did);
        assert_ne!(b.as_bytes(), original.as_slice());
        assert!(b.as_bytes()[0] & COMPRESSED_FLAG != 0);

        let (restored, did) = decompress(b.as_bytes()).unwrap();
        assert!(did);
        assert_eq!(restored.as_ref(), original.as_slice());
    }

    #[test]
    fn decompress_is_a_no_op_on_uncompressed_payload() {
        let b = compressible_payload();
        let original = b.as_bytes().to_vec();
        let (out, did) = decompress(b.as_bytes()).unwrap();
        assert!(!did);
        assert_eq!(out.as_ref(), original.as_slice());
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn decode_after_compress_then_decompress_round_trips() {
        use crate::decode;

        let mut b = EncodeBuffer::new(4096).unwrap();
        b.open_list(200).unwrap();
        for i in 0..200u32 {
            b.feed_int(i as i64).unwrap();
        }
        assert!(b.compress().unwrap());

        let (restored, did) = decompress(b.as_bytes()).unwrap();
        assert!(did);
        let mut c = crate::buffer::Cursor::wrap(restored.as_ref());
        let n = decode::container_size(&mut c).unwrap();
        assert_eq!(n, 200);
        for i in 0..200u32 {
            assert_eq!(decode::read_int(&mut c).unwrap(), i as i64);
        }
        assert!(c.is_empty());
    }

    #[test]
    fn idempotent_on_already_compressed_payload() {
        let mut b = compressible_payload();
        assert!(b.compress().unwrap());
        let once = b.as_bytes().to_vec();
        assert!(!b.compress().unwrap());
        assert_eq!(b.as_bytes(), once.as_slice());
    }

    #[test]
    fn skips_tiny_payloads() {
        let mut b = EncodeBuffer::new(16).unwrap();
        b.feed_int(1).unwrap();
        assert!(!b.compress().unwrap());
    }

    #[test]
    fn skips_incompressible_payloads_with_no_net_savings() {
        let mut b = EncodeBuffer::new(64).unwrap();
        b.open_tuple(3).unwrap();
        b.feed_int(1).unwrap();
        b.feed_int(2).unwrap();
        b.feed_int(3).unwrap();
        let before = b.as_bytes().to_vec();
        let did = b.compress().unwrap();
        if !did {
            assert_eq!(b.as_bytes(), before.as_slice());
        }
    }
}
