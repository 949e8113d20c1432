//! The growable encode buffer and the read-only decode cursor.
//!
//! Spec's single `Buffer` type (owned-or-wrapped, tracked by an `offset`/`len`
//! pair) is split into two purpose-built Rust types: `EncodeBuffer` always
//! owns its bytes and only ever grows, `Cursor` always borrows a slice and
//! only ever advances through it. Rust's ownership system already draws the
//! line the spec's runtime flag draws by hand.

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// An owned, growable byte buffer that values are fed into.
///
/// Growth is delegated to `Vec::try_reserve`, which already implements
/// doubling-style amortized growth; `makespace` is kept as a named operation,
/// matching the spec's buffer model, and surfaces `Error::OutOfMemory`
/// without disturbing the buffer's existing contents on failure.
#[derive(Clone, Debug, Default)]
pub struct EncodeBuffer {
    data: Vec<u8>,
}

impl EncodeBuffer {
    /// Create a new, empty buffer with at least `initial_capacity` bytes of
    /// headroom reserved up front.
    pub fn new(initial_capacity: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve(initial_capacity)
            .map_err(|_| Error::OutOfMemory)?;
        Ok(Self { data })
    }

    /// Ensure at least `n` more bytes can be written without reallocating
    /// again immediately. The buffer's existing contents are left untouched
    /// on failure.
    pub fn makespace(&mut self, n: usize) -> Result<()> {
        self.data.try_reserve(n).map_err(|_| Error::OutOfMemory)
    }

    /// Unused capacity currently available without a further grow.
    pub fn space(&self) -> usize {
        self.data.capacity() - self.data.len()
    }

    /// Number of bytes written so far.
    pub fn offset(&self) -> usize {
        self.data.len()
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer, returning the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Roll the cursor back to `offset`, discarding anything written past
    /// it. Used by `feed_decimal` to undo a partial write on invalid input
    /// (Open Question 1: the rollback must cover every byte written, not an
    /// approximation of it).
    pub(crate) fn truncate(&mut self, offset: usize) {
        self.data.truncate(offset);
    }

    pub(crate) fn push_u8(&mut self, v: u8) {
        self.data.push(v);
    }

    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Replace the buffer's contents wholesale. Used by `compress` to swap
    /// the plaintext payload for its compressed envelope once compression
    /// has already been proven worthwhile.
    pub(crate) fn replace_contents(&mut self, data: Vec<u8>) {
        self.data = data;
    }
}

/// A read-only cursor over a borrowed byte slice.
///
/// Equivalent to the spec's "wrapped" buffer: it never reallocates and is
/// only ever used for decoding. There is no owned decode-buffer variant
/// because nothing in the decoder ever needs to grow one.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Wrap a byte slice for reading. Borrows `data`; never copies it.
    pub fn wrap(data: &'a [u8]) -> Self {
        Cursor { data, offset: 0 }
    }

    /// Bytes remaining between the cursor and the end of the wrapped slice.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Current read position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether every byte of the wrapped slice has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn require(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            Err(Error::ShortBuffer)
        } else {
            Ok(())
        }
    }

    /// Peek at the next byte without advancing the cursor.
    pub(crate) fn peek_u8(&self) -> Result<u8> {
        self.require(1)?;
        Ok(self.data[self.offset])
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let v = self.peek_u8()?;
        self.offset += 1;
        Ok(v)
    }

    pub(crate) fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16> {
        self.require(2)?;
        let mut s = &self.data[self.offset..self.offset + 2];
        let v = s.read_u16::<BigEndian>().map_err(|_| Error::ShortBuffer)?;
        self.offset += 2;
        Ok(v)
    }

    pub(crate) fn read_i16(&mut self) -> Result<i16> {
        self.require(2)?;
        let mut s = &self.data[self.offset..self.offset + 2];
        let v = s.read_i16::<BigEndian>().map_err(|_| Error::ShortBuffer)?;
        self.offset += 2;
        Ok(v)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        self.require(4)?;
        let mut s = &self.data[self.offset..self.offset + 4];
        let v = s.read_u32::<BigEndian>().map_err(|_| Error::ShortBuffer)?;
        self.offset += 4;
        Ok(v)
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32> {
        self.require(4)?;
        let mut s = &self.data[self.offset..self.offset + 4];
        let v = s.read_i32::<BigEndian>().map_err(|_| Error::ShortBuffer)?;
        self.offset += 4;
        Ok(v)
    }

    pub(crate) fn read_i64(&mut self) -> Result<i64> {
        self.require(8)?;
        let mut s = &self.data[self.offset..self.offset + 8];
        let v = s.read_i64::<BigEndian>().map_err(|_| Error::ShortBuffer)?;
        self.offset += 8;
        Ok(v)
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64> {
        self.require(8)?;
        let mut s = &self.data[self.offset..self.offset + 8];
        let v = s.read_f64::<BigEndian>().map_err(|_| Error::ShortBuffer)?;
        self.offset += 8;
        Ok(v)
    }

    /// Borrow the next `n` bytes without copying, advancing the cursor past
    /// them.
    pub(crate) fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        self.require(n)?;
        let s = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn makespace_preserves_contents_on_failure() {
        let mut buf = EncodeBuffer::new(4).unwrap();
        buf.extend(&[1, 2, 3]);
        assert!(buf.makespace(usize::MAX).is_err());
        assert_eq!(buf.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn cursor_bounds_check() {
        let data = [0x01u8, 0x02];
        let mut c = Cursor::wrap(&data);
        assert_eq!(c.read_u8().unwrap(), 1);
        assert_eq!(c.read_u8().unwrap(), 2);
        assert!(matches!(c.read_u8(), Err(Error::ShortBuffer)));
    }

    #[test]
    fn truncate_rolls_back_partial_writes() {
        let mut buf = EncodeBuffer::new(8).unwrap();
        buf.extend(&[1, 2, 3, 4]);
        let mark = buf.offset();
        buf.extend(&[5, 6]);
        buf.truncate(mark);
        assert_eq!(buf.as_bytes(), &[1, 2, 3, 4]);
    }
}
