//! The encoder: atom-writers and container openers that append typed values
//! onto an [`EncodeBuffer`].
//!
//! Every writer follows the same three-step shape as the teacher's
//! `serialize_elem`: compute the exact byte count about to be written,
//! reserve it with `makespace` (so `OutOfMemory` is reported before anything
//! is written rather than mid-write), then push the tag, any length prefix,
//! and the payload, in that order.

use crate::buffer::EncodeBuffer;
use crate::error::{Error, Result};
use crate::tag::{size_class, SizeClass, SpecialNum, Tag};

impl EncodeBuffer {
    /// Write a NULL atom.
    pub fn feed_null(&mut self) -> Result<()> {
        self.makespace(1)?;
        self.push_u8(Tag::Null.into());
        Ok(())
    }

    /// Write a BOOL atom.
    pub fn feed_bool(&mut self, v: bool) -> Result<()> {
        self.makespace(2)?;
        self.push_u8(Tag::Bool.into());
        self.push_u8(v as u8);
        Ok(())
    }

    /// Write a signed integer, choosing the narrowest of CHAR/SHORT/INT/LONG
    /// that can represent it.
    pub fn feed_int(&mut self, v: i64) -> Result<()> {
        if (i8::MIN as i64..=i8::MAX as i64).contains(&v) {
            self.makespace(2)?;
            self.push_u8(Tag::Char.into());
            self.push_u8(v as i8 as u8);
        } else if (i16::MIN as i64..=i16::MAX as i64).contains(&v) {
            self.makespace(3)?;
            self.push_u8(Tag::Short.into());
            self.extend(&(v as i16).to_be_bytes());
        } else if (i32::MIN as i64..=i32::MAX as i64).contains(&v) {
            self.makespace(5)?;
            self.push_u8(Tag::Int.into());
            self.extend(&(v as i32).to_be_bytes());
        } else {
            self.makespace(9)?;
            self.push_u8(Tag::Long.into());
            self.extend(&v.to_be_bytes());
        }
        Ok(())
    }

    /// Write an arbitrary-precision signed integer as length-prefixed
    /// big-endian two's-complement bytes, written through verbatim.
    pub fn feed_huge(&mut self, bytes: &[u8]) -> Result<()> {
        self.makespace(5 + bytes.len())?;
        self.push_u8(Tag::Huge.into());
        self.extend(&(bytes.len() as u32).to_be_bytes());
        self.extend(bytes);
        Ok(())
    }

    /// Write an IEEE-754 double.
    pub fn feed_float(&mut self, v: f64) -> Result<()> {
        self.makespace(9)?;
        self.push_u8(Tag::Float.into());
        self.extend(&v.to_be_bytes());
        Ok(())
    }

    fn len_prefix_tags(short: Tag, med: Tag, long: Tag, len: usize) -> (Tag, usize) {
        match size_class(len) {
            SizeClass::Short => (short, 1),
            SizeClass::Med => (med, 2),
            SizeClass::Long => (long, 4),
        }
    }

    fn feed_len_prefixed(&mut self, short: Tag, med: Tag, long: Tag, bytes: &[u8]) -> Result<()> {
        let (tag, prefix_len) = Self::len_prefix_tags(short, med, long, bytes.len());
        self.makespace(1 + prefix_len + bytes.len())?;
        self.push_u8(tag.into());
        match prefix_len {
            1 => self.push_u8(bytes.len() as u8),
            2 => self.extend(&(bytes.len() as u16).to_be_bytes()),
            _ => self.extend(&(bytes.len() as u32).to_be_bytes()),
        }
        self.extend(bytes);
        Ok(())
    }

    /// Write an opaque byte string.
    pub fn feed_string(&mut self, bytes: &[u8]) -> Result<()> {
        self.feed_len_prefixed(Tag::ShortStr, Tag::MedStr, Tag::LongStr, bytes)
    }

    /// Write a UTF-8 text payload. The caller is responsible for `bytes`
    /// actually being valid UTF-8; the codec does not re-validate it.
    pub fn feed_utf8(&mut self, bytes: &[u8]) -> Result<()> {
        self.feed_len_prefixed(Tag::ShortUtf8, Tag::MedUtf8, Tag::LongUtf8, bytes)
    }

    fn container_tags(kind: crate::tag::ContainerKind) -> (Tag, Tag, Tag) {
        use crate::tag::ContainerKind::*;
        match kind {
            List => (Tag::ShortList, Tag::MedList, Tag::LongList),
            Tuple => (Tag::ShortTuple, Tag::MedTuple, Tag::LongTuple),
            Set => (Tag::ShortSet, Tag::MedSet, Tag::LongSet),
            Hash => (Tag::ShortHash, Tag::MedHash, Tag::LongHash),
        }
    }

    fn open_container(&mut self, kind: crate::tag::ContainerKind, count: u32) -> Result<()> {
        let (short, med, long) = Self::container_tags(kind);
        let (tag, prefix_len) = Self::len_prefix_tags(short, med, long, count as usize);
        self.makespace(1 + prefix_len)?;
        self.push_u8(tag.into());
        match prefix_len {
            1 => self.push_u8(count as u8),
            2 => self.extend(&(count as u16).to_be_bytes()),
            _ => self.extend(&count.to_be_bytes()),
        }
        Ok(())
    }

    /// Open a list container. The caller must follow with exactly `count`
    /// values.
    pub fn open_list(&mut self, count: u32) -> Result<()> {
        self.open_container(crate::tag::ContainerKind::List, count)
    }

    /// Open a tuple container. The caller must follow with exactly `count`
    /// values.
    pub fn open_tuple(&mut self, count: u32) -> Result<()> {
        self.open_container(crate::tag::ContainerKind::Tuple, count)
    }

    /// Open a set container. The caller must follow with exactly `count`
    /// values.
    pub fn open_set(&mut self, count: u32) -> Result<()> {
        self.open_container(crate::tag::ContainerKind::Set, count)
    }

    /// Open a hash (map) container. The caller must follow with exactly
    /// `count` key/value pairs (`2 * count` values).
    pub fn open_hash(&mut self, count: u32) -> Result<()> {
        self.open_container(crate::tag::ContainerKind::Hash, count)
    }

    /// Write a calendar date.
    pub fn feed_date(&mut self, year: i16, month: u8, day: u8) -> Result<()> {
        self.makespace(5)?;
        self.push_u8(Tag::Date.into());
        self.extend(&year.to_be_bytes());
        self.push_u8(month);
        self.push_u8(day);
        Ok(())
    }

    /// Write the three big-endian bytes of a 24-bit microsecond count.
    fn push_usec24(&mut self, usec: u32) {
        let b = usec.to_be_bytes();
        self.extend(&b[1..4]);
    }

    /// Write a time-of-day. `usec` must fit in 24 bits (`0..=16_777_215`).
    pub fn feed_time(&mut self, hour: u8, minute: u8, second: u8, usec: u32) -> Result<()> {
        if usec > 0xff_ffff {
            return Err(Error::InvalidArgument("microseconds exceed 24 bits"));
        }
        self.makespace(7)?;
        self.push_u8(Tag::Time.into());
        self.push_u8(hour);
        self.push_u8(minute);
        self.push_u8(second);
        self.push_usec24(usec);
        Ok(())
    }

    /// Write a combined date and time.
    #[allow(clippy::too_many_arguments)]
    pub fn feed_datetime(
        &mut self,
        year: i16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        usec: u32,
    ) -> Result<()> {
        if usec > 0xff_ffff {
            return Err(Error::InvalidArgument("microseconds exceed 24 bits"));
        }
        self.makespace(10)?;
        self.push_u8(Tag::DateTime.into());
        self.extend(&year.to_be_bytes());
        self.push_u8(month);
        self.push_u8(day);
        self.push_u8(hour);
        self.push_u8(minute);
        self.push_u8(second);
        self.push_usec24(usec);
        Ok(())
    }

    /// Write a signed day/second/microsecond duration.
    pub fn feed_timedelta(&mut self, days: i32, seconds: i32, microseconds: i32) -> Result<()> {
        self.makespace(13)?;
        self.push_u8(Tag::TimeDelta.into());
        self.extend(&days.to_be_bytes());
        self.extend(&seconds.to_be_bytes());
        self.extend(&microseconds.to_be_bytes());
        Ok(())
    }

    /// Write an arbitrary-precision decimal: a sign, a base-10 exponent, and
    /// a run of packed BCD digits.
    ///
    /// Rejects any digit outside `0..=9` with `InvalidArgument`. On
    /// rejection the buffer is rolled back to exactly where it stood before
    /// this call — the full tag-through-count prefix that was already
    /// written, not an approximation of it (Open Question 1).
    pub fn feed_decimal(
        &mut self,
        negative: bool,
        exponent: i16,
        digit_count: u16,
        digits: &[u8],
    ) -> Result<()> {
        let start = self.offset();
        let packed_len = (digit_count as usize).div_ceil(2);
        self.makespace(6 + packed_len)?;
        self.push_u8(Tag::Decimal.into());
        self.push_u8(negative as u8);
        self.extend(&exponent.to_be_bytes());
        self.extend(&digit_count.to_be_bytes());

        let mut packed = vec![0u8; packed_len];
        for (i, &d) in digits.iter().take(digit_count as usize).enumerate() {
            if d > 9 {
                self.truncate(start);
                return Err(Error::InvalidArgument("decimal digit out of range 0..=9"));
            }
            if i % 2 == 0 {
                packed[i / 2] |= d;
            } else {
                packed[i / 2] |= d << 4;
            }
        }
        self.extend(&packed);
        Ok(())
    }

    /// Write positive or negative infinity.
    pub fn feed_infinity(&mut self, negative: bool) -> Result<()> {
        self.makespace(2)?;
        self.push_u8(Tag::SpecialNum.into());
        self.push_u8(SpecialNum::infinity_flags(negative));
        Ok(())
    }

    /// Write a NaN. Per Open Question 4, a signed NaN is never produced; the
    /// sign bit is always written clear.
    pub fn feed_nan(&mut self, signaling: bool) -> Result<()> {
        self.makespace(2)?;
        self.push_u8(Tag::SpecialNum.into());
        self.push_u8(SpecialNum::nan_flags(signaling));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf() -> EncodeBuffer {
        EncodeBuffer::new(16).unwrap()
    }

    #[test]
    fn s1_small_int() {
        let mut b = buf();
        b.feed_int(42).unwrap();
        assert_eq!(b.as_bytes(), &[0x02, 0x2A]);
    }

    #[test]
    fn s2_negative_short_boundary() {
        let mut b = buf();
        b.feed_int(-129).unwrap();
        assert_eq!(b.as_bytes(), &[0x03, 0xFF, 0x7F]);

        let mut b = buf();
        b.feed_int(-128).unwrap();
        assert_eq!(b.as_bytes(), &[0x02, 0x80]);
    }

    #[test]
    fn s3_short_string() {
        let mut b = buf();
        b.feed_string(b"abc").unwrap();
        assert_eq!(b.as_bytes(), &[0x08, 0x03, 0x61, 0x62, 0x63]);

        let mut b = buf();
        let payload = vec![0x41u8; 300];
        b.feed_string(&payload).unwrap();
        assert_eq!(&b.as_bytes()[0..3], &[0x18, 0x01, 0x2C]);
        assert_eq!(&b.as_bytes()[3..], payload.as_slice());
    }

    #[test]
    fn s4_container() {
        let mut b = buf();
        b.open_list(3).unwrap();
        b.feed_int(1).unwrap();
        b.feed_string(b"a").unwrap();
        b.feed_null().unwrap();
        assert_eq!(
            b.as_bytes(),
            &[0x10, 0x03, 0x02, 0x01, 0x08, 0x01, 0x61, 0x00]
        );
    }

    #[test]
    fn s5_date() {
        let mut b = buf();
        b.feed_date(2024, 3, 15).unwrap();
        assert_eq!(b.as_bytes(), &[0x1A, 0x07, 0xE8, 0x03, 0x0F]);
    }

    #[test]
    fn s6_decimal() {
        let mut b = buf();
        b.feed_decimal(true, -2, 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(
            b.as_bytes(),
            &[0x1E, 0x01, 0xFF, 0xFE, 0x00, 0x04, 0x21, 0x43]
        );
    }

    #[test]
    fn feed_decimal_rolls_back_fully_on_bad_digit() {
        let mut b = buf();
        b.feed_string(b"prefix").unwrap();
        let mark = b.offset();
        let err = b.feed_decimal(false, 0, 2, &[1, 10]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(b.offset(), mark);
    }

    #[test]
    fn size_class_minimality_strings() {
        let mut short = buf();
        short.feed_string(&vec![0u8; 255]).unwrap();
        assert_eq!(short.as_bytes()[0], Tag::ShortStr.into_u8());

        let mut med = buf();
        med.feed_string(&vec![0u8; 256]).unwrap();
        assert_eq!(med.as_bytes()[0], Tag::MedStr.into_u8());
    }

    #[test]
    fn size_class_minimality_ints() {
        let mut a = buf();
        a.feed_int(i8::MAX as i64).unwrap();
        assert_eq!(a.as_bytes()[0], Tag::Char.into_u8());

        let mut b = buf();
        b.feed_int(i8::MAX as i64 + 1).unwrap();
        assert_eq!(b.as_bytes()[0], Tag::Short.into_u8());
    }
}
