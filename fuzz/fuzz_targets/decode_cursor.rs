#![no_main]
use libfuzzer_sys::fuzz_target;
use mummy::{decode, Cursor};

/// Drives the decoder over arbitrary bytes, walking containers depth-first.
/// The only contract under test is that it never panics, regardless of how
/// malformed or truncated the input is.
fn walk(cursor: &mut Cursor, depth: u32) {
    if depth > 64 {
        return;
    }
    let Ok(t) = decode::tag(cursor) else { return };
    match t {
        0x00 => {
            let _ = decode::read_null(cursor);
        }
        0x01 => {
            let _ = decode::read_bool(cursor);
        }
        0x02 | 0x03 | 0x04 | 0x05 => {
            let _ = decode::read_int(cursor);
        }
        0x06 => {
            let _ = decode::point_to_huge(cursor);
        }
        0x07 => {
            let _ = decode::read_float(cursor);
        }
        0x08 | 0x09 | 0x18 => {
            let _ = decode::point_to_string(cursor);
        }
        0x0a | 0x0b | 0x19 => {
            let _ = decode::point_to_utf8(cursor);
        }
        0x1a => {
            let _ = decode::read_date(cursor);
        }
        0x1b => {
            let _ = decode::read_time(cursor);
        }
        0x1c => {
            let _ = decode::read_datetime(cursor);
        }
        0x1d => {
            let _ = decode::read_timedelta(cursor);
        }
        0x1e => {
            let _ = decode::read_decimal(cursor);
        }
        0x1f => {
            let _ = decode::read_specialnum(cursor);
        }
        _ => {
            if let Ok((kind, count)) = decode::container_size_and_kind(cursor) {
                let children = if matches!(kind, mummy::ContainerKind::Hash) {
                    count.saturating_mul(2)
                } else {
                    count
                };
                // `count` comes straight off the wire and isn't validated
                // against how much data is actually left; every child needs
                // at least 1 byte, so clamp the loop the same way `depth` is
                // already clamped instead of spinning on a declared count of
                // billions backed by a handful of real bytes.
                let bound = (cursor.remaining() as u64).min(u32::MAX as u64) as u32;
                let children = children.min(bound);
                for _ in 0..children {
                    if cursor.is_empty() {
                        break;
                    }
                    walk(cursor, depth + 1);
                }
            }
        }
    }
}

fuzz_target!(|data: &[u8]| {
    let mut cursor = Cursor::wrap(data);
    while !cursor.is_empty() {
        let before = cursor.offset();
        walk(&mut cursor, 0);
        if cursor.offset() == before {
            // Tag was unrecognized or decode failed without consuming
            // anything; bail instead of spinning.
            break;
        }
    }
});
