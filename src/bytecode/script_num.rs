//! Minimal little-endian sign-magnitude numbers, the target machine's
//! canonical encoding for integers on the stack.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptNumError {
    #[error("script number overflow: {len} bytes exceeds the {max} byte limit")]
    Overflow { len: usize, max: usize },
    #[error("script number is not minimally encoded")]
    NonMinimal,
}

/// Operand size limit the target machine applies to arithmetic.
pub const MAX_NUM_SIZE: usize = 4;

/// Encode `value` in the minimal number of bytes. Zero encodes as the empty
/// byte string.
pub fn encode(value: i64) -> Vec<u8> {
    let mut out = Vec::new();
    if value == 0 {
        return out;
    }

    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    while magnitude > 0 {
        out.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }

    // The top bit of the last byte is the sign bit. If the magnitude already
    // uses it, an extra byte carries the sign.
    let last = out.len() - 1;
    if out[last] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        out[last] |= 0x80;
    }
    out
}

/// Decode a script number of at most `max_len` bytes.
pub fn decode(bytes: &[u8], max_len: usize, require_minimal: bool) -> Result<i64, ScriptNumError> {
    if bytes.len() > max_len || bytes.len() > 8 {
        return Err(ScriptNumError::Overflow {
            len: bytes.len(),
            max: max_len.min(8),
        });
    }
    if bytes.is_empty() {
        return Ok(0);
    }
    if require_minimal && !is_minimal(bytes) {
        return Err(ScriptNumError::NonMinimal);
    }

    let mut magnitude: u64 = 0;
    for (i, b) in bytes.iter().enumerate() {
        magnitude |= u64::from(*b) << (8 * i);
    }

    let sign_bit = 0x80u64 << (8 * (bytes.len() - 1));
    if magnitude & sign_bit != 0 {
        Ok(-((magnitude & !sign_bit) as i64))
    } else {
        Ok(magnitude as i64)
    }
}

/// True if `bytes` is the shortest encoding of its value.
pub fn is_minimal(bytes: &[u8]) -> bool {
    match bytes {
        [] => true,
        [.., last] if last & 0x7f != 0 => true,
        // A trailing 0x00/0x80 is only allowed when the byte before it
        // needs its top bit for magnitude.
        [.., prev, _] => prev & 0x80 != 0,
        [_] => false,
    }
}

/// Truthiness of a stack element: any non-zero byte, except a lone sign bit
/// in the last position (negative zero).
pub fn as_bool(bytes: &[u8]) -> bool {
    for (i, b) in bytes.iter().enumerate() {
        if *b != 0 {
            return !(i == bytes.len() - 1 && *b == 0x80);
        }
    }
    false
}
