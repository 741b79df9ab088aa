//! Shared contract for the digit-conversion backends.
//!
//! A backend turns a byte sequence into base-N digit values and back.
//! Bytes are processed in fixed-size groups: every group of `g` bytes maps
//! to the smallest digit count `d` with `N^d >= 2^(8g)`, zero-padded,
//! most-significant digit first. Both backends must produce bit-identical
//! digit streams; alphabet membership is the codec layer's concern, so a
//! backend only ever sees digit values below the radix.

use crate::error::BackendError;

/// Interchangeable digit-conversion implementation.
pub trait DigitBackend {
    /// Convert bytes to base-N digit values, most-significant digit first
    /// within each group.
    fn encode_digits(&mut self, bytes: &[u8]) -> Result<Vec<u32>, BackendError>;

    /// Inverse of [`encode_digits`](Self::encode_digits). `byte_len` is the
    /// exact number of bytes the digit stream is expected to yield.
    fn decode_digits(&mut self, digits: &[u32], byte_len: usize) -> Result<Vec<u8>, BackendError>;
}

/// Extra surface of the data-parallel backend: it can lose its device at
/// any time and be re-enabled after an explicit successful
/// re-initialization.
pub trait AcceleratedBackend: DigitBackend {
    /// Whether the compute pipeline is currently usable.
    fn is_available(&self) -> bool;

    /// Attempt to rebuild the compute pipeline. Returns the new
    /// availability.
    fn reinitialize(&mut self) -> bool;
}

/// Digits needed to represent one group of `group_bytes` bytes in base
/// `radix`: the smallest `d` with `radix^d >= 2^(8 * group_bytes)`.
pub fn digits_for_group(radix: usize, group_bytes: usize) -> usize {
    debug_assert!(group_bytes >= 1 && group_bytes <= 8);
    let limit = 1u128 << (8 * group_bytes as u32);
    let mut pow = 1u128;
    let mut d = 0usize;
    while pow < limit {
        pow = pow.saturating_mul(radix as u128);
        d += 1;
    }
    d
}

/// Total digit count for a payload of `byte_len` bytes split into groups
/// of `group_width`.
pub fn digit_count(radix: usize, group_width: usize, byte_len: usize) -> usize {
    let full = byte_len / group_width;
    let rem = byte_len % group_width;
    let mut total = full * digits_for_group(radix, group_width);
    if rem > 0 {
        total += digits_for_group(radix, rem);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_sizing_matches_information_content() {
        // One byte in base 16 needs two digits, in base 256 one would do.
        assert_eq!(digits_for_group(16, 1), 2);
        // Four bytes in base 64: 64^6 > 2^32 > 64^5.
        assert_eq!(digits_for_group(64, 4), 6);
        // Four bytes in base 10: 10^10 > 2^32 > 10^9.
        assert_eq!(digits_for_group(10, 4), 10);
    }

    #[test]
    fn payload_digit_count_includes_remainder_group() {
        // 10 bytes at width 4: two full groups plus a 2-byte tail.
        let expect = 2 * digits_for_group(10, 4) + digits_for_group(10, 2);
        assert_eq!(digit_count(10, 4, 10), expect);
        assert_eq!(digit_count(10, 4, 0), 0);
    }
}
