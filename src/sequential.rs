//! Scalar digit backend. Always available; the fallback target for every
//! parallel-backend failure.

use crate::backend::{digits_for_group, DigitBackend};
use crate::error::BackendError;

/// Pure scalar base conversion over fixed-size byte groups.
#[derive(Debug, Clone)]
pub struct SequentialBackend {
    radix: u128,
    group_width: usize,
    /// Digit count for group sizes 1..=group_width, indexed by size - 1.
    per_group: Vec<usize>,
}

impl SequentialBackend {
    pub fn new(radix: usize, group_width: usize) -> Self {
        let per_group = (1..=group_width)
            .map(|g| digits_for_group(radix, g))
            .collect();
        Self {
            radix: radix as u128,
            group_width,
            per_group,
        }
    }

    fn group_digits(&self, group_bytes: usize) -> usize {
        self.per_group[group_bytes - 1]
    }

    /// Scalar conversion cannot fail, so the codec's fallback path calls
    /// this directly instead of going through the trait.
    pub fn encode_groups(&self, bytes: &[u8]) -> Vec<u32> {
        let mut out = Vec::with_capacity(
            (bytes.len() / self.group_width + 1) * self.group_digits(self.group_width),
        );
        for chunk in bytes.chunks(self.group_width) {
            let mut val: u128 = 0;
            for &b in chunk {
                val = (val << 8) | b as u128;
            }
            let d = self.group_digits(chunk.len());
            let start = out.len();
            out.resize(start + d, 0);
            for slot in (start..start + d).rev() {
                out[slot] = (val % self.radix) as u32;
                val /= self.radix;
            }
        }
        out
    }

    /// Inverse of [`encode_groups`](Self::encode_groups).
    pub fn decode_groups(&self, digits: &[u32], byte_len: usize) -> Result<Vec<u8>, BackendError> {
        let mut out = Vec::with_capacity(byte_len);
        let mut pos = 0usize;
        let mut remaining = byte_len;
        while remaining > 0 {
            let g = remaining.min(self.group_width);
            let d = self.group_digits(g);
            if pos + d > digits.len() {
                return Err(BackendError::RuntimeFailure(format!(
                    "digit stream truncated: need {} digits at offset {}, have {}",
                    d,
                    pos,
                    digits.len()
                )));
            }
            let mut val: u128 = 0;
            for &digit in &digits[pos..pos + d] {
                val = val * self.radix + digit as u128;
            }
            // A corrupted stream can push a group past 2^(8g). Keep the
            // low 8g bits; the checksum flags the damage upstream.
            for shift in (0..g).rev() {
                out.push((val >> (8 * shift)) as u8);
            }
            pos += d;
            remaining -= g;
        }
        if pos != digits.len() {
            return Err(BackendError::RuntimeFailure(format!(
                "{} trailing digits after {byte_len} bytes",
                digits.len() - pos
            )));
        }
        Ok(out)
    }
}

impl DigitBackend for SequentialBackend {
    fn encode_digits(&mut self, bytes: &[u8]) -> Result<Vec<u32>, BackendError> {
        Ok(self.encode_groups(bytes))
    }

    fn decode_digits(&mut self, digits: &[u32], byte_len: usize) -> Result<Vec<u8>, BackendError> {
        self.decode_groups(digits, byte_len)
    }
}
