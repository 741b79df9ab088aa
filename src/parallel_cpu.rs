use crate::backend::{digits_for_group, AcceleratedBackend, DigitBackend};
use crate::error::BackendError;
use crate::sequential::SequentialBackend;

use super::{grid_dims, MAX_PARALLEL_GROUP_WIDTH};

/// CPU simulation of the grid-parallel digit converter.
///
/// Walks the same 2-D grid a device dispatch would cover, with the same
/// capacity bound, so codec-level behaviour matches the accelerated build.
pub struct ParallelBackend {
    available: bool,
    radix: u64,
    group_width: usize,
    digits_per_group: usize,
    host: SequentialBackend,
}

impl ParallelBackend {
    pub fn new(radix: usize, group_width: usize) -> Self {
        Self {
            available: group_width <= MAX_PARALLEL_GROUP_WIDTH,
            radix: radix as u64,
            group_width,
            digits_per_group: digits_for_group(radix, group_width),
            host: SequentialBackend::new(radix, group_width),
        }
    }
}

impl DigitBackend for ParallelBackend {
    fn encode_digits(&mut self, bytes: &[u8]) -> Result<Vec<u32>, BackendError> {
        if !self.available {
            return Err(BackendError::Unavailable);
        }
        let full_groups = bytes.len() / self.group_width;
        let rem_start = full_groups * self.group_width;

        let mut out = vec![0u32; full_groups * self.digits_per_group];
        if full_groups > 0 {
            let (cols, rows) = grid_dims(full_groups)?;
            for idx in 0..cols * rows {
                if idx >= full_groups {
                    break;
                }
                let mut val: u64 = 0;
                for i in 0..self.group_width {
                    val = (val << 8) | bytes[idx * self.group_width + i] as u64;
                }
                for d in (0..self.digits_per_group).rev() {
                    out[idx * self.digits_per_group + d] = (val % self.radix) as u32;
                    val /= self.radix;
                }
            }
        }
        if rem_start < bytes.len() {
            out.extend(self.host.encode_digits(&bytes[rem_start..])?);
        }
        Ok(out)
    }

    fn decode_digits(&mut self, digits: &[u32], byte_len: usize) -> Result<Vec<u8>, BackendError> {
        if !self.available {
            return Err(BackendError::Unavailable);
        }
        let full_groups = byte_len / self.group_width;
        let rem = byte_len % self.group_width;
        let device_digits = full_groups * self.digits_per_group;
        if digits.len() < device_digits {
            return Err(BackendError::RuntimeFailure(format!(
                "digit stream truncated: need {device_digits} digits, have {}",
                digits.len()
            )));
        }

        let mut out = vec![0u8; full_groups * self.group_width];
        if full_groups > 0 {
            let (cols, rows) = grid_dims(full_groups)?;
            for idx in 0..cols * rows {
                if idx >= full_groups {
                    break;
                }
                let mut val: u64 = 0;
                for d in 0..self.digits_per_group {
                    val = val * self.radix + digits[idx * self.digits_per_group + d] as u64;
                }
                // Out-of-range groups keep their low 8g bits, matching
                // the sequential backend on corrupted input.
                for i in (0..self.group_width).rev() {
                    out[idx * self.group_width + i] = (val & 0xff) as u8;
                    val >>= 8;
                }
            }
        }
        if rem > 0 {
            out.extend(self.host.decode_digits(&digits[device_digits..], rem)?);
        } else if digits.len() != device_digits {
            return Err(BackendError::RuntimeFailure(format!(
                "{} trailing digits after {byte_len} bytes",
                digits.len() - device_digits
            )));
        }
        Ok(out)
    }
}

impl AcceleratedBackend for ParallelBackend {
    fn is_available(&self) -> bool {
        self.available
    }

    fn reinitialize(&mut self) -> bool {
        self.available = self.group_width <= MAX_PARALLEL_GROUP_WIDTH;
        self.available
    }
}
