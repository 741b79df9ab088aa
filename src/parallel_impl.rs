use crate::backend::{digits_for_group, AcceleratedBackend, DigitBackend};
use crate::error::BackendError;
use crate::sequential::SequentialBackend;
use ocl::{Buffer, ProQue};

use super::{grid_dims, MAX_PARALLEL_GROUP_WIDTH};

/// OpenCL-backed digit converter.
///
/// If the OpenCL context or kernel fails to build the struct is still
/// created but reports itself unavailable; the codec layer then routes
/// every call to the sequential backend. Any runtime failure of the
/// device disables this backend until [`reinitialize`] succeeds.
///
/// [`reinitialize`]: AcceleratedBackend::reinitialize
pub struct ParallelBackend {
    pro_que: Option<ProQue>,
    radix: usize,
    group_width: usize,
    digits_per_group: usize,
    host: SequentialBackend,
}

impl ParallelBackend {
    pub fn new(radix: usize, group_width: usize) -> Self {
        let pro_que = if group_width <= MAX_PARALLEL_GROUP_WIDTH {
            build_pipeline()
        } else {
            None
        };
        Self {
            pro_que,
            radix,
            group_width,
            digits_per_group: digits_for_group(radix, group_width),
            host: SequentialBackend::new(radix, group_width),
        }
    }

    /// Mark the device lost and surface the failure.
    fn device_lost(&mut self, err: BackendError) -> BackendError {
        log::warn!("parallel backend disabled after device failure: {err}");
        self.pro_que = None;
        err
    }
}

fn build_pipeline() -> Option<ProQue> {
    let src = include_str!("kernels/radix_digits.cl");
    ProQue::builder().src(src).dims(1).build().ok()
}

fn run_encode(
    pq: &ProQue,
    bytes: &[u8],
    groups: usize,
    cols: usize,
    rows: usize,
    group_width: usize,
    radix: usize,
    digits_per_group: usize,
) -> Result<Vec<u32>, BackendError> {
    let input = Buffer::<u8>::builder()
        .queue(pq.queue().clone())
        .len(bytes.len())
        .copy_host_slice(bytes)
        .build()
        .map_err(|e| BackendError::RuntimeFailure(format!("{e}")))?;
    let output = Buffer::<u32>::builder()
        .queue(pq.queue().clone())
        .len(groups * digits_per_group)
        .build()
        .map_err(|e| BackendError::RuntimeFailure(format!("{e}")))?;

    let kernel = pq
        .kernel_builder("radix_encode")
        .arg(&input)
        .arg(groups as u32)
        .arg(group_width as u32)
        .arg(radix as u32)
        .arg(digits_per_group as u32)
        .arg(&output)
        .build()
        .map_err(|e| BackendError::RuntimeFailure(format!("{e}")))?;

    unsafe {
        kernel
            .cmd()
            .global_work_size((cols, rows))
            .enq()
            .map_err(|e| BackendError::RuntimeFailure(format!("{e}")))?;
    }

    let mut digits = vec![0u32; groups * digits_per_group];
    output
        .read(&mut digits)
        .enq()
        .map_err(|e| BackendError::RuntimeFailure(format!("{e}")))?;
    Ok(digits)
}

fn run_decode(
    pq: &ProQue,
    digits: &[u32],
    groups: usize,
    cols: usize,
    rows: usize,
    group_width: usize,
    radix: usize,
    digits_per_group: usize,
) -> Result<Vec<u8>, BackendError> {
    let input = Buffer::<u32>::builder()
        .queue(pq.queue().clone())
        .len(digits.len())
        .copy_host_slice(digits)
        .build()
        .map_err(|e| BackendError::RuntimeFailure(format!("{e}")))?;
    let output = Buffer::<u8>::builder()
        .queue(pq.queue().clone())
        .len(groups * group_width)
        .build()
        .map_err(|e| BackendError::RuntimeFailure(format!("{e}")))?;

    let kernel = pq
        .kernel_builder("radix_decode")
        .arg(&input)
        .arg(groups as u32)
        .arg(group_width as u32)
        .arg(radix as u32)
        .arg(digits_per_group as u32)
        .arg(&output)
        .build()
        .map_err(|e| BackendError::RuntimeFailure(format!("{e}")))?;

    unsafe {
        kernel
            .cmd()
            .global_work_size((cols, rows))
            .enq()
            .map_err(|e| BackendError::RuntimeFailure(format!("{e}")))?;
    }

    let mut bytes = vec![0u8; groups * group_width];
    output
        .read(&mut bytes)
        .enq()
        .map_err(|e| BackendError::RuntimeFailure(format!("{e}")))?;
    Ok(bytes)
}

impl DigitBackend for ParallelBackend {
    fn encode_digits(&mut self, bytes: &[u8]) -> Result<Vec<u32>, BackendError> {
        let full_groups = bytes.len() / self.group_width;
        let rem_start = full_groups * self.group_width;

        let mut out = Vec::new();
        if full_groups > 0 {
            let (cols, rows) = grid_dims(full_groups)?;
            let pq = match &self.pro_que {
                Some(p) => p,
                None => return Err(BackendError::Unavailable),
            };
            match run_encode(
                pq,
                &bytes[..rem_start],
                full_groups,
                cols,
                rows,
                self.group_width,
                self.radix,
                self.digits_per_group,
            ) {
                Ok(digits) => out = digits,
                Err(e) => return Err(self.device_lost(e)),
            }
        }
        if rem_start < bytes.len() {
            out.extend(self.host.encode_digits(&bytes[rem_start..])?);
        }
        Ok(out)
    }

    fn decode_digits(&mut self, digits: &[u32], byte_len: usize) -> Result<Vec<u8>, BackendError> {
        let full_groups = byte_len / self.group_width;
        let rem = byte_len % self.group_width;
        let device_digits = full_groups * self.digits_per_group;
        if digits.len() < device_digits {
            return Err(BackendError::RuntimeFailure(format!(
                "digit stream truncated: need {device_digits} digits, have {}",
                digits.len()
            )));
        }

        let mut out = Vec::with_capacity(byte_len);
        if full_groups > 0 {
            let (cols, rows) = grid_dims(full_groups)?;
            let pq = match &self.pro_que {
                Some(p) => p,
                None => return Err(BackendError::Unavailable),
            };
            match run_decode(
                pq,
                &digits[..device_digits],
                full_groups,
                cols,
                rows,
                self.group_width,
                self.radix,
                self.digits_per_group,
            ) {
                Ok(bytes) => out = bytes,
                Err(e) => return Err(self.device_lost(e)),
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
        self.pro_que.is_some()
    }

    fn reinitialize(&mut self) -> bool {
        if self.group_width <= MAX_PARALLEL_GROUP_WIDTH {
            self.pro_que = build_pipeline();
        }
        if self.pro_que.is_some() {
            log::info!("parallel backend re-enabled");
        }
        self.pro_que.is_some()
    }
}
