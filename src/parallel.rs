//! Data-parallel digit backend.
//!
//! Full conversion groups are laid out on a 2-D grid and converted
//! independently, one work item per group. The `gpu` feature routes the
//! grid to an OpenCL device; without it a CPU simulation with identical
//! grid and capacity semantics is compiled instead.

use crate::error::BackendError;

#[cfg(feature = "gpu")]
#[path = "parallel_impl.rs"]
mod parallel_impl;
#[cfg(feature = "gpu")]
pub use parallel_impl::ParallelBackend;

#[cfg(not(feature = "gpu"))]
#[path = "parallel_cpu.rs"]
mod parallel_cpu;
#[cfg(not(feature = "gpu"))]
pub use parallel_cpu::ParallelBackend;

/// Maximum addressable grid dimension per axis.
pub const MAX_GRID_DIM: usize = 8192;

/// Widest group the kernel's 64-bit accumulator can convert without
/// overflow headroom concerns. Wider groups stay on the sequential
/// backend.
pub const MAX_PARALLEL_GROUP_WIDTH: usize = 4;

/// Grid shape for `groups` work items, or `CapacityExceeded` when the
/// payload cannot be addressed. Never truncates.
pub(crate) fn grid_dims(groups: usize) -> Result<(usize, usize), BackendError> {
    let cols = groups.min(MAX_GRID_DIM);
    let rows = groups.div_ceil(cols);
    if rows > MAX_GRID_DIM {
        return Err(BackendError::CapacityExceeded {
            groups,
            capacity: MAX_GRID_DIM * MAX_GRID_DIM,
        });
    }
    Ok((cols, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_grows_row_wise() {
        assert_eq!(grid_dims(1).unwrap(), (1, 1));
        assert_eq!(grid_dims(MAX_GRID_DIM).unwrap(), (MAX_GRID_DIM, 1));
        assert_eq!(grid_dims(MAX_GRID_DIM + 1).unwrap(), (MAX_GRID_DIM, 2));
    }

    #[test]
    fn over_capacity_is_rejected() {
        let too_many = MAX_GRID_DIM * MAX_GRID_DIM + 1;
        assert!(matches!(
            grid_dims(too_many),
            Err(BackendError::CapacityExceeded { .. })
        ));
    }
}
