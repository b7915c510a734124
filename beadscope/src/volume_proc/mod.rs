//! Volume processing pipeline for bead detection.
//!
//! The stages run as a strict one-shot forward pass:
//!
//! 1. **integral**: fold a [`VolumeBuffer`] into a zero-padded cumulative-sum
//!    volume (three ordered 1D sweeps),
//! 2. **dom**: evaluate a normalized difference-of-mean contrast response
//!    against the integral volume in O(1) per voxel,
//! 3. **detection**: scan the response for 26-neighborhood local extrema.
//!
//! Parameter changes re-run the pass wholesale; the integral volume may be
//! retained across box-size choices since it only depends on the source
//! samples.
//!
//! # Module Organization
//!
//! - **volume**: source and response containers plus calibration pass-through
//! - **integral**: integral volume construction and box-sum queries
//! - **box_filter**: box geometry and plain box-mean smoothing
//! - **sweep**: the shared scanline engine behind every box filter
//! - **dom**: the difference-of-mean response filter
//! - **detection**: peak types and the local extrema scan

pub mod box_filter;
pub mod detection;
pub mod dom;
pub mod integral;
pub mod sweep;
pub mod volume;

pub use box_filter::{box_mean, BoxSpec, MarginFill};
pub use detection::{find_peaks, Peak, Polarity};
pub use dom::{compute_response, compute_response_with, ValueRange};
pub use integral::{box_sum, build_integral, IntegralVolume};
pub use sweep::ChunkStrategy;
pub use volume::{Calibration, ResponseVolume, VolumeBuffer};

use crate::error::DetectError;

/// Allocate a zero-filled buffer, surfacing allocator refusal as an error
/// instead of aborting the process.
pub(crate) fn try_alloc_zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>, DetectError> {
    let bytes = len.saturating_mul(std::mem::size_of::<T>());
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| DetectError::Allocation { bytes })?;
    buffer.resize(len, T::default());
    Ok(buffer)
}
