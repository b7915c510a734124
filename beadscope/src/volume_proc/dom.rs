//! Difference-of-mean contrast response.
//!
//! For every voxel of the valid interior the filter evaluates the mean over a
//! small and a large box centered on the voxel and writes the normalized
//! difference
//!
//! ```text
//! response = (mean_large - mean_small) / (max - min)
//! ```
//!
//! The large-minus-small sign is a fixed design decision that downstream
//! polarity interpretation depends on: a blob brighter than its surroundings
//! drives the small-box mean up and produces a *negative* response extremum.
//! See [`crate::volume_proc::detection`] for how that maps to peak polarity.
//!
//! Because both means come from the integral volume, cost is O(N) independent
//! of box size, which is the entire justification for the integral volume,
//! versus O(N * box volume) for naive box filtering.

use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::error::DetectError;
use crate::volume_proc::box_filter::BoxSpec;
use crate::volume_proc::integral::IntegralVolume;
use crate::volume_proc::sweep::{self, BoxProbe, ChunkStrategy};
use crate::volume_proc::volume::ResponseVolume;
use crate::volume_proc::try_alloc_zeroed;

/// Sample value range used to normalize the response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Smallest sample value.
    pub min: f32,
    /// Largest sample value.
    pub max: f32,
}

impl ValueRange {
    /// Create a range, rejecting degenerate or non-finite bounds.
    ///
    /// # Errors
    /// `OutOfRange` unless `min < max` and both are finite.
    pub fn new(min: f32, max: f32) -> Result<Self, DetectError> {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(DetectError::OutOfRange(format!(
                "value range [{min}, {max}] is degenerate"
            )));
        }
        Ok(Self { min, max })
    }

    /// Width of the range.
    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

/// Difference-of-mean response with the default chunking strategy.
///
/// See [`compute_response_with`] for the full contract.
pub fn compute_response(
    integral: &IntegralVolume,
    small: BoxSpec,
    large: BoxSpec,
    range: ValueRange,
) -> Result<ResponseVolume, DetectError> {
    compute_response_with(integral, small, large, range, ChunkStrategy::default())
}

/// Difference-of-mean response with an explicit chunking strategy.
///
/// The valid interior is the source extent shrunk by the larger box's
/// half-extent on each axis; voxels outside it are left at 0 and are never
/// peak candidates. Workers own disjoint partitions of the output (shaped by
/// `strategy`) and the call returns after the barrier join, so every strategy
/// produces bit-identical output.
///
/// # Arguments
/// * `integral` - Integral volume of the source (reusable across box sizes)
/// * `small` - Inner box, tuned to the blob core
/// * `large` - Outer box, tuned to the blob surround
/// * `range` - Source value range; the response is normalized by its span
/// * `strategy` - Worker partition shape
///
/// # Errors
/// `OutOfRange` if either box exceeds the source volume or the range is
/// degenerate, `Allocation` if the response buffer cannot be allocated.
pub fn compute_response_with(
    integral: &IntegralVolume,
    small: BoxSpec,
    large: BoxSpec,
    range: ValueRange,
    strategy: ChunkStrategy,
) -> Result<ResponseVolume, DetectError> {
    let source_dim = integral.source_dim();
    let (dz, dy, dx) = source_dim;
    for spec in [small, large] {
        if !spec.fits_in(source_dim) {
            return Err(DetectError::OutOfRange(format!(
                "box {:?} exceeds volume {dx}x{dy}x{dz} (x,y,z)",
                spec.extent()
            )));
        }
    }
    let span = range.span();
    if !(span > 0.0) || !span.is_finite() {
        return Err(DetectError::OutOfRange(format!(
            "value range [{}, {}] is degenerate",
            range.min, range.max
        )));
    }

    let buffer = try_alloc_zeroed::<f32>(dx * dy * dz)?;
    let mut out =
        Array3::from_shape_vec((dz, dy, dx), buffer).expect("shape matches allocation");

    let sh = small.half();
    let lh = large.half();
    let margin = [sh[0].max(lh[0]), sh[1].max(lh[1]), sh[2].max(lh[2])];

    let probes = [
        BoxProbe::new(large, integral, 1.0 / (large.volume() as f32 * span)),
        BoxProbe::new(small, integral, -1.0 / (small.volume() as f32 * span)),
    ];
    sweep::run(&mut out, integral, margin, &probes, strategy);

    Ok(ResponseVolume::new(out, margin))
}
