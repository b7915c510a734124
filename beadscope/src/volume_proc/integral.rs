//! Integral volume construction and box-sum queries.
//!
//! The integral volume is the 3D analogue of a summed-area table: cell
//! `[z, y, x]` holds the sum of every source sample with coordinates strictly
//! below `(x, y, z)`. It is one cell larger than the source on every axis and
//! index 0 along any axis is a permanent zero plane. That zero padding is what
//! keeps the 8-corner box-sum query branch-free: no corner of an in-bounds box
//! ever needs a boundary special case.
//!
//! Source samples are rounded into an `i64` accumulator before summation so
//! that box sums stay exact over arbitrarily large boxes; `f32` accumulation
//! would shed low bits long before the volume sizes this pipeline targets.

use ndarray::parallel::prelude::*;
use ndarray::{s, Array3, ArrayView3, Axis};

use crate::error::DetectError;
use crate::volume_proc::{try_alloc_zeroed, VolumeBuffer};

/// Zero-padded cumulative-sum volume, built once and read-only thereafter.
#[derive(Debug, Clone)]
pub struct IntegralVolume {
    data: Array3<i64>,
}

impl IntegralVolume {
    /// Integral dimensions in `(z, y, x)` order; each axis is one larger than
    /// the source.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Dimensions of the source volume this integral was built from,
    /// `(z, y, x)` order.
    pub fn source_dim(&self) -> (usize, usize, usize) {
        let (iz, iy, ix) = self.data.dim();
        (iz - 1, iy - 1, ix - 1)
    }

    /// Read access to the cumulative sums, indexed `[z, y, x]`.
    pub fn view(&self) -> ArrayView3<i64> {
        self.data.view()
    }

    pub(crate) fn as_slice(&self) -> &[i64] {
        self.data
            .as_slice()
            .expect("integral volume is contiguous")
    }

    /// Elements per integral row (x extent).
    pub(crate) fn row_stride(&self) -> usize {
        self.data.dim().2
    }

    /// Elements per integral plane (x extent times y extent).
    pub(crate) fn plane_stride(&self) -> usize {
        let (_, iy, ix) = self.data.dim();
        iy * ix
    }
}

/// Build the integral volume with three ordered 1D sweeps.
///
/// Each sweep is a running sum along one axis (x, then y, then z) and each is
/// parallelized by giving every worker a disjoint set of lines orthogonal to
/// the sweep axis. Every output cell is written by exactly one worker in each
/// pass, so the result is bit-identical regardless of worker count. The
/// sweeps are strictly sequential because each consumes the previous sweep's
/// output.
///
/// # Errors
/// `Allocation` if the padded buffer cannot be allocated.
pub fn build_integral(volume: &VolumeBuffer) -> Result<IntegralVolume, DetectError> {
    let (dz, dy, dx) = volume.dim();
    let len = (dx + 1)
        .checked_mul(dy + 1)
        .and_then(|n| n.checked_mul(dz + 1))
        .ok_or(DetectError::Allocation { bytes: usize::MAX })?;

    let buffer = try_alloc_zeroed::<i64>(len)?;
    let mut data = Array3::from_shape_vec((dz + 1, dy + 1, dx + 1), buffer)
        .expect("shape matches allocation");

    let samples = volume.samples();

    // Sweep x: running sum of rounded samples along each source row. Writing
    // only from index 1 on every axis keeps the zero planes intact.
    data.slice_mut(s![1.., 1.., ..])
        .outer_iter_mut()
        .into_par_iter()
        .zip(samples.outer_iter().into_par_iter())
        .for_each(|(mut out_plane, src_plane)| {
            for y in 0..dy {
                let mut acc = 0i64;
                for x in 0..dx {
                    acc += src_plane[[y, x]].round() as i64;
                    out_plane[[y, x + 1]] = acc;
                }
            }
        });

    // Sweep y: per z-plane, accumulate each row into the next.
    data.slice_mut(s![1.., .., ..])
        .outer_iter_mut()
        .into_par_iter()
        .for_each(|mut plane| {
            for y in 2..=dy {
                let (prev, mut cur) = plane.multi_slice_mut((s![y - 1, ..], s![y, ..]));
                cur += &prev;
            }
        });

    // Sweep z: per (z, x) slab at fixed y, accumulate each plane row into the
    // next. The y = 0 slab is all zeros and the loop leaves it untouched.
    data.axis_iter_mut(Axis(1))
        .into_par_iter()
        .for_each(|mut slab| {
            for z in 2..=dz {
                let (prev, mut cur) = slab.multi_slice_mut((s![z - 1, ..], s![z, ..]));
                cur += &prev;
            }
        });

    Ok(IntegralVolume { data })
}

/// Sum of the source samples inside an axis-aligned box, in O(1).
///
/// Inclusion–exclusion over the box's 8 corners with alternating signs.
/// `corner` is the box's low corner in source coordinates (`[x, y, z]`) and
/// `extent` its edge lengths; the box covers `corner[a] .. corner[a] +
/// extent[a]` on each axis.
///
/// Bounds are the caller's responsibility (checked once per filter pass, not
/// per query) so the query itself stays branch-free; debug builds assert.
pub fn box_sum(integral: &IntegralVolume, corner: [usize; 3], extent: [usize; 3]) -> i64 {
    let (sz, sy, sx) = (extent[2], extent[1], extent[0]);
    let (dz, dy, dx) = integral.source_dim();
    debug_assert!(
        corner[0] + sx <= dx && corner[1] + sy <= dy && corner[2] + sz <= dz,
        "box {extent:?} at {corner:?} exceeds source dimensions {dx}x{dy}x{dz} (x,y,z)"
    );

    let row = integral.row_stride();
    let plane = integral.plane_stride();
    let base = corner[2] * plane + corner[1] * row + corner[0];
    let data = integral.as_slice();

    data[base + sz * plane + sy * row + sx]
        - data[base + sy * row + sx]
        - data[base + sz * plane + sx]
        - data[base + sz * plane + sy * row]
        + data[base + sx]
        + data[base + sy * row]
        + data[base + sz * plane]
        - data[base]
}
