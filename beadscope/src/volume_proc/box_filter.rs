//! Box geometry and plain box-mean smoothing.

use serde::{Deserialize, Serialize};

use crate::error::DetectError;
use crate::volume_proc::integral::IntegralVolume;
use crate::volume_proc::sweep::{self, BoxProbe, ChunkStrategy};
use crate::volume_proc::volume::ResponseVolume;
use crate::volume_proc::try_alloc_zeroed;
use ndarray::Array3;

/// Axis-aligned box with odd extents, addressed by its center voxel.
///
/// Odd extents make the half-extent `(s - 1) / 2` exact, so a box centered on
/// a voxel covers the same number of neighbors on both sides of every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxSpec {
    sx: usize,
    sy: usize,
    sz: usize,
}

impl BoxSpec {
    /// Create a box with the given `x, y, z` extents.
    ///
    /// # Errors
    /// `InvalidDimensions` if any extent is even or zero.
    pub fn new(sx: usize, sy: usize, sz: usize) -> Result<Self, DetectError> {
        for s in [sx, sy, sz] {
            if s == 0 || s % 2 == 0 {
                return Err(DetectError::InvalidDimensions(format!(
                    "box extents must be odd and positive, got {sx}x{sy}x{sz}"
                )));
            }
        }
        Ok(Self { sx, sy, sz })
    }

    /// Cube with the given edge length.
    pub fn cubic(s: usize) -> Result<Self, DetectError> {
        Self::new(s, s, s)
    }

    /// Cube covering `radius` voxels on each side of the center
    /// (edge length `2 * radius + 1`, always odd).
    pub fn from_radius(radius: usize) -> Self {
        let s = 2 * radius + 1;
        Self {
            sx: s,
            sy: s,
            sz: s,
        }
    }

    /// Edge lengths in `[x, y, z]` order.
    pub fn extent(&self) -> [usize; 3] {
        [self.sx, self.sy, self.sz]
    }

    /// Half-extents `(s - 1) / 2` in `[x, y, z]` order.
    pub fn half(&self) -> [usize; 3] {
        [self.sx / 2, self.sy / 2, self.sz / 2]
    }

    /// Number of voxels the box covers.
    pub fn volume(&self) -> usize {
        self.sx * self.sy * self.sz
    }

    /// Whether the box fits a source volume of the given `(z, y, x)` extent.
    pub(crate) fn fits_in(&self, source_dim: (usize, usize, usize)) -> bool {
        let (dz, dy, dx) = source_dim;
        self.sx <= dx && self.sy <= dy && self.sz <= dz
    }
}

/// What to write into the margin a box filter cannot compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarginFill {
    /// Leave margins at 0 ("unknown"). The default.
    #[default]
    Zero,
    /// Mirror the computed interior across the valid-interior boundary.
    /// Margins filled this way are estimates for smoothing consumers that
    /// blend them away; they are still not peak-candidate material.
    Mirror,
}

/// Box-mean smoothing over the integral volume.
///
/// Writes, for every voxel of the valid interior, the mean of the box
/// centered there, in source-sample units. Cost is O(N) regardless of box
/// size.
///
/// # Arguments
/// * `integral` - Integral volume of the source
/// * `spec` - Box geometry
/// * `fill` - Margin handling
///
/// # Errors
/// `OutOfRange` if the box is larger than the source volume, `Allocation` if
/// the output buffer cannot be allocated.
pub fn box_mean(
    integral: &IntegralVolume,
    spec: BoxSpec,
    fill: MarginFill,
) -> Result<ResponseVolume, DetectError> {
    let source_dim = integral.source_dim();
    if !spec.fits_in(source_dim) {
        let (dz, dy, dx) = source_dim;
        return Err(DetectError::OutOfRange(format!(
            "box {:?} exceeds volume {dx}x{dy}x{dz} (x,y,z)",
            spec.extent()
        )));
    }

    let (dz, dy, dx) = source_dim;
    let buffer = try_alloc_zeroed::<f32>(dx * dy * dz)?;
    let mut out =
        Array3::from_shape_vec((dz, dy, dx), buffer).expect("shape matches allocation");

    let margin = spec.half();
    let probe = BoxProbe::new(spec, integral, 1.0 / spec.volume() as f32);
    sweep::run(&mut out, integral, margin, &[probe], ChunkStrategy::default());

    if fill == MarginFill::Mirror {
        mirror_fill(&mut out, margin);
    }

    Ok(ResponseVolume::new(out, margin))
}

/// Fill margin voxels with their mirror image across the valid-interior
/// boundary. O(surface), single-threaded.
fn mirror_fill(data: &mut Array3<f32>, margin: [usize; 3]) {
    let (dz, dy, dx) = data.dim();
    let [hx, hy, hz] = margin;
    let (x1, y1, z1) = (dx - hx - 1, dy - hy - 1, dz - hz - 1);

    let reflect = |i: usize, lo: usize, hi: usize| {
        if i < lo {
            2 * lo - i
        } else if i > hi {
            2 * hi - i
        } else {
            i
        }
    };

    for z in 0..dz {
        let mz = reflect(z, hz, z1);
        for y in 0..dy {
            let my = reflect(y, hy, y1);
            for x in 0..dx {
                if z < hz || z > z1 || y < hy || y > y1 || x < hx || x > x1 {
                    let mx = reflect(x, hx, x1);
                    data[[z, y, x]] = data[[mz, my, mx]];
                }
            }
        }
    }
}
