//! Shared scanline engine for integral-volume box filters.
//!
//! The difference-of-mean response, the plain box mean, and any other filter
//! expressible as "a weighted sum of box means per voxel" are the same sweep
//! under different probe sets, so they share this one engine instead of each
//! carrying its own iteration code. A probe is one box plus a scale factor;
//! the engine walks the valid interior and writes, per voxel, the sum of
//! `box_sum * scale` over all probes.
//!
//! Per scanline, the engine computes each probe's 8 corner indices once and
//! then advances them by a single element per step in x, which keeps the
//! corner-offset arithmetic out of the innermost loop.

use ndarray::parallel::prelude::*;
use ndarray::Array3;
use rayon::prelude::*;

use crate::algo::parallel::{rows_per_chunk, workers};
use crate::volume_proc::box_filter::BoxSpec;
use crate::volume_proc::integral::IntegralVolume;

/// How a filter pass divides its output index space across workers.
///
/// Every strategy produces bit-identical output; they differ only in how the
/// disjoint per-worker partitions are shaped. The stage ends with a barrier
/// join in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkStrategy {
    /// Contiguous runs of whole scanlines, one chunk per worker. The default.
    #[default]
    LinearChunks,
    /// One z-plane at a time, planes striped across workers.
    PlaneStriped,
    /// Single-threaded scan, useful for comparison and debugging.
    Sequential,
}

/// One box filter term: a box geometry and the factor its sum is scaled by.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoxProbe {
    /// Distance (in integral elements) from a voxel's integral index back to
    /// the box's low corner.
    back: usize,
    /// The 8 corner offsets relative to the low corner, bit k of the index
    /// selecting the high face on axis k (bit 0 = x, 1 = y, 2 = z).
    offs: [usize; 8],
    /// Factor applied to the raw box sum, sign included.
    scale: f32,
}

impl BoxProbe {
    pub(crate) fn new(spec: BoxSpec, integral: &IntegralVolume, scale: f32) -> Self {
        let row = integral.row_stride();
        let plane = integral.plane_stride();
        let [hx, hy, hz] = spec.half();
        let [sx, sy, sz] = spec.extent();
        Self {
            back: hz * plane + hy * row + hx,
            offs: [
                0,
                sx,
                sy * row,
                sx + sy * row,
                sz * plane,
                sx + sz * plane,
                sy * row + sz * plane,
                sx + sy * row + sz * plane,
            ],
            scale,
        }
    }
}

/// Sweep the valid interior, writing per-voxel probe sums into `out`.
///
/// `out` must be zero-initialized with the source dimensions; margin voxels
/// are left untouched. `margin` is the `[x, y, z]` half-extent of the largest
/// probe box, which defines the valid interior.
pub(crate) fn run(
    out: &mut Array3<f32>,
    integral: &IntegralVolume,
    margin: [usize; 3],
    probes: &[BoxProbe],
    strategy: ChunkStrategy,
) {
    let (dz, dy, dx) = out.dim();
    let [hx, hy, hz] = margin;
    let geom = Geometry {
        dx,
        hx,
        row: integral.row_stride(),
        plane: integral.plane_stride(),
    };
    let data = integral.as_slice();

    match strategy {
        ChunkStrategy::LinearChunks => {
            let chunk_rows = rows_per_chunk(dz * dy, workers());
            out.as_slice_mut()
                .expect("response volume is contiguous")
                .par_chunks_mut(chunk_rows * dx)
                .enumerate()
                .for_each(|(chunk_index, chunk)| {
                    let first_row = chunk_index * chunk_rows;
                    for (i, row_out) in chunk.chunks_exact_mut(dx).enumerate() {
                        let r = first_row + i;
                        let (z, y) = (r / dy, r % dy);
                        if z >= hz && z < dz - hz && y >= hy && y < dy - hy {
                            fill_scanline(row_out, data, &geom, probes, y, z);
                        }
                    }
                });
        }
        ChunkStrategy::PlaneStriped => {
            out.outer_iter_mut()
                .into_par_iter()
                .enumerate()
                .for_each(|(z, mut plane)| {
                    if z < hz || z >= dz - hz {
                        return;
                    }
                    let plane = plane.as_slice_mut().expect("plane is contiguous");
                    for y in hy..dy - hy {
                        fill_scanline(&mut plane[y * dx..(y + 1) * dx], data, &geom, probes, y, z);
                    }
                });
        }
        ChunkStrategy::Sequential => {
            let flat = out.as_slice_mut().expect("response volume is contiguous");
            for z in hz..dz - hz {
                for y in hy..dy - hy {
                    let row_start = (z * dy + y) * dx;
                    fill_scanline(&mut flat[row_start..row_start + dx], data, &geom, probes, y, z);
                }
            }
        }
    }
}

struct Geometry {
    dx: usize,
    hx: usize,
    row: usize,
    plane: usize,
}

#[inline]
fn fill_scanline(
    row_out: &mut [f32],
    data: &[i64],
    geom: &Geometry,
    probes: &[BoxProbe],
    y: usize,
    z: usize,
) {
    // Integral index of the first interior voxel of this scanline; the
    // per-probe corner indices all derive from it by fixed offsets.
    let mut center = z * geom.plane + y * geom.row + geom.hx;
    for value in row_out[geom.hx..geom.dx - geom.hx].iter_mut() {
        let mut acc = 0.0f32;
        for probe in probes {
            let base = center - probe.back;
            let o = &probe.offs;
            let sum = data[base + o[7]] - data[base + o[6]] - data[base + o[5]]
                + data[base + o[4]]
                - data[base + o[3]]
                + data[base + o[2]]
                + data[base + o[1]]
                - data[base];
            acc += sum as f32 * probe.scale;
        }
        *value = acc;
        center += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume_proc::integral::{box_sum, build_integral};
    use crate::volume_proc::VolumeBuffer;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_probe_matches_box_sum() {
        let mut rng = StdRng::seed_from_u64(5);
        let (dx, dy, dz) = (9, 8, 7);
        let samples = (0..dx * dy * dz)
            .map(|_| rng.gen_range(0..100) as f32)
            .collect();
        let volume = VolumeBuffer::from_samples((dx, dy, dz), samples).unwrap();
        let integral = build_integral(&volume).unwrap();

        let spec = BoxSpec::new(3, 5, 3).unwrap();
        let probe = BoxProbe::new(spec, &integral, 1.0);
        let [hx, hy, hz] = spec.half();

        for (x, y, z) in [(3, 3, 2), (4, 2, 3), (5, 4, 4)] {
            let center = z * integral.plane_stride() + y * integral.row_stride() + x;
            let base = center - probe.back;
            let o = &probe.offs;
            let data = integral.as_slice();
            let via_probe = data[base + o[7]] - data[base + o[6]] - data[base + o[5]]
                + data[base + o[4]]
                - data[base + o[3]]
                + data[base + o[2]]
                + data[base + o[1]]
                - data[base];
            let via_query = box_sum(&integral, [x - hx, y - hy, z - hz], spec.extent());
            assert_eq!(via_probe, via_query, "probe at ({x},{y},{z})");
        }
    }
}
