//! Shared synthetic volume builders for the integration tests.

use beadscope::VolumeBuffer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A synthetic bead: center (`[x, y, z]` voxels), peak amplitude, sigma.
pub struct BeadParams {
    pub center: [f64; 3],
    pub amplitude: f64,
    pub sigma: f64,
}

/// Volume of zeros with Gaussian beads stamped in.
pub fn make_bead_volume(dim: (usize, usize, usize), beads: &[BeadParams]) -> VolumeBuffer {
    let (dx, dy, dz) = dim;
    let mut samples = vec![0.0f32; dx * dy * dz];

    for bead in beads {
        for z in 0..dz {
            for y in 0..dy {
                for x in 0..dx {
                    let d2 = (x as f64 - bead.center[0]).powi(2)
                        + (y as f64 - bead.center[1]).powi(2)
                        + (z as f64 - bead.center[2]).powi(2);
                    let value = bead.amplitude * (-d2 / (2.0 * bead.sigma * bead.sigma)).exp();
                    samples[(z * dy + y) * dx + x] += value as f32;
                }
            }
        }
    }

    VolumeBuffer::from_samples(dim, samples).unwrap()
}

/// Uniform random volume with integer-valued samples in `0..256`.
pub fn make_random_volume(dim: (usize, usize, usize), seed: u64) -> VolumeBuffer {
    let (dx, dy, dz) = dim;
    let mut rng = StdRng::seed_from_u64(seed);
    let samples = (0..dx * dy * dz)
        .map(|_| rng.gen_range(0..256) as f32)
        .collect();
    VolumeBuffer::from_samples(dim, samples).unwrap()
}

/// All-zero volume.
pub fn make_zero_volume(dim: (usize, usize, usize)) -> VolumeBuffer {
    let (dx, dy, dz) = dim;
    VolumeBuffer::from_samples(dim, vec![0.0; dx * dy * dz]).unwrap()
}
