//! Detect beads in a synthetic volume and print the result.
//!
//! Run with `RUST_LOG=debug` to see the per-stage timing logs.

use beadscope::{BeadDetector, Calibration, DetectorConfig, VolumeBuffer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    env_logger::init();

    let (dx, dy, dz) = (96, 96, 48);
    let mut rng = StdRng::seed_from_u64(42);

    // Scatter beads over a noisy background.
    let bead_count = 25;
    let beads: Vec<[f64; 3]> = (0..bead_count)
        .map(|_| {
            [
                rng.gen_range(8.0..dx as f64 - 8.0),
                rng.gen_range(8.0..dy as f64 - 8.0),
                rng.gen_range(6.0..dz as f64 - 6.0),
            ]
        })
        .collect();

    let mut samples = vec![0.0f32; dx * dy * dz];
    for value in samples.iter_mut() {
        *value = rng.gen_range(0.0..50.0);
    }
    let sigma: f64 = 1.4;
    for center in &beads {
        for z in 0..dz {
            for y in 0..dy {
                for x in 0..dx {
                    let d2 = (x as f64 - center[0]).powi(2)
                        + (y as f64 - center[1]).powi(2)
                        + (z as f64 - center[2]).powi(2);
                    if d2 < (5.0 * sigma).powi(2) {
                        samples[(z * dy + y) * dx + x] +=
                            (1500.0 * (-d2 / (2.0 * sigma * sigma)).exp()) as f32;
                    }
                }
            }
        }
    }

    let volume = VolumeBuffer::from_samples((dx, dy, dz), samples)
        .expect("synthetic volume is well-formed")
        .with_calibration(Calibration {
            x: 0.323,
            y: 0.323,
            z: 1.5,
        });

    let detector = BeadDetector::new(DetectorConfig {
        inner_radius: 1,
        outer_radius: 3,
        min_peak_magnitude: 0.005,
        keep_bright: true,
        keep_dark: false,
    })
    .expect("valid configuration");

    let detection = detector.detect(&volume).expect("detection succeeds");

    println!(
        "{} beads planted, {} peaks found (range [{:.1}, {:.1}])",
        bead_count,
        detection.peaks.len(),
        detection.value_range.min,
        detection.value_range.max
    );

    let calibration = detection.calibration.expect("calibration attached");
    let mut peaks = detection.peaks.clone();
    peaks.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    for peak in peaks.iter().take(10) {
        let [px, py, pz] = peak.physical_position(&calibration);
        println!(
            "  voxel ({:3}, {:3}, {:2})  physical ({:7.2}, {:7.2}, {:6.2}) um  |response| {:.4}",
            peak.position[0], peak.position[1], peak.position[2], px, py, pz, peak.magnitude
        );
    }
}
