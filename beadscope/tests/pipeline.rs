//! End-to-end pipeline tests: build integral -> difference-of-mean response
//! -> local extrema scan, plus the facade.

mod common;

use std::collections::HashMap;

use approx::assert_relative_eq;
use beadscope::{
    build_integral, compute_response, find_peaks, BeadDetector, BoxSpec, Calibration,
    DetectorConfig, Polarity, ValueRange,
};
use common::{make_bead_volume, make_random_volume, make_zero_volume, BeadParams};

#[test]
fn test_all_zero_volume_yields_no_peaks() {
    let _ = env_logger::builder().is_test(true).try_init();

    let volume = make_zero_volume((12, 11, 10));
    let integral = build_integral(&volume).unwrap();
    let response = compute_response(
        &integral,
        BoxSpec::cubic(3).unwrap(),
        BoxSpec::cubic(5).unwrap(),
        ValueRange::new(0.0, 1.0).unwrap(),
    )
    .unwrap();

    assert!(response.as_slice().iter().all(|&v| v == 0.0));

    for threshold in [1e-6, 1e-3, 0.5] {
        assert!(find_peaks(&response, threshold).unwrap().is_empty());
    }
}

#[test]
fn test_single_bright_voxel_closed_form() {
    // 9x9x9 zeros with one voxel at 100; small 3^3 and large 5^3 boxes give a
    // response at that voxel of (100/125 - 100/27) / 100.
    let mut samples = vec![0.0f32; 9 * 9 * 9];
    samples[(4 * 9 + 4) * 9 + 4] = 100.0;
    let volume = beadscope::VolumeBuffer::from_samples((9, 9, 9), samples).unwrap();

    let integral = build_integral(&volume).unwrap();
    let response = compute_response(
        &integral,
        BoxSpec::cubic(3).unwrap(),
        BoxSpec::cubic(5).unwrap(),
        ValueRange::new(0.0, 100.0).unwrap(),
    )
    .unwrap();

    let expected = (100.0 / 125.0 - 100.0 / 27.0) / 100.0;
    assert_relative_eq!(response.value(4, 4, 4), expected, max_relative = 1e-6);

    // Threshold below |response|: the bright voxel is reported exactly once,
    // as a maximum (brighter than its surround).
    let peaks = find_peaks(&response, 0.02).unwrap();
    let at_spike: Vec<_> = peaks
        .iter()
        .filter(|p| p.position == [4, 4, 4])
        .collect();
    assert_eq!(at_spike.len(), 1);
    assert_eq!(at_spike[0].polarity, Polarity::Max);
    assert_relative_eq!(at_spike[0].magnitude, expected.abs(), max_relative = 1e-6);

    // Threshold above |response|: nothing anywhere.
    assert!(find_peaks(&response, 0.05).unwrap().is_empty());
}

#[test]
fn test_no_voxel_reported_with_both_polarities() {
    let volume = make_random_volume((14, 13, 12), 17);
    let integral = build_integral(&volume).unwrap();
    let response = compute_response(
        &integral,
        BoxSpec::cubic(3).unwrap(),
        BoxSpec::cubic(5).unwrap(),
        ValueRange::new(0.0, 255.0).unwrap(),
    )
    .unwrap();

    let peaks = find_peaks(&response, 1e-6).unwrap();
    let mut seen: HashMap<[usize; 3], Polarity> = HashMap::new();
    for peak in &peaks {
        if let Some(previous) = seen.insert(peak.position, peak.polarity) {
            panic!(
                "voxel {:?} reported as both {:?} and {:?}",
                peak.position, previous, peak.polarity
            );
        }
    }
}

#[test]
fn test_results_independent_of_worker_count() {
    let volume = make_random_volume((20, 17, 13), 41);
    let small = BoxSpec::cubic(3).unwrap();
    let large = BoxSpec::new(5, 5, 3).unwrap();
    let range = ValueRange::new(0.0, 255.0).unwrap();

    let run = |threads: usize| {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap();
        pool.install(|| {
            let integral = build_integral(&volume).unwrap();
            let response = compute_response(&integral, small, large, range).unwrap();
            let peaks = find_peaks(&response, 1e-5).unwrap();
            (integral, response, peaks)
        })
    };

    let (integral_1, response_1, peaks_1) = run(1);
    let (integral_n, response_n, peaks_n) = run(7);

    // Bit-identical volumes regardless of worker count.
    assert_eq!(integral_1.view(), integral_n.view());
    assert_eq!(response_1.as_slice(), response_n.as_slice());

    // Peak content is worker-count independent; compare order-insensitively
    // since only the ordering is allowed to vary.
    let key = |p: &beadscope::Peak| (p.position, p.is_max());
    let mut sorted_1: Vec<_> = peaks_1.iter().map(key).collect();
    let mut sorted_n: Vec<_> = peaks_n.iter().map(key).collect();
    sorted_1.sort();
    sorted_n.sort();
    assert_eq!(sorted_1, sorted_n);
}

#[test]
fn test_detector_finds_synthetic_beads() {
    let _ = env_logger::builder().is_test(true).try_init();

    let beads = [
        BeadParams {
            center: [6.0, 6.0, 6.0],
            amplitude: 1000.0,
            sigma: 1.2,
        },
        BeadParams {
            center: [16.0, 14.0, 12.0],
            amplitude: 800.0,
            sigma: 1.2,
        },
    ];
    let volume = make_bead_volume((24, 22, 20), &beads)
        .with_calibration(Calibration {
            x: 0.5,
            y: 0.5,
            z: 2.0,
        });

    let detector = BeadDetector::new(DetectorConfig {
        inner_radius: 1,
        outer_radius: 3,
        min_peak_magnitude: 1e-3,
        keep_bright: true,
        keep_dark: false,
    })
    .unwrap();

    let detection = detector.detect(&volume).unwrap();
    assert!(!detection.peaks.is_empty());

    for bead in &beads {
        let hit = detection.peaks.iter().find(|p| {
            p.position
                .iter()
                .zip(bead.center.iter())
                .all(|(&v, &c)| (v as f64 - c).abs() <= 1.0)
        });
        let hit = hit.unwrap_or_else(|| panic!("no peak near bead at {:?}", bead.center));
        assert_eq!(hit.polarity, Polarity::Max);
    }

    // Calibration rides through untouched and converts peak coordinates.
    let calibration = detection.calibration.unwrap();
    let peak = &detection.peaks[0];
    let physical = peak.physical_position(&calibration);
    assert_relative_eq!(physical[0], peak.position[0] as f64 * 0.5);
    assert_relative_eq!(physical[2], peak.position[2] as f64 * 2.0);
}

#[test]
fn test_retained_integral_matches_full_run() {
    let beads = [BeadParams {
        center: [8.0, 9.0, 7.0],
        amplitude: 500.0,
        sigma: 1.5,
    }];
    let volume = make_bead_volume((18, 18, 16), &beads);

    let config = DetectorConfig {
        inner_radius: 1,
        outer_radius: 2,
        min_peak_magnitude: 1e-3,
        keep_bright: true,
        keep_dark: true,
    };
    let detector = BeadDetector::new(config).unwrap();

    let full = detector.detect(&volume).unwrap();

    // Retain the integral volume and rerun only the filter and scan stages.
    let range = volume.value_range().unwrap();
    let integral = build_integral(&volume).unwrap();
    let rerun = detector
        .detect_from_integral(&integral, range, volume.calibration())
        .unwrap();

    assert_eq!(full.peaks, rerun.peaks);
    assert_eq!(full.value_range, rerun.value_range);
}
