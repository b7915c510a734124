//! Configured facade over the detection pipeline.
//!
//! Bundles scan-range, integral construction, difference-of-mean filtering
//! and the extrema scan behind one entry point. The free functions in
//! [`crate::volume_proc`] remain the primitive surface for callers that want
//! to retain the integral volume across several box-size choices; the facade
//! covers the common "one volume in, peaks out" case.

use std::time::Instant;

use crate::config::DetectorConfig;
use crate::error::DetectError;
use crate::volume_proc::{
    build_integral, compute_response, find_peaks, BoxSpec, Calibration, IntegralVolume, Peak,
    Polarity, ValueRange, VolumeBuffer,
};

/// Sensitivity constant of the original radius heuristic.
pub const DEFAULT_SENSITIVITY: f32 = 1.25;

/// Suggest an outer radius for a given inner radius.
///
/// Scales the inner radius by `k = 2^(1 / sensitivity)`, one scale-space
/// step at the given sensitivity, and enforces a minimum gap of one voxel.
/// Lower sensitivity widens the surround and makes the band-pass more
/// selective; [`DEFAULT_SENSITIVITY`] matches the interactive tuning the
/// radii were historically chosen with.
pub fn suggest_outer_radius(inner_radius: usize, sensitivity: f32) -> usize {
    let k = 2f32.powf(1.0 / sensitivity);
    let scaled = (inner_radius as f32 * k).round() as usize;
    scaled.max(inner_radius + 1)
}

/// Result of one facade run.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Peaks that survived the polarity filter.
    pub peaks: Vec<Peak>,
    /// Value range the response was normalized by.
    pub value_range: ValueRange,
    /// Calibration passed through from the source volume.
    pub calibration: Option<Calibration>,
}

/// Bead detector with a fixed configuration.
///
/// The pipeline is a strict forward pass; calling [`detect`](Self::detect)
/// again after a configuration change simply re-runs it wholesale.
#[derive(Debug, Clone)]
pub struct BeadDetector {
    config: DetectorConfig,
}

impl BeadDetector {
    /// Create a detector, validating the configuration.
    ///
    /// # Errors
    /// `OutOfRange` if the outer radius does not exceed the inner radius, the
    /// inner radius is 0, or the peak threshold is negative or non-finite.
    pub fn new(config: DetectorConfig) -> Result<Self, DetectError> {
        if config.inner_radius == 0 {
            return Err(DetectError::OutOfRange(
                "inner radius must be at least 1".to_string(),
            ));
        }
        if config.outer_radius <= config.inner_radius {
            return Err(DetectError::OutOfRange(format!(
                "outer radius {} must exceed inner radius {}",
                config.outer_radius, config.inner_radius
            )));
        }
        if !(config.min_peak_magnitude >= 0.0) || !config.min_peak_magnitude.is_finite() {
            return Err(DetectError::OutOfRange(format!(
                "peak threshold must be non-negative, got {}",
                config.min_peak_magnitude
            )));
        }
        Ok(Self { config })
    }

    /// The validated configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run the full pipeline on a volume.
    ///
    /// Scans the value range, builds the integral volume, computes the
    /// difference-of-mean response and collects the extrema the configuration
    /// asks for.
    pub fn detect(&self, volume: &VolumeBuffer) -> Result<Detection, DetectError> {
        let started = Instant::now();
        let range = volume.value_range()?;

        let build_started = Instant::now();
        let integral = build_integral(volume)?;
        let build_elapsed = build_started.elapsed();

        let detection = self.detect_from_integral(&integral, range, volume.calibration())?;

        let (dz, dy, dx) = volume.dim();
        log::debug!(
            "bead detection: volume={dx}x{dy}x{dz}, range=[{:.3}, {:.3}], \
             integral={:.1}ms, total={:.1}ms, peaks={}",
            range.min,
            range.max,
            build_elapsed.as_secs_f64() * 1000.0,
            started.elapsed().as_secs_f64() * 1000.0,
            detection.peaks.len()
        );
        Ok(detection)
    }

    /// Run the filter and extrema stages against a retained integral volume.
    ///
    /// Re-running with different radii only pays for these two stages; the
    /// integral volume depends solely on the source samples.
    pub fn detect_from_integral(
        &self,
        integral: &IntegralVolume,
        range: ValueRange,
        calibration: Option<Calibration>,
    ) -> Result<Detection, DetectError> {
        let small = BoxSpec::from_radius(self.config.inner_radius);
        let large = BoxSpec::from_radius(self.config.outer_radius);

        let filter_started = Instant::now();
        let response = compute_response(integral, small, large, range)?;
        let filter_elapsed = filter_started.elapsed();

        let scan_started = Instant::now();
        let peaks = find_peaks(&response, self.config.min_peak_magnitude)?;
        let scan_elapsed = scan_started.elapsed();

        let found = peaks.len();
        let peaks: Vec<Peak> = peaks
            .into_iter()
            .filter(|peak| match peak.polarity {
                Polarity::Max => self.config.keep_bright,
                Polarity::Min => self.config.keep_dark,
            })
            .collect();

        log::debug!(
            "response+scan: boxes={:?}/{:?}, filter={:.1}ms, scan={:.1}ms, \
             peaks={} kept of {found}",
            small.extent(),
            large.extent(),
            filter_elapsed.as_secs_f64() * 1000.0,
            scan_elapsed.as_secs_f64() * 1000.0,
            peaks.len()
        );

        Ok(Detection {
            peaks,
            value_range: range,
            calibration,
        })
    }
}
