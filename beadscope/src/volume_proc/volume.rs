//! Source and result containers for the detection pipeline.
//!
//! Volumes are dense C-order `ndarray` arrays indexed `[z, y, x]` with x the
//! fastest-varying axis. Peak positions and physical calibration use `[x, y,
//! z]` order, matching how downstream registration consumes coordinates; the
//! docs on each accessor say which convention applies.

use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

use crate::algo::min_max::{min_max, MinMaxError};
use crate::error::DetectError;
use crate::volume_proc::dom::ValueRange;

/// Physical voxel size, pass-through only.
///
/// The detection algorithms are calibration-agnostic; the calibration rides
/// along so that final peak coordinates can be converted to physical units
/// downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Voxel extent along x in physical units.
    pub x: f64,
    /// Voxel extent along y in physical units.
    pub y: f64,
    /// Voxel extent along z in physical units.
    pub z: f64,
}

impl Calibration {
    /// Isotropic calibration with the same voxel extent on every axis.
    pub fn isotropic(extent: f64) -> Self {
        Self {
            x: extent,
            y: extent,
            z: extent,
        }
    }

    /// Convert a voxel position (`[x, y, z]`) to physical units.
    pub fn to_physical(&self, position: [usize; 3]) -> [f64; 3] {
        [
            position[0] as f64 * self.x,
            position[1] as f64 * self.y,
            position[2] as f64 * self.z,
        ]
    }
}

/// Dense 3D scalar sample storage with fixed dimensions.
///
/// Owned by the caller and immutable for the duration of one detection run.
/// Samples are `f32`; the integral builder rounds them into a wide integer
/// accumulator, so callers working with normalized `[0, 1]` data should scale
/// into a range where rounding keeps the contrast they care about (the
/// original acquisition range is the usual choice).
#[derive(Debug, Clone)]
pub struct VolumeBuffer {
    samples: Array3<f32>,
    calibration: Option<Calibration>,
}

impl VolumeBuffer {
    /// Wrap an existing `(z, y, x)` array as a volume.
    ///
    /// # Errors
    /// `InvalidDimensions` if any axis is 0.
    pub fn from_array(samples: Array3<f32>) -> Result<Self, DetectError> {
        let (dz, dy, dx) = samples.dim();
        if dx == 0 || dy == 0 || dz == 0 {
            return Err(DetectError::InvalidDimensions(format!(
                "volume dimensions must be positive, got {dx}x{dy}x{dz} (x,y,z)"
            )));
        }
        Ok(Self {
            samples,
            calibration: None,
        })
    }

    /// Build a volume from a row-major sample vector (x fastest).
    ///
    /// # Arguments
    /// * `dim` - `(x, y, z)` extents
    /// * `samples` - `x * y * z` samples, x fastest, then y, then z
    ///
    /// # Errors
    /// `InvalidDimensions` if any extent is 0 or the sample count does not
    /// match the extents.
    pub fn from_samples(
        dim: (usize, usize, usize),
        samples: Vec<f32>,
    ) -> Result<Self, DetectError> {
        let (dx, dy, dz) = dim;
        let expected = dx
            .checked_mul(dy)
            .and_then(|n| n.checked_mul(dz))
            .unwrap_or(usize::MAX);
        if samples.len() != expected {
            return Err(DetectError::InvalidDimensions(format!(
                "expected {expected} samples for a {dx}x{dy}x{dz} volume, got {}",
                samples.len()
            )));
        }
        let array = Array3::from_shape_vec((dz, dy, dx), samples)
            .map_err(|e| DetectError::InvalidDimensions(e.to_string()))?;
        Self::from_array(array)
    }

    /// Attach a physical calibration for downstream coordinate conversion.
    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = Some(calibration);
        self
    }

    /// Array dimensions in `(z, y, x)` order.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.samples.dim()
    }

    /// Read access to the sample array, indexed `[z, y, x]`.
    pub fn samples(&self) -> ArrayView3<f32> {
        self.samples.view()
    }

    /// The calibration attached to this volume, if any.
    pub fn calibration(&self) -> Option<Calibration> {
        self.calibration
    }

    /// Scan the sample range used to normalize the response.
    ///
    /// # Errors
    /// `NonFiniteSample` if a NaN is present, `OutOfRange` if the volume is
    /// constant (the response normalization would divide by zero).
    pub fn value_range(&self) -> Result<ValueRange, DetectError> {
        let flat = self
            .samples
            .as_slice()
            .expect("volume samples are contiguous");
        let (min, max) = min_max(flat).map_err(|e| match e {
            MinMaxError::NanEncountered(index) => DetectError::NonFiniteSample { index },
            MinMaxError::NoData => {
                DetectError::InvalidDimensions("volume holds no samples".to_string())
            }
        })?;
        ValueRange::new(min, max)
    }
}

/// Response (or smoothed) volume produced by a box filter stage.
///
/// Same logical extent as the source volume. Only the valid interior (the
/// source extent shrunk by the filter's half-extent margin on each axis) is
/// computed; margin voxels are 0, meaning "unknown", and are never peak
/// candidates.
#[derive(Debug, Clone)]
pub struct ResponseVolume {
    data: Array3<f32>,
    margin: [usize; 3],
}

impl ResponseVolume {
    pub(crate) fn new(data: Array3<f32>, margin: [usize; 3]) -> Self {
        Self { data, margin }
    }

    /// Array dimensions in `(z, y, x)` order.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Margin excluded on each axis, `[x, y, z]` order.
    pub fn margin(&self) -> [usize; 3] {
        self.margin
    }

    /// Response at a voxel position given as `x, y, z`.
    pub fn value(&self, x: usize, y: usize, z: usize) -> f32 {
        self.data[[z, y, x]]
    }

    /// Read access to the response array, indexed `[z, y, x]`.
    pub fn view(&self) -> ArrayView3<f32> {
        self.data.view()
    }

    /// Flat row-major access (x fastest).
    pub fn as_slice(&self) -> &[f32] {
        self.data
            .as_slice()
            .expect("response volume is contiguous")
    }

    /// Consume the container and take the underlying array.
    pub fn into_inner(self) -> Array3<f32> {
        self.data
    }
}
