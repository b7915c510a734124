use serde::{Deserialize, Serialize};

/// Configuration for the bead detection facade.
///
/// Radii are in voxels: the inner box is tuned to the blob core and the outer
/// box to its surround, each with edge length `2 * radius + 1`. The peak
/// threshold applies to the normalized response magnitude, so it lives in
/// `[0, 1]`-ish territory regardless of the source value range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Radius of the inner (small) box in voxels.
    pub inner_radius: usize,
    /// Radius of the outer (large) box in voxels; must exceed `inner_radius`.
    pub outer_radius: usize,
    /// Minimum absolute normalized response for a peak candidate.
    pub min_peak_magnitude: f32,
    /// Keep peaks brighter than their surround.
    pub keep_bright: bool,
    /// Keep peaks darker than their surround.
    pub keep_dark: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            inner_radius: 1,
            outer_radius: 3,
            min_peak_magnitude: 1e-4,
            keep_bright: true,
            keep_dark: false,
        }
    }
}
