//! BEADSCOPE - integral-volume bead detection for multi-view microscopy.
//!
//! Locates candidate feature points (diffraction-limited beads, nuclei) in
//! dense 3D volumes ahead of multi-view registration. The pipeline is three
//! stages run as a strict forward pass:
//!
//! 1. [`build_integral`]: fold the volume into a zero-padded cumulative-sum
//!    ("integral") volume with three ordered parallel sweeps,
//! 2. [`compute_response`]: evaluate a normalized difference-of-mean
//!    contrast response in O(1) per voxel against the integral volume,
//! 3. [`find_peaks`]: scan the response's 26-neighborhoods for local
//!    extrema.
//!
//! [`BeadDetector`] bundles the stages behind a configuration for the common
//! case; the free functions stay available for callers that retain the
//! integral volume across several box-size choices. Every stage parallelizes
//! by handing workers disjoint output partitions and joining at a barrier, so
//! results are independent of the worker count.
//!
//! Sub-voxel refinement, scale pyramids, visualization and I/O are all
//! downstream concerns: this crate consumes a dense voxel buffer and produces
//! a peak list.

pub mod algo;
pub mod config;
pub mod detector;
pub mod error;
pub mod volume_proc;

pub use config::DetectorConfig;
pub use detector::{suggest_outer_radius, BeadDetector, Detection, DEFAULT_SENSITIVITY};
pub use error::DetectError;
pub use volume_proc::{
    box_mean, box_sum, build_integral, compute_response, compute_response_with, find_peaks,
    BoxSpec, Calibration, ChunkStrategy, IntegralVolume, MarginFill, Peak, Polarity,
    ResponseVolume, ValueRange, VolumeBuffer,
};
