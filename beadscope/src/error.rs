use thiserror::Error;

/// Errors produced by the bead detection pipeline.
///
/// Every variant is fatal to the current invocation; nothing is retried
/// internally. Inputs are read-only at every stage, so a failed stage leaves
/// no visible side effect and the caller may retry with corrected parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectError {
    /// Volume or box geometry is unusable: a zero dimension, a sample-count
    /// mismatch, or an even box extent.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Requested operation exceeds the volume: a box larger than the volume,
    /// a negative threshold, or a degenerate value range.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Buffer allocation was refused by the allocator.
    #[error("failed to allocate {bytes} bytes")]
    Allocation {
        /// Size of the refused request.
        bytes: usize,
    },

    /// A NaN sample was encountered while scanning the value range.
    #[error("non-finite sample at linear index {index}")]
    NonFiniteSample {
        /// Linear (row-major) index of the first offending sample.
        index: usize,
    },
}
