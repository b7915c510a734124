//! Min/max scanning for floating point sample buffers.
//!
//! The detection pipeline normalizes its response by the value range of the
//! source volume, so the range scan has to be trustworthy: a NaN anywhere in
//! the buffer would silently poison every comparison downstream. The scan
//! therefore reports the first NaN it sees as an error instead of letting it
//! propagate.

use num_traits::Float;

/// Outcome of a min/max scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinMaxError {
    /// NaN value encountered at the given linear index.
    NanEncountered(usize),
    /// No data provided (empty slice).
    NoData,
}

/// Scan a slice for its minimum and maximum values.
///
/// Infinities are ordinary values and participate in the comparison; NaN is
/// rejected with the index of its first occurrence.
///
/// # Arguments
/// * `data` - Sample buffer to scan
///
/// # Returns
/// `(min, max)` on success, `MinMaxError` on an empty or NaN-carrying buffer.
///
/// # Example
/// ```
/// use beadscope::algo::min_max::min_max;
///
/// let (lo, hi) = min_max(&[3.0f32, 1.0, 4.0, 1.5]).unwrap();
/// assert_eq!(lo, 1.0);
/// assert_eq!(hi, 4.0);
/// ```
pub fn min_max<T: Float>(data: &[T]) -> Result<(T, T), MinMaxError> {
    let mut bounds: Option<(T, T)> = None;

    for (index, &value) in data.iter().enumerate() {
        if value.is_nan() {
            return Err(MinMaxError::NanEncountered(index));
        }

        bounds = match bounds {
            None => Some((value, value)),
            Some((lo, hi)) => Some((
                if value < lo { value } else { lo },
                if value > hi { value } else { hi },
            )),
        };
    }

    bounds.ok_or(MinMaxError::NoData)
}
