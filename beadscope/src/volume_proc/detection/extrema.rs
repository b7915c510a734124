//! 26-neighborhood local extrema scan over the response volume.

use rayon::prelude::*;

use crate::error::DetectError;
use crate::volume_proc::detection::peak::{Peak, Polarity};
use crate::volume_proc::volume::ResponseVolume;

/// Scan the response volume for local extrema candidates.
///
/// Every voxel outside a 1-voxel border is compared against its 26 immediate
/// neighbors (the border is excluded because the full neighborhood must
/// exist; margin voxels are 0 and fall to the threshold test anyway). A voxel
/// whose absolute response is below `min_abs_value` is rejected before any
/// neighborhood work.
///
/// A voxel is a candidate iff it is an extremum of its neighborhood:
/// every neighbor `>=` the center makes it a response minimum, reported as
/// [`Polarity::Max`] (a bright blob), and every neighbor `<=` the center a
/// response maximum, reported as [`Polarity::Min`]. The bright test runs
/// first, so a voxel whose whole neighborhood is flat resolves to `Max` and
/// no voxel is ever reported with both polarities.
///
/// Ties do not disqualify: a flat plateau may register several adjacent
/// peaks. That is intentional; deduplication belongs downstream.
///
/// Workers scan disjoint stripes of planes and accumulate private peak
/// lists, concatenated in stripe order at the end, so the returned content
/// (and order) is independent of the worker count.
///
/// # Arguments
/// * `response` - Response volume from the difference-of-mean filter
/// * `min_abs_value` - Minimum absolute response for a candidate
///
/// # Errors
/// `OutOfRange` if the threshold is negative or NaN.
pub fn find_peaks(
    response: &ResponseVolume,
    min_abs_value: f32,
) -> Result<Vec<Peak>, DetectError> {
    if !(min_abs_value >= 0.0) {
        return Err(DetectError::OutOfRange(format!(
            "peak threshold must be non-negative, got {min_abs_value}"
        )));
    }

    let (dz, dy, dx) = response.dim();
    if dx < 3 || dy < 3 || dz < 3 {
        // No voxel has a complete neighborhood.
        return Ok(Vec::new());
    }

    let data = response.as_slice();

    // Neighborhood offsets in the flat row-major layout.
    let mut offsets = [0isize; 26];
    let mut n = 0;
    for oz in -1i64..=1 {
        for oy in -1i64..=1 {
            for ox in -1i64..=1 {
                if (ox, oy, oz) == (0, 0, 0) {
                    continue;
                }
                offsets[n] = (oz * (dy as i64 * dx as i64) + oy * dx as i64 + ox) as isize;
                n += 1;
            }
        }
    }

    let stripes: Vec<Vec<Peak>> = (1..dz - 1)
        .into_par_iter()
        .map(|z| scan_plane(data, (dz, dy, dx), z, &offsets, min_abs_value))
        .collect();

    Ok(stripes.into_iter().flatten().collect())
}

fn scan_plane(
    data: &[f32],
    dim: (usize, usize, usize),
    z: usize,
    offsets: &[isize; 26],
    min_abs_value: f32,
) -> Vec<Peak> {
    let (_, dy, dx) = dim;
    let mut peaks = Vec::new();

    for y in 1..dy - 1 {
        let row = (z * dy + y) * dx;
        for x in 1..dx - 1 {
            let index = row + x;
            let center = data[index];

            if center.abs() < min_abs_value {
                continue;
            }

            let mut all_ge = true; // every neighbor >= center
            let mut all_le = true; // every neighbor <= center
            for &offset in offsets {
                let neighbor = data[(index as isize + offset) as usize];
                all_ge &= neighbor >= center;
                all_le &= neighbor <= center;
                if !all_ge && !all_le {
                    break;
                }
            }

            let polarity = if all_ge {
                Polarity::Max
            } else if all_le {
                Polarity::Min
            } else {
                continue;
            };

            peaks.push(Peak {
                position: [x, y, z],
                magnitude: center.abs(),
                polarity,
            });
        }
    }

    peaks
}
