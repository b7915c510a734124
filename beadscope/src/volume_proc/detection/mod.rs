//! Peak types and the local extrema scan.

pub mod extrema;
pub mod peak;

pub use extrema::find_peaks;
pub use peak::{Peak, Polarity};
