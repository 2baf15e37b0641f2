//! The three per-session QoE metrics.
//!
//! Everything here is pure: callers hand in rows already read from disk and
//! receive a value (or `None` when the file produces no result).

pub mod rebuffer;
pub mod switching;
pub mod utility;

pub use switching::compute_switching_rate;
pub use utility::{ClassRanges, mean_utility};

/// Round to `places` decimals, exact ties to even.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round_ties_even() / scale
}
