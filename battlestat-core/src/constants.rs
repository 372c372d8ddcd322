//! Fixed units and structural constants for the estimation engine.
//!
//! Tunable coefficients live in the bundled model table
//! (`assets/data/model.json`); only values that define units or the shape
//! of the computation are kept here.

// Time units ---------------------------------------------------------------
pub(crate) const SECONDS_PER_DAY: f64 = 86_400.0;
pub(crate) const SECONDS_PER_DAY_I64: i64 = 86_400;

// Training shape -----------------------------------------------------------
/// Number of stat tracks trained round-robin.
pub const TRACK_COUNT: usize = 4;
/// Decimal places kept by the happiness multiplier.
pub(crate) const MULTIPLIER_PLACES: i32 = 4;

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_ENERGY: &str = "battlestat::energy";
pub(crate) const LOG_TRAINING: &str = "battlestat::training";
pub(crate) const LOG_BOOSTERS: &str = "battlestat::boosters";
pub(crate) const LOG_RANK: &str = "battlestat::rank";

#[cfg(test)]
pub(crate) const FLOAT_EPSILON: f64 = 1e-9;
