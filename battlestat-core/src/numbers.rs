//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Replace non-finite values with zero and clamp negatives to zero.
#[must_use]
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Replace non-finite values with zero, keeping the sign.
#[must_use]
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Round to a fixed number of decimal places, half away from zero.
#[must_use]
pub fn round_to_places(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = 10_f64.powi(places);
    (value * scale).round() / scale
}

/// Whole number of `cost`-sized units that fit in `amount`, saturating at `u64::MAX`.
#[must_use]
pub fn whole_units(amount: f64, cost: u32) -> u64 {
    if cost == 0 || amount.is_nan() || amount <= 0.0 {
        return 0;
    }
    let units = (amount / f64::from(cost)).floor();
    cast::<f64, u64>(units).unwrap_or(u64::MAX)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Truncate toward zero, returning 0 for non-finite values.
#[must_use]
pub fn truncate(value: f64) -> f64 {
    if value.is_finite() { value.trunc() } else { 0.0 }
}

/// Round a f64 and clamp it to the u64 range, returning 0 for NaN or negatives.
#[must_use]
pub fn round_f64_to_u64(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    cast::<f64, u64>(value.round()).unwrap_or(u64::MAX)
}
