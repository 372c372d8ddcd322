//! Partition of the energy budget around the training formula change.
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::constants::{SECONDS_PER_DAY, SECONDS_PER_DAY_I64};
use crate::numbers::{i64_to_f64, non_negative, truncate};

/// Unix timestamp of midnight UTC on `date`.
#[must_use]
pub fn date_timestamp(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Energy assigned to each formula era. `legacy + current` equals the input budget.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BudgetSplit {
    pub legacy: f64,
    pub current: f64,
    /// Share of the account lifetime spent before the change.
    pub legacy_share: f64,
}

impl BudgetSplit {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.legacy + self.current
    }
}

/// Split `total` by the fraction of the account's life that predates `change`.
///
/// Accounts created on or after the change train entirely under the current
/// formula. Otherwise the legacy share is truncated to a whole number and the
/// current share takes the exact remainder.
#[must_use]
pub fn split_budget(total: f64, age_days: u32, captured_at: i64, change: NaiveDate) -> BudgetSplit {
    let total = non_negative(total);
    let change_at = date_timestamp(change);
    let created_at =
        captured_at.saturating_sub(i64::from(age_days).saturating_mul(SECONDS_PER_DAY_I64));
    if age_days == 0 || created_at >= change_at {
        return BudgetSplit {
            legacy: 0.0,
            current: total,
            legacy_share: 0.0,
        };
    }

    let days_before = i64_to_f64(change_at.saturating_sub(created_at)) / SECONDS_PER_DAY;
    let legacy_share = (days_before / f64::from(age_days)).clamp(0.0, 1.0);
    let legacy = truncate(total * legacy_share).clamp(0.0, total);
    BudgetSplit {
        legacy,
        current: total - legacy,
        legacy_share,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 8, 2).unwrap()
    }

    fn days_after_change(days: i64) -> i64 {
        date_timestamp(change()) + days * SECONDS_PER_DAY_I64
    }

    #[test]
    fn timestamp_is_midnight_utc() {
        assert_eq!(date_timestamp(change()), 1_659_398_400);
    }

    #[test]
    fn young_account_trains_only_current() {
        let split = split_budget(12_345.5, 30, days_after_change(100), change());
        assert!(split.legacy.abs() < f64::EPSILON);
        assert_eq!(split.current.to_bits(), 12_345.5_f64.to_bits());
    }

    #[test]
    fn account_created_on_change_day_is_current() {
        let split = split_budget(1_000.0, 100, days_after_change(100), change());
        assert!(split.legacy.abs() < f64::EPSILON);
        assert!((split.current - 1_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_age_is_current() {
        let split = split_budget(500.0, 0, days_after_change(-10), change());
        assert!(split.legacy.abs() < f64::EPSILON);
        assert!((split.current - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn old_account_splits_by_lifetime_share() {
        // 300 days before the change, 100 after
        let split = split_budget(10_001.7, 400, days_after_change(100), change());
        assert!((split.legacy_share - 0.75).abs() < 1e-12);
        assert!((split.legacy - 7_501.0).abs() < f64::EPSILON);
        assert!((split.current - 2_500.7).abs() < 1e-9);
        assert_eq!(split.total().to_bits(), 10_001.7_f64.to_bits());
    }

    #[test]
    fn partition_is_exact_across_budgets() {
        for (index, total) in [0.0, 1.0, 3.3, 99_999.99, 1.234_567_89e9, 7.7e13]
            .into_iter()
            .enumerate()
        {
            let age = 200 + u32::try_from(index).unwrap() * 137;
            let split = split_budget(total, age, days_after_change(50), change());
            assert_eq!(split.legacy + split.current, total, "lost energy for {total}");
            assert!(split.legacy >= 0.0 && split.current >= 0.0);
            assert_eq!(split.legacy.fract(), 0.0);
        }
    }

    #[test]
    fn extreme_capture_instant_saturates() {
        let split = split_budget(2_500.0, 10, i64::MIN + 1_000, change());
        assert!((split.legacy - 2_500.0).abs() < f64::EPSILON);
        assert!(split.current.abs() < f64::EPSILON);
        assert!((split.legacy_share - 1.0).abs() < f64::EPSILON);

        let split = split_budget(2_500.0, u32::MAX, i64::MAX, change());
        assert_eq!(split.total().to_bits(), 2_500.0_f64.to_bits());
    }

    #[test]
    fn snapshot_before_change_is_all_legacy() {
        let split = split_budget(4_000.0, 50, days_after_change(-60), change());
        assert!((split.legacy - 4_000.0).abs() < f64::EPSILON);
        assert!(split.current.abs() < f64::EPSILON);
    }
}
