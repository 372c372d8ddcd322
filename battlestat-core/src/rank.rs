//! Rank bracket correction.
//!
//! A player's rank title is earned from several sources, battle stats among
//! them. Subtracting the steps explained by level, crimes and net worth
//! leaves a bracket the battle stats should fall in; an estimate outside
//! that bracket is pulled halfway toward it.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::LOG_RANK;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RankModel {
    /// Rank title to its position in the rank ladder.
    pub ranks: BTreeMap<String, i32>,
    /// Position assumed for an unknown title.
    pub default_tier: i32,
    pub level_thresholds: Vec<u32>,
    pub crime_thresholds: Vec<u64>,
    pub networth_thresholds: Vec<f64>,
    pub lower_bounds: Vec<f64>,
    pub upper_bounds: Vec<f64>,
}

/// Account facts the bracket depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankInputs<'a> {
    pub rank: &'a str,
    pub level: u32,
    pub total_crimes: u64,
    pub networth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankCorrection {
    pub tier: i32,
    pub lower: f64,
    /// `None` for the open-ended top bracket.
    pub upper: Option<f64>,
    pub original: f64,
    pub corrected: f64,
}

impl RankCorrection {
    #[must_use]
    pub fn adjusted(&self) -> bool {
        self.corrected.to_bits() != self.original.to_bits()
    }
}

fn reached<T: PartialOrd>(value: &T, thresholds: &[T]) -> i32 {
    let count = thresholds.iter().filter(|threshold| value >= *threshold).count();
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Bracket tier left once level, crimes and net worth are accounted for.
#[must_use]
pub fn bracket_tier(inputs: &RankInputs<'_>, model: &RankModel) -> i32 {
    let base = model
        .ranks
        .get(inputs.rank)
        .copied()
        .unwrap_or(model.default_tier);
    base.saturating_sub(1)
        .saturating_sub(reached(&inputs.level, &model.level_thresholds))
        .saturating_sub(reached(&inputs.total_crimes, &model.crime_thresholds))
        .saturating_sub(reached(&inputs.networth, &model.networth_thresholds))
}

/// Stat bounds `[lower, upper]` for a bracket tier.
#[must_use]
pub fn bracket_bounds(tier: i32, model: &RankModel) -> (f64, Option<f64>) {
    let Ok(index) = usize::try_from(tier) else {
        return (0.0, model.upper_bounds.first().copied());
    };
    if index == 0 {
        return (0.0, model.upper_bounds.first().copied());
    }
    if index >= model.lower_bounds.len() {
        return (model.lower_bounds.last().copied().unwrap_or(0.0), None);
    }
    (
        model.lower_bounds[index - 1],
        model.upper_bounds.get(index).copied(),
    )
}

/// Pull `total` halfway toward the bracket implied by the account's rank.
#[must_use]
pub fn correct_for_rank(total: f64, inputs: &RankInputs<'_>, model: &RankModel) -> RankCorrection {
    let tier = bracket_tier(inputs, model);
    let (lower, upper) = bracket_bounds(tier, model);
    let corrected = match upper {
        _ if total < lower => (total + lower) / 2.0,
        Some(upper) if total > upper => (total + upper) / 2.0,
        _ => total,
    };
    log::debug!(
        target: LOG_RANK,
        "rank '{}' -> tier {tier}, bracket [{lower:.0}, {}], {total:.0} -> {corrected:.0}",
        inputs.rank,
        upper.map_or_else(|| "open".to_string(), |value| format!("{value:.0}")),
    );
    RankCorrection {
        tier,
        lower,
        upper,
        original: total,
        corrected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelConfig;

    fn model() -> &'static RankModel {
        &ModelConfig::bundled().rank
    }

    fn inputs(rank: &str, level: u32, crimes: u64, networth: f64) -> RankInputs<'_> {
        RankInputs {
            rank,
            level,
            total_crimes: crimes,
            networth,
        }
    }

    #[test]
    fn tier_subtracts_each_threshold_reached() {
        // Average = 7, minus 1, level 26 passes 4 thresholds, 5000 crimes pass 2, 60m passes 2
        let tier = bracket_tier(&inputs("Average", 26, 5_000, 60_000_000.0), model());
        assert_eq!(tier, 7 - 1 - 4 - 2 - 2);
    }

    #[test]
    fn unknown_rank_uses_default() {
        let known = bracket_tier(&inputs("Average", 1, 0, 0.0), model());
        let unknown = bracket_tier(&inputs("Mystery", 1, 0, 0.0), model());
        assert_eq!(known, unknown);
        assert_eq!(unknown, 6);
    }

    #[test]
    fn bounds_cover_both_extremes() {
        assert_eq!(bracket_bounds(-3, model()), (0.0, Some(2_500.0)));
        assert_eq!(bracket_bounds(0, model()), (0.0, Some(2_500.0)));
        assert_eq!(bracket_bounds(1, model()), (2_000.0, Some(25_000.0)));
        assert_eq!(bracket_bounds(5, model()), (20_000_000.0, Some(250_000_000.0)));
        assert_eq!(bracket_bounds(6, model()), (200_000_000.0, None));
        assert_eq!(bracket_bounds(40, model()), (200_000_000.0, None));
    }

    #[test]
    fn totals_inside_bracket_pass_through() {
        // Rookie = 4 -> tier 3 -> [200k, 2.5m]
        let result = correct_for_rank(1_000_000.0, &inputs("Rookie", 1, 0, 0.0), model());
        assert_eq!(result.tier, 3);
        assert!(!result.adjusted());
        assert!((result.corrected - 1_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn totals_below_bracket_move_up_halfway() {
        let result = correct_for_rank(100_000.0, &inputs("Rookie", 1, 0, 0.0), model());
        assert!(result.adjusted());
        assert!((result.corrected - 150_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn totals_above_bracket_move_down_halfway() {
        let result = correct_for_rank(3_500_000.0, &inputs("Rookie", 1, 0, 0.0), model());
        assert!((result.corrected - 3_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn open_top_bracket_never_pulls_down() {
        let result = correct_for_rank(9.0e12, &inputs("Invincible", 1, 0, 0.0), model());
        assert_eq!(result.upper, None);
        assert!(!result.adjusted());
    }
}
