//! Stat enhancer redistribution applied after training.
use serde::{Deserialize, Serialize};

use crate::constants::LOG_BOOSTERS;
use crate::gym::{StatLine, StatTrack};
use crate::numbers::{non_negative, u64_to_f64};

/// Growth model for stat enhancers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BoosterModel {
    /// Share of the total left untouched by enhancers.
    pub retained_share: f64,
    pub curves: Vec<BoosterCurve>,
    /// Ceiling on any single track after growth.
    pub per_track_cap: f64,
    /// Tighter ceiling on the last track in priority order.
    pub last_track_cap: f64,
}

/// One enhanced share of the total: `share * (1 + efficiency * (base^(exponent * n) - 1))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BoosterCurve {
    pub share: f64,
    pub efficiency: f64,
    pub base: f64,
    pub exponent: f64,
}

impl BoosterCurve {
    fn factor(&self, enhancers: f64) -> f64 {
        self.share * (1.0 + self.efficiency * (self.base.powf(self.exponent * enhancers) - 1.0))
    }
}

/// Priority in which growth is handed out.
pub const PRIORITY: [StatTrack; 4] = StatTrack::ALL;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoosterOutcome {
    pub stats: StatLine,
    pub enhancers: u64,
    /// Growth implied by the enhancer count.
    pub growth: f64,
    /// Growth actually added to the tracks.
    pub applied: f64,
    /// Growth left over once every track hit its ceiling.
    pub discarded: f64,
}

/// Total after enhancers, before it is split across tracks.
#[must_use]
pub fn enhanced_total(total: f64, enhancers: u64, model: &BoosterModel) -> f64 {
    let count = u64_to_f64(enhancers);
    let enhanced: f64 = model
        .curves
        .iter()
        .map(|curve| curve.factor(count))
        .sum::<f64>()
        + model.retained_share;
    total * enhanced
}

/// Hand enhancer growth to strength, speed, dexterity, then defense.
///
/// Zero enhancers leave the stats untouched. Each track grows up to
/// `per_track_cap`; defense, last in line, stops at `last_track_cap`.
/// Whatever cannot be placed is discarded.
#[must_use]
pub fn apply_boosters(stats: StatLine, enhancers: u64, model: &BoosterModel) -> BoosterOutcome {
    if enhancers == 0 {
        return BoosterOutcome {
            stats,
            ..BoosterOutcome::default()
        };
    }

    let original = stats.total();
    let growth = non_negative(enhanced_total(original, enhancers, model) - original);
    let mut boosted = stats;
    let mut remaining = growth;
    let last = PRIORITY.len() - 1;
    for (position, track) in PRIORITY.into_iter().enumerate() {
        if remaining <= 0.0 {
            break;
        }
        let ceiling = if position == last {
            model.last_track_cap.min(model.per_track_cap)
        } else {
            model.per_track_cap
        };
        let room = non_negative(ceiling - boosted[track]);
        let given = remaining.min(room);
        boosted[track] += given;
        remaining -= given;
    }

    let discarded = non_negative(remaining);
    if discarded > 0.0 {
        log::debug!(target: LOG_BOOSTERS, "discarding {discarded:.0} enhancer growth past caps");
    }
    BoosterOutcome {
        stats: boosted,
        enhancers,
        growth,
        applied: growth - discarded,
        discarded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelConfig;

    fn model() -> &'static BoosterModel {
        &ModelConfig::bundled().boosters
    }

    #[test]
    fn zero_enhancers_pass_through_bit_identical() {
        let stats = StatLine::new(1.1, 2.2, 3.3, 4.4);
        let outcome = apply_boosters(stats, 0, model());
        assert_eq!(outcome.stats.strength.to_bits(), stats.strength.to_bits());
        assert_eq!(outcome.stats.speed.to_bits(), stats.speed.to_bits());
        assert_eq!(outcome.stats.dexterity.to_bits(), stats.dexterity.to_bits());
        assert_eq!(outcome.stats.defense.to_bits(), stats.defense.to_bits());
        assert!(outcome.growth.abs() < f64::EPSILON);
    }

    #[test]
    fn enhanced_total_matches_blend() {
        let total = 1_000_000.0;
        let n = 100.0_f64;
        let expected = 0.5 * total
            + 0.25 * total * (1.0 + 0.85 * (1.01_f64.powf(0.8 * n) - 1.0))
            + 0.25 * total * (1.0 + 0.85 * (1.01_f64.powf(0.2 * n) - 1.0));
        assert!((enhanced_total(total, 100, model()) - expected).abs() < 1e-6);
    }

    #[test]
    fn growth_goes_to_strength_first() {
        let stats = StatLine::new(100.0, 100.0, 100.0, 100.0);
        let outcome = apply_boosters(stats, 50, model());
        assert!(outcome.growth > 0.0);
        assert!((outcome.stats.strength - (100.0 + outcome.growth)).abs() < 1e-9);
        assert!((outcome.stats.speed - 100.0).abs() < f64::EPSILON);
        assert!(outcome.discarded.abs() < f64::EPSILON);
    }

    #[test]
    fn caps_spill_growth_down_the_priority_list() {
        let capped = BoosterModel {
            per_track_cap: 150.0,
            last_track_cap: 120.0,
            ..model().clone()
        };
        let stats = StatLine::new(100.0, 100.0, 100.0, 100.0);
        // growth is roughly 375, well past the 170 of room
        let outcome = apply_boosters(stats, 200, &capped);
        assert!((outcome.stats.strength - 150.0).abs() < 1e-9);
        assert!((outcome.stats.speed - 150.0).abs() < 1e-9);
        assert!((outcome.stats.dexterity - 150.0).abs() < 1e-9);
        assert!((outcome.stats.defense - 120.0).abs() < 1e-9);
        assert!((outcome.applied - 170.0).abs() < 1e-9);
        assert!((outcome.discarded - (outcome.growth - 170.0)).abs() < 1e-9);
    }

    #[test]
    fn last_track_never_exceeds_its_ceiling() {
        let config = model();
        let huge = config.per_track_cap;
        let stats = StatLine::new(huge, huge, huge, 1.0);
        let outcome = apply_boosters(stats, 1_000, config);
        assert!(outcome.growth > 0.0);
        assert!(outcome.stats.defense <= config.last_track_cap);
        assert!(outcome.applied >= 0.0);
        assert!(outcome.discarded >= 0.0);
    }

    #[test]
    fn empty_stats_have_no_growth() {
        let outcome = apply_boosters(StatLine::default(), 25, model());
        assert!(outcome.growth.abs() < f64::EPSILON);
        assert_eq!(outcome.stats, StatLine::default());
    }
}
