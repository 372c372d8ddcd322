//! Lifetime energy reconstruction from account telemetry.
//!
//! The estimate has three parts. Natural regeneration is the daily
//! regeneration rate (which rises with donator share) times an estimate of
//! the days the account was actually playing. Item energy credits refills,
//! drinks and boosters. Expended energy debits attacks, revives and dump
//! searches, which burn energy without training.
//!
//! Active days are the largest of three independent lower bounds (time
//! online, substance use, crimes committed), capped by a ceiling derived
//! from account age and time since the last action.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{LOG_ENERGY, SECONDS_PER_DAY};
use crate::numbers::{finite_or_zero, i64_to_f64, non_negative, u64_to_f64};
use crate::split::date_timestamp;
use crate::telemetry::{Substance, TelemetrySnapshot};

/// Regeneration and credit/debit coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EnergyModel {
    /// First day of the game; lifetime cannot predate it.
    pub game_launch: NaiveDate,
    pub base_daily_regen: f64,
    /// Extra daily regeneration at a 100% donator share.
    pub donator_daily_bonus: f64,
    /// Numerator of the crime floor (`numerator / daily regen`).
    pub crime_floor_numerator: f64,
    /// Fraction of a calendar day counted as playable.
    pub online_share: f64,
    pub min_active_days: f64,
    pub activity_time_weight: f64,
    pub travel_time_weight: f64,
    /// Normalizes energy-equivalents into days.
    pub minutes_per_day: f64,
    pub substances: BTreeMap<Substance, f64>,
    pub items: ItemCredits,
    pub expenses: Expenses,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ItemCredits {
    pub energy_refill: f64,
    pub xanax: f64,
    pub lsd: f64,
    pub energy_drink: f64,
    pub booster: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Expenses {
    pub attack: f64,
    pub revive: f64,
    pub dump_find: f64,
}

/// Crime categories and how raw record counters feed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CrimeModel {
    pub nerve_scale: f64,
    /// Largest factor applied to lift a crime estimate toward the floor.
    pub correction_cap: f64,
    pub categories: Vec<CrimeCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CrimeCategory {
    pub id: String,
    pub nerve: f64,
    pub success_rate: f64,
    /// Sources under the original crime taxonomy.
    #[serde(default)]
    pub legacy: Vec<CrimeSource>,
    /// Sources under the newer crime taxonomy.
    #[serde(default)]
    pub alternate: Vec<CrimeSource>,
}

/// A share of one criminal record counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CrimeSource {
    pub count: String,
    #[serde(default = "default_share")]
    pub share: f64,
}

const fn default_share() -> f64 {
    1.0
}

impl CrimeCategory {
    /// Attempts attributed to this category for the given taxonomy.
    #[must_use]
    pub fn attempts(&self, snapshot: &TelemetrySnapshot) -> f64 {
        let sources = if snapshot.alternate_crimes {
            &self.alternate
        } else {
            &self.legacy
        };
        sources
            .iter()
            .map(|source| source.share * u64_to_f64(snapshot.crime(&source.count)))
            .sum()
    }
}

/// The three lower-bound estimates of active days.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityEstimators {
    pub time: f64,
    pub substances: f64,
    /// Crime estimate after the floor correction.
    pub crimes: f64,
    pub crimes_raw: f64,
}

impl ActivityEstimators {
    #[must_use]
    pub fn strongest(&self) -> f64 {
        self.time.max(self.substances).max(self.crimes)
    }
}

/// Total trainable energy and the pieces it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyEstimate {
    pub total: f64,
    pub natural: f64,
    pub items: f64,
    pub expended: f64,
    pub activity_ratio: f64,
    pub daily_regen: f64,
    pub crime_floor: f64,
    pub active_days_ceiling: f64,
    pub active_days: f64,
    pub estimators: ActivityEstimators,
}

/// Days the account has existed, bounded by the age of the game.
fn lifetime_days(snapshot: &TelemetrySnapshot, model: &EnergyModel) -> f64 {
    let launch = date_timestamp(model.game_launch);
    let game_days = i64_to_f64(snapshot.captured_at.saturating_sub(launch).max(0)) / SECONDS_PER_DAY;
    f64::from(snapshot.age_days).min(game_days)
}

/// Donator days over lifetime, clamped to `[0, 1]`; zero lifetime yields 0.
#[must_use]
pub fn activity_ratio(snapshot: &TelemetrySnapshot, model: &EnergyModel) -> f64 {
    let lifetime = lifetime_days(snapshot, model);
    if lifetime <= 0.0 {
        return 0.0;
    }
    (u64_to_f64(snapshot.donator_days) / lifetime).clamp(0.0, 1.0)
}

fn time_estimator(snapshot: &TelemetrySnapshot, model: &EnergyModel) -> f64 {
    model.activity_time_weight * (u64_to_f64(snapshot.activity_time) / SECONDS_PER_DAY)
        + model.travel_time_weight * (u64_to_f64(snapshot.travel_time) / SECONDS_PER_DAY)
}

/// Energy-equivalent of all substances taken, in the estimator's day units.
fn substance_estimator(snapshot: &TelemetrySnapshot, model: &EnergyModel) -> f64 {
    let energy: f64 = Substance::ALL
        .iter()
        .map(|substance| {
            let cost = model.substances.get(substance).copied().unwrap_or(0.0);
            cost * u64_to_f64(snapshot.substance(*substance))
        })
        .sum();
    energy / model.minutes_per_day
}

/// Raw crime estimator before the floor correction.
#[must_use]
pub fn crime_estimator(snapshot: &TelemetrySnapshot, crimes: &CrimeModel, model: &EnergyModel) -> f64 {
    let weighted: f64 = crimes
        .categories
        .iter()
        .map(|category| category.nerve * (category.attempts(snapshot) / category.success_rate))
        .sum();
    crimes.nerve_scale * weighted / model.minutes_per_day
}

/// Lift a crime estimate that undershoots `floor` by at most `cap` times.
#[must_use]
pub fn correct_crime_estimate(raw: f64, floor: f64, cap: f64) -> f64 {
    if raw >= floor {
        return raw;
    }
    let factor = if raw > 0.0 { (floor / raw).min(cap) } else { cap };
    raw * factor
}

/// Reconstruct the trainable energy budget of an account.
#[must_use]
pub fn estimate_energy(
    snapshot: &TelemetrySnapshot,
    model: &EnergyModel,
    crimes: &CrimeModel,
) -> EnergyEstimate {
    let activity_ratio = activity_ratio(snapshot, model);
    let daily_regen = model.base_daily_regen + model.donator_daily_bonus * activity_ratio;
    let crime_floor = finite_or_zero(model.crime_floor_numerator / daily_regen);

    let offline_days = i64_to_f64(snapshot.seconds_offline()) / SECONDS_PER_DAY;
    let active_days_ceiling = (model.online_share * (f64::from(snapshot.age_days) - offline_days))
        .max(model.min_active_days);

    let crimes_raw = non_negative(crime_estimator(snapshot, crimes, model));
    let estimators = ActivityEstimators {
        time: non_negative(time_estimator(snapshot, model)),
        substances: non_negative(substance_estimator(snapshot, model)),
        crimes: correct_crime_estimate(crimes_raw, crime_floor, crimes.correction_cap),
        crimes_raw,
    };
    let active_days = active_days_ceiling.min(estimators.strongest());

    let natural = daily_regen * active_days;
    let credits = &model.items;
    let items = credits.energy_refill * u64_to_f64(snapshot.energy_refills)
        + credits.xanax * u64_to_f64(snapshot.substance(Substance::Xanax))
        + credits.lsd * u64_to_f64(snapshot.substance(Substance::Lsd))
        + credits.energy_drink * u64_to_f64(snapshot.energy_drinks)
        + credits.booster * u64_to_f64(snapshot.boosters);
    let costs = &model.expenses;
    let expended = costs.attack * u64_to_f64(snapshot.attacks())
        + costs.revive * u64_to_f64(snapshot.revives)
        + costs.dump_find * u64_to_f64(snapshot.dump_finds);
    let total = non_negative(natural + items - expended);

    log::debug!(
        target: LOG_ENERGY,
        "ratio {activity_ratio:.3} regen {daily_regen:.1} active days {active_days:.1} \
         (time {:.1}, substances {:.1}, crimes {:.1}); natural {natural:.0} items {items:.0} \
         expended {expended:.0} -> {total:.0}",
        estimators.time,
        estimators.substances,
        estimators.crimes,
    );

    EnergyEstimate {
        total,
        natural,
        items,
        expended,
        activity_ratio,
        daily_regen,
        crime_floor,
        active_days_ceiling,
        active_days,
        estimators,
    }
}
