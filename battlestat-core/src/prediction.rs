//! End-to-end estimate: energy, split, training, enhancers, rank bracket.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::boosters::{BoosterOutcome, apply_boosters};
use crate::energy::{EnergyEstimate, estimate_energy};
use crate::gym::StatLine;
use crate::model::ModelConfig;
use crate::rank::{RankCorrection, RankInputs, correct_for_rank};
use crate::split::{BudgetSplit, split_budget};
use crate::telemetry::TelemetrySnapshot;
use crate::training::{PhaseReport, TrainingSession, simulate};

/// Energy thresholds separating confidence levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfidenceModel {
    pub medium_above: f64,
    pub high_above: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Confidence implied by the estimated energy budget.
    #[must_use]
    pub fn from_energy(energy: f64, model: &ConfidenceModel) -> Self {
        if energy > model.high_above {
            Self::High
        } else if energy > model.medium_above {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PredictionOptions {
    /// Pull the estimate toward the bracket implied by the rank title.
    pub rank_correction: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub name: String,
    pub level: u32,
    pub rank: String,
    pub energy: EnergyEstimate,
    pub split: BudgetSplit,
    pub legacy_phase: Option<PhaseReport>,
    pub current_phase: Option<PhaseReport>,
    /// Stats straight out of the gym, before enhancers.
    pub trained: StatLine,
    pub final_gym: usize,
    pub boosters: BoosterOutcome,
    /// Stats after enhancers.
    pub stats: StatLine,
    pub total: f64,
    pub rank_correction: Option<RankCorrection>,
    pub final_estimate: f64,
    pub score: f64,
    pub confidence: Confidence,
    pub sessions: Vec<TrainingSession>,
}

impl Prediction {
    /// Energy converted into stats across both phases.
    #[must_use]
    pub fn energy_trained(&self) -> f64 {
        self.legacy_phase.map_or(0.0, |phase| phase.spent)
            + self.current_phase.map_or(0.0, |phase| phase.spent)
    }
}

/// Estimate the battle stats behind `snapshot`.
#[must_use]
pub fn predict(
    snapshot: &TelemetrySnapshot,
    model: &ModelConfig,
    options: PredictionOptions,
) -> Prediction {
    let energy = estimate_energy(snapshot, &model.energy, &model.crimes);
    let split = split_budget(
        energy.total,
        snapshot.age_days,
        snapshot.captured_at,
        model.training.formula_change,
    );
    let training = simulate(
        split.legacy,
        split.current,
        &model.gyms,
        &model.tracks,
        &model.training,
    );
    let boosters = apply_boosters(training.stats, snapshot.stat_enhancers, &model.boosters);
    let stats = boosters.stats;
    let total = stats.total();

    let rank_correction = options.rank_correction.then(|| {
        let inputs = RankInputs {
            rank: &snapshot.rank,
            level: snapshot.level,
            total_crimes: snapshot.total_crimes(),
            networth: snapshot.networth,
        };
        correct_for_rank(total, &inputs, &model.rank)
    });
    let final_estimate = rank_correction.map_or(total, |correction| correction.corrected);
    let confidence = Confidence::from_energy(energy.total, &model.confidence);

    log::info!(
        "{}: {:.0} energy -> {final_estimate:.0} total stats ({confidence})",
        display_name(snapshot),
        energy.total
    );

    Prediction {
        name: snapshot.name.clone(),
        level: snapshot.level,
        rank: snapshot.rank.clone(),
        energy,
        split,
        legacy_phase: training.legacy,
        current_phase: training.current,
        trained: training.stats,
        final_gym: training.final_gym,
        boosters,
        stats,
        total,
        rank_correction,
        final_estimate,
        score: 2.0 * final_estimate.sqrt(),
        confidence,
        sessions: training.sessions,
    }
}

fn display_name(snapshot: &TelemetrySnapshot) -> &str {
    if snapshot.name.is_empty() {
        "unnamed"
    } else {
        &snapshot.name
    }
}
