//! Train-by-train gym simulation.
//!
//! A [`TrainingState`] carries the gym cursor, the energy left at the
//! current gym, the round-robin pointer and the four stat totals. The same
//! state is threaded through the legacy phase and then the current phase,
//! so gym progress and rotation continue across the formula change.
use serde::{Deserialize, Serialize};

use crate::constants::{LOG_TRAINING, TRACK_COUNT};
use crate::gym::{
    FormulaVariant, GymTier, StatLine, StatTrack, TrackTable, TrainingModel, happy_loss,
    training_gain,
};
use crate::numbers::{non_negative, u64_to_f64, whole_units};

/// Summary of one uninterrupted batch of trains at a single gym.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSession {
    pub phase: FormulaVariant,
    /// Zero-based gym index.
    pub gym: usize,
    pub trains: u64,
    pub energy_used: f64,
    pub happy_spent: f64,
    pub gain: f64,
    pub gains: StatLine,
}

/// Energy accounting of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseReport {
    pub budget: f64,
    pub spent: f64,
    pub remaining: f64,
    pub trains: u64,
}

/// Why a phase stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseHalt {
    /// Not enough energy left for another train.
    BudgetExhausted,
    /// The last gym cannot take another train.
    GymsExhausted,
}

/// Simulator state shared by consecutive phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    pub gym: usize,
    /// Energy the current gym still accepts; `None` when unbounded.
    pub gym_capacity_left: Option<f64>,
    /// Round-robin position of the next track to train.
    pub pointer: usize,
    pub stats: StatLine,
    pub sessions: Vec<TrainingSession>,
}

impl TrainingState {
    /// Fresh state at the first gym with all stats at zero.
    #[must_use]
    pub fn new(gyms: &[GymTier]) -> Self {
        Self::with_stats(gyms, StatLine::default())
    }

    /// Fresh state at the first gym with the given starting stats.
    #[must_use]
    pub fn with_stats(gyms: &[GymTier], stats: StatLine) -> Self {
        Self {
            gym: 0,
            gym_capacity_left: gyms.first().and_then(capacity_of),
            pointer: 0,
            stats,
            sessions: Vec::new(),
        }
    }

    #[must_use]
    pub const fn next_track(&self) -> StatTrack {
        StatTrack::from_position(self.pointer)
    }

    /// Move to the next gym; `false` when already at the last one.
    fn advance_gym(&mut self, gyms: &[GymTier]) -> bool {
        let next = self.gym + 1;
        let Some(tier) = gyms.get(next) else {
            return false;
        };
        self.gym = next;
        self.gym_capacity_left = capacity_of(tier);
        true
    }

    fn trains_allowed(&self, remaining: f64, tier: &GymTier, batch_limit: u32) -> u64 {
        let cost = tier.energy_per_train;
        let by_energy = whole_units(remaining, cost);
        let by_capacity = self
            .gym_capacity_left
            .map_or(u64::MAX, |left| whole_units(left, cost));
        by_energy.min(by_capacity).min(u64::from(batch_limit))
    }
}

fn capacity_of(tier: &GymTier) -> Option<f64> {
    tier.capacity.map(u64_to_f64)
}

/// Spend `budget` training under `variant`, continuing from `state`.
///
/// Each train advances the track under the round-robin pointer and then
/// rotates the pointer. A gym is left once it cannot take a whole train and
/// is never revisited. The phase stops when the remaining energy cannot pay
/// for one train or no gym is left.
pub fn run_phase(
    state: &mut TrainingState,
    budget: f64,
    variant: FormulaVariant,
    gyms: &[GymTier],
    tracks: &TrackTable,
    model: &TrainingModel,
) -> (PhaseReport, PhaseHalt) {
    let budget = non_negative(budget);
    let mut remaining = budget;
    let mut trains_total = 0_u64;

    let halt = loop {
        let Some(tier) = gyms.get(state.gym) else {
            break PhaseHalt::GymsExhausted;
        };
        let cost = f64::from(tier.energy_per_train);
        let trains = state.trains_allowed(remaining, tier, model.batch_limit);
        if trains == 0 {
            if remaining < cost {
                break PhaseHalt::BudgetExhausted;
            }
            if state.advance_gym(gyms) {
                log::trace!(target: LOG_TRAINING, "advancing to gym {}", state.gym + 1);
                continue;
            }
            break PhaseHalt::GymsExhausted;
        }

        let mut gains = StatLine::default();
        for _ in 0..trains {
            let track = state.next_track();
            let gain = training_gain(variant, state.stats[track], tier, tracks.get(track), model);
            state.stats[track] += gain;
            gains[track] += gain;
            remaining -= cost;
            if let Some(left) = state.gym_capacity_left.as_mut() {
                *left -= cost;
            }
            state.pointer = (state.pointer + 1) % TRACK_COUNT;
        }

        trains_total += trains;
        let trains_f = u64_to_f64(trains);
        let session = TrainingSession {
            phase: variant,
            gym: state.gym,
            trains,
            energy_used: trains_f * cost,
            happy_spent: trains_f * happy_loss(tier.energy_per_train, model),
            gain: gains.total(),
            gains,
        };
        log::trace!(
            target: LOG_TRAINING,
            "{variant} session at gym {}: {} trains, +{:.0}",
            session.gym + 1,
            session.trains,
            session.gain
        );
        state.sessions.push(session);
    };

    let report = PhaseReport {
        budget,
        spent: budget - remaining,
        remaining,
        trains: trains_total,
    };
    log::debug!(
        target: LOG_TRAINING,
        "{variant} phase spent {:.0}/{:.0} energy over {} trains, stopped: {halt:?}",
        report.spent,
        report.budget,
        report.trains
    );
    (report, halt)
}

/// Both phases of a training history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub stats: StatLine,
    pub legacy: Option<PhaseReport>,
    pub current: Option<PhaseReport>,
    pub final_gym: usize,
    pub sessions: Vec<TrainingSession>,
}

impl TrainingOutcome {
    /// Energy actually converted into stats across both phases.
    #[must_use]
    pub fn energy_spent(&self) -> f64 {
        self.legacy.map_or(0.0, |phase| phase.spent) + self.current.map_or(0.0, |phase| phase.spent)
    }
}

/// Train the legacy budget, then the current budget, from a fresh state.
///
/// A phase with no energy is skipped entirely.
#[must_use]
pub fn simulate(
    legacy_budget: f64,
    current_budget: f64,
    gyms: &[GymTier],
    tracks: &TrackTable,
    model: &TrainingModel,
) -> TrainingOutcome {
    let mut state = TrainingState::new(gyms);
    let legacy = (legacy_budget > 0.0).then(|| {
        run_phase(&mut state, legacy_budget, FormulaVariant::Legacy, gyms, tracks, model).0
    });
    let current = (current_budget > 0.0).then(|| {
        run_phase(&mut state, current_budget, FormulaVariant::Current, gyms, tracks, model).0
    });
    TrainingOutcome {
        stats: state.stats,
        legacy,
        current,
        final_gym: state.gym,
        sessions: state.sessions,
    }
}
