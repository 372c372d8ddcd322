//! Gym tiers, stat tracks and the per-train gain formula.
use std::fmt;
use std::ops::{Index, IndexMut};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{MULTIPLIER_PLACES, TRACK_COUNT};
use crate::numbers::{non_negative, round_to_places};

/// One of the four independently trained battle stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatTrack {
    Strength,
    Speed,
    Dexterity,
    Defense,
}

impl StatTrack {
    /// Round-robin training order.
    pub const ALL: [Self; TRACK_COUNT] = [
        Self::Strength,
        Self::Speed,
        Self::Dexterity,
        Self::Defense,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Strength => 0,
            Self::Speed => 1,
            Self::Dexterity => 2,
            Self::Defense => 3,
        }
    }

    /// Track at a round-robin position; positions wrap.
    #[must_use]
    pub const fn from_position(position: usize) -> Self {
        Self::ALL[position % TRACK_COUNT]
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Strength => "strength",
            Self::Speed => "speed",
            Self::Dexterity => "dexterity",
            Self::Defense => "defense",
        }
    }
}

impl fmt::Display for StatTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Four stat values indexed by [`StatTrack`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatLine {
    pub strength: f64,
    pub speed: f64,
    pub dexterity: f64,
    pub defense: f64,
}

impl StatLine {
    #[must_use]
    pub const fn new(strength: f64, speed: f64, dexterity: f64, defense: f64) -> Self {
        Self {
            strength,
            speed,
            dexterity,
            defense,
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.strength + self.speed + self.dexterity + self.defense
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatTrack, f64)> + '_ {
        StatTrack::ALL.into_iter().map(move |track| (track, self[track]))
    }
}

impl Index<StatTrack> for StatLine {
    type Output = f64;

    fn index(&self, track: StatTrack) -> &f64 {
        match track {
            StatTrack::Strength => &self.strength,
            StatTrack::Speed => &self.speed,
            StatTrack::Dexterity => &self.dexterity,
            StatTrack::Defense => &self.defense,
        }
    }
}

impl IndexMut<StatTrack> for StatLine {
    fn index_mut(&mut self, track: StatTrack) -> &mut f64 {
        match track {
            StatTrack::Strength => &mut self.strength,
            StatTrack::Speed => &mut self.speed,
            StatTrack::Dexterity => &mut self.dexterity,
            StatTrack::Defense => &mut self.defense,
        }
    }
}

/// Per-track formula constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TrackConstants {
    /// Scale of the happiness correction that fades near the happiness cap.
    pub happy_scale: f64,
    /// Flat term added before scaling.
    pub base: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TrackTable {
    pub strength: TrackConstants,
    pub speed: TrackConstants,
    pub dexterity: TrackConstants,
    pub defense: TrackConstants,
}

impl TrackTable {
    #[must_use]
    pub const fn get(&self, track: StatTrack) -> &TrackConstants {
        match track {
            StatTrack::Strength => &self.strength,
            StatTrack::Speed => &self.speed,
            StatTrack::Dexterity => &self.dexterity,
            StatTrack::Defense => &self.defense,
        }
    }
}

/// A gym in the ordered progression table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GymTier {
    #[serde(default)]
    pub name: Option<String>,
    /// Strength multiplier ("gym dots").
    pub dots: f64,
    pub energy_per_train: u32,
    /// Lifetime energy that can be spent here; `None` for the final, unbounded gym.
    #[serde(default)]
    pub capacity: Option<u64>,
}

impl GymTier {
    /// Display name, or the one-based position when the table has none.
    #[must_use]
    pub fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("gym {}", index + 1))
    }
}

/// Gain formula constants shared by both variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrainingModel {
    /// Date the current formula replaced the legacy one.
    pub formula_change: NaiveDate,
    /// Happiness held constant during simulated training.
    pub happy: f64,
    pub happy_cap: f64,
    pub happy_log_scale: f64,
    pub happy_log_weight: f64,
    pub happy_power_coefficient: f64,
    pub happy_power_exponent: f64,
    pub gain_divisor: f64,
    /// Stat value at which the legacy formula stops counting further stats.
    pub effective_cap: f64,
    /// Divisor of the logarithmic tail past the cap under the current formula.
    pub decay_divisor: f64,
    /// Most trains simulated in one session.
    pub batch_limit: u32,
    pub happy_loss_per_energy: f64,
}

/// Which growth rule applies to a training phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaVariant {
    /// Before the formula change: stats past the cap count as the cap.
    Legacy,
    /// After the formula change: stats past the cap decay logarithmically.
    Current,
}

impl FormulaVariant {
    /// Stat value as seen by the gain formula.
    #[must_use]
    pub fn effective_value(self, value: f64, model: &TrainingModel) -> f64 {
        let cap = model.effective_cap;
        if value <= cap {
            return value;
        }
        match self {
            Self::Legacy => cap,
            Self::Current => {
                let log = value.ln();
                let divisor = model.decay_divisor * log;
                if log > 0.0 && divisor > 0.0 {
                    cap + (value - cap) / divisor
                } else {
                    cap
                }
            }
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Current => "current",
        }
    }
}

impl fmt::Display for FormulaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Happiness multiplier applied to the effective stat value.
#[must_use]
pub fn happy_multiplier(happy: f64, model: &TrainingModel) -> f64 {
    let log_term = round_to_places((1.0 + happy / model.happy_log_scale).ln(), MULTIPLIER_PLACES);
    round_to_places(1.0 + model.happy_log_weight * log_term, MULTIPLIER_PLACES)
}

/// Stat gain of a single train.
#[must_use]
pub fn training_gain(
    variant: FormulaVariant,
    value: f64,
    gym: &GymTier,
    constants: &TrackConstants,
    model: &TrainingModel,
) -> f64 {
    let happy = model.happy.clamp(0.0, model.happy_cap);
    let effective = variant.effective_value(non_negative(value), model);
    let multiplier = happy_multiplier(happy, model);
    let happy_term = model.happy_power_coefficient * happy.powf(model.happy_power_exponent);
    let happy_adjustment = if happy < model.happy_cap {
        (1.0 - (happy / model.happy_cap).powi(2)) * constants.happy_scale
    } else {
        0.0
    };
    let raw = (effective * multiplier + happy_term + happy_adjustment + constants.base)
        / model.gain_divisor
        * gym.dots
        * f64::from(gym.energy_per_train);
    non_negative(raw)
}

/// Mean happiness spent by one train costing `energy_per_train`, halves to even.
#[must_use]
pub fn happy_loss(energy_per_train: u32, model: &TrainingModel) -> f64 {
    (f64::from(energy_per_train) * model.happy_loss_per_energy).round_ties_even()
}
