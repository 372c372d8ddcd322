//! Model tables bundled with the crate.
//!
//! Every coefficient the estimator uses lives in `assets/data/model.json`.
//! Callers may supply their own document through [`ModelConfig::from_json`]
//! to experiment with alternative calibrations.
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::boosters::BoosterModel;
use crate::energy::{CrimeModel, EnergyModel};
use crate::gym::{GymTier, TrackTable, TrainingModel};
use crate::prediction::ConfidenceModel;
use crate::rank::RankModel;

const DEFAULT_MODEL_DATA: &str = include_str!("../assets/data/model.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelConfig {
    pub energy: EnergyModel,
    pub crimes: CrimeModel,
    pub training: TrainingModel,
    pub tracks: TrackTable,
    /// Gyms in unlock order; the last one has no capacity.
    pub gyms: Vec<GymTier>,
    pub boosters: BoosterModel,
    pub rank: RankModel,
    pub confidence: ConfidenceModel,
}

/// Errors raised when model invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ModelConfigError {
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("gym table is empty")]
    NoGyms,
    #[error("gym {index} costs no energy per train")]
    FreeTrain { index: usize },
    #[error("gym {index} is bounded but the final gym must accept unlimited energy")]
    BoundedFinalGym { index: usize },
    #[error("gym {index} is unbounded but is not the final gym")]
    UnboundedInnerGym { index: usize },
    #[error("crime category '{id}' has success rate {rate}")]
    CrimeSuccessRate { id: String, rate: f64 },
    #[error("{field} thresholds must be ascending")]
    UnorderedThresholds { field: &'static str },
    #[error("rank bounds invalid: {lower} lower bounds, {upper} upper bounds")]
    RankBounds { lower: usize, upper: usize },
    #[error("confidence thresholds invalid: medium {medium} exceeds high {high}")]
    ConfidenceOrder { medium: f64, high: f64 },
}

/// Errors raised while loading a model document.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model document is inconsistent: {0}")]
    Invalid(#[from] ModelConfigError),
}

impl ModelConfig {
    /// Parse the bundled model.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled document fails to parse or validate.
    pub fn load_from_static() -> Result<Self, ModelLoadError> {
        Self::from_json(DEFAULT_MODEL_DATA)
    }

    /// The bundled model, parsed once per process.
    ///
    /// Falls back to an empty model (which estimates nothing) if the bundled
    /// document is unusable; the failure is logged.
    #[must_use]
    pub fn bundled() -> &'static Self {
        static MODEL: OnceLock<ModelConfig> = OnceLock::new();
        MODEL.get_or_init(|| {
            Self::load_from_static().unwrap_or_else(|err| {
                log::error!("bundled model rejected: {err}");
                Self::default()
            })
        })
    }

    /// Parse and validate a model document.
    ///
    /// # Errors
    ///
    /// Returns `ModelLoadError::Parse` for malformed JSON and
    /// `ModelLoadError::Invalid` when the tables break an invariant.
    pub fn from_json(json: &str) -> Result<Self, ModelLoadError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ModelConfigError` when any table violates its documented bounds.
    pub fn validate(&self) -> Result<(), ModelConfigError> {
        self.validate_energy()?;
        self.validate_crimes()?;
        self.validate_training()?;
        self.validate_gyms()?;
        self.validate_rank()?;
        self.validate_confidence()?;
        Ok(())
    }

    fn validate_energy(&self) -> Result<(), ModelConfigError> {
        positive("energy.base_daily_regen", self.energy.base_daily_regen)?;
        positive("energy.minutes_per_day", self.energy.minutes_per_day)?;
        positive("energy.online_share", self.energy.online_share)?;
        Ok(())
    }

    fn validate_crimes(&self) -> Result<(), ModelConfigError> {
        for category in &self.crimes.categories {
            if category.success_rate <= 0.0 || category.success_rate > 1.0 {
                return Err(ModelConfigError::CrimeSuccessRate {
                    id: category.id.clone(),
                    rate: category.success_rate,
                });
            }
        }
        positive("crimes.correction_cap", self.crimes.correction_cap)
    }

    fn validate_training(&self) -> Result<(), ModelConfigError> {
        let training = &self.training;
        positive("training.happy_cap", training.happy_cap)?;
        positive("training.happy_log_scale", training.happy_log_scale)?;
        positive("training.gain_divisor", training.gain_divisor)?;
        positive("training.effective_cap", training.effective_cap)?;
        positive("training.decay_divisor", training.decay_divisor)?;
        positive("training.batch_limit", f64::from(training.batch_limit))
    }

    fn validate_gyms(&self) -> Result<(), ModelConfigError> {
        let Some(last) = self.gyms.len().checked_sub(1) else {
            return Err(ModelConfigError::NoGyms);
        };
        for (index, gym) in self.gyms.iter().enumerate() {
            if gym.energy_per_train == 0 {
                return Err(ModelConfigError::FreeTrain { index });
            }
            match (index == last, gym.capacity) {
                (true, Some(_)) => return Err(ModelConfigError::BoundedFinalGym { index }),
                (false, None) => return Err(ModelConfigError::UnboundedInnerGym { index }),
                _ => {}
            }
        }
        Ok(())
    }

    fn validate_rank(&self) -> Result<(), ModelConfigError> {
        let rank = &self.rank;
        ascending("rank.level", &rank.level_thresholds)?;
        ascending("rank.crime", &rank.crime_thresholds)?;
        ascending("rank.networth", &rank.networth_thresholds)?;
        ascending("rank.lower_bounds", &rank.lower_bounds)?;
        ascending("rank.upper_bounds", &rank.upper_bounds)?;
        if rank.lower_bounds.is_empty() || rank.lower_bounds.len() != rank.upper_bounds.len() {
            return Err(ModelConfigError::RankBounds {
                lower: rank.lower_bounds.len(),
                upper: rank.upper_bounds.len(),
            });
        }
        Ok(())
    }

    fn validate_confidence(&self) -> Result<(), ModelConfigError> {
        let confidence = &self.confidence;
        if confidence.medium_above > confidence.high_above {
            return Err(ModelConfigError::ConfidenceOrder {
                medium: confidence.medium_above,
                high: confidence.high_above,
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ModelConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ModelConfigError::NotPositive { field, value })
    }
}

fn ascending<T: PartialOrd>(field: &'static str, values: &[T]) -> Result<(), ModelConfigError> {
    if values.windows(2).all(|pair| pair[0] < pair[1]) {
        Ok(())
    } else {
        Err(ModelConfigError::UnorderedThresholds { field })
    }
}
