//! Battle-stat estimation engine
//!
//! Platform-agnostic estimator that reconstructs an account's likely battle
//! stats from public telemetry. This crate performs no I/O beyond parsing
//! JSON; fetching telemetry and presenting results live in the caller.

pub mod boosters;
pub mod constants;
pub mod energy;
pub mod gym;
pub mod model;
pub mod numbers;
pub mod prediction;
pub mod rank;
pub mod split;
pub mod telemetry;
pub mod training;

// Re-export commonly used types
pub use boosters::{BoosterCurve, BoosterModel, BoosterOutcome, apply_boosters, enhanced_total};
pub use energy::{
    ActivityEstimators, CrimeCategory, CrimeModel, CrimeSource, EnergyEstimate, EnergyModel,
    activity_ratio, correct_crime_estimate, crime_estimator, estimate_energy,
};
pub use gym::{
    FormulaVariant, GymTier, StatLine, StatTrack, TrackConstants, TrackTable, TrainingModel,
    happy_multiplier, training_gain,
};
pub use model::{ModelConfig, ModelConfigError, ModelLoadError};
pub use prediction::{Confidence, ConfidenceModel, Prediction, PredictionOptions, predict};
pub use rank::{RankCorrection, RankInputs, RankModel, bracket_bounds, bracket_tier, correct_for_rank};
pub use split::{BudgetSplit, split_budget};
pub use telemetry::{ProfilePayload, Substance, TelemetrySnapshot};
pub use training::{
    PhaseHalt, PhaseReport, TrainingOutcome, TrainingSession, TrainingState, run_phase, simulate,
};

/// Trait for abstracting where telemetry comes from
/// Platform-specific implementations should provide this
pub trait TelemetrySource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the snapshot for one account
    ///
    /// # Errors
    ///
    /// Returns an error if the telemetry cannot be fetched or parsed.
    fn load_snapshot(&self, account: &str) -> Result<TelemetrySnapshot, Self::Error>;
}

/// Estimation engine bound to a telemetry source and a model
pub struct Estimator<'m, S>
where
    S: TelemetrySource,
{
    source: S,
    model: &'m ModelConfig,
    options: PredictionOptions,
}

impl<S> Estimator<'static, S>
where
    S: TelemetrySource,
{
    /// Create an estimator over the bundled model
    #[must_use]
    pub fn with_bundled_model(source: S) -> Self {
        Self::new(source, ModelConfig::bundled())
    }
}

impl<'m, S> Estimator<'m, S>
where
    S: TelemetrySource,
{
    #[must_use]
    pub const fn new(source: S, model: &'m ModelConfig) -> Self {
        Self {
            source,
            model,
            options: PredictionOptions {
                rank_correction: false,
            },
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: PredictionOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn model(&self) -> &ModelConfig {
        self.model
    }

    /// Estimate one account's stats
    ///
    /// # Errors
    ///
    /// Returns an error if the telemetry source fails.
    pub fn estimate(&self, account: &str) -> Result<Prediction, S::Error> {
        let snapshot = self.source.load_snapshot(account)?;
        Ok(predict(&snapshot, self.model, self.options))
    }

    /// Estimate several accounts, stopping at the first source failure
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the telemetry source.
    pub fn estimate_all<'a, I>(&self, accounts: I) -> Result<Vec<Prediction>, S::Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        accounts
            .into_iter()
            .map(|account| self.estimate(account))
            .collect()
    }
}
