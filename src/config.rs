//! Typed configuration, loadable from YAML.
//!
//! Every field has a default matching the reference farm: 400 rabbits, 200
//! foxes, 600 days, 1000 trials. A minimal file only lists what it changes:
//!
//! ```yaml
//! rates:
//!   fox_birth: 0.00004
//! horizon_days: 800
//! extinction_policy: coupled_legacy
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::deterministic::Method;
use crate::engine::SimulationParams;
use crate::error::{ConfigError, SimError};
use crate::rates::{PopulationState, RateConstants};
use crate::runner::{ExtinctionPolicy, TrialConfig};
use crate::stats::StatisticsAggregator;

pub const DEFAULT_SEED: u64 = 0x5EED_F0CE5;

/// Overrides `seed` when set to a valid `u64`.
pub const SEED_ENV_VAR: &str = "RABBITS_FOXES_SEED";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub rates: RateConstants,
    pub initial: PopulationState,
    pub horizon_days: f64,
    pub trials: usize,
    pub seed: u64,
    /// Second peaks at or before this day are discarded. Unset means one
    /// third of the horizon.
    pub peak_threshold_days: Option<f64>,
    pub extinction_policy: ExtinctionPolicy,
    pub threads: Option<usize>,
    pub deterministic: DeterministicConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeterministicConfig {
    pub method: Method,
    pub step_days: f64,
}

impl Default for DeterministicConfig {
    fn default() -> Self {
        Self {
            method: Method::RungeKutta4,
            step_days: 1.0,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rates: RateConstants::default(),
            initial: PopulationState::reference(),
            horizon_days: 600.0,
            trials: 1000,
            seed: DEFAULT_SEED,
            peak_threshold_days: None,
            extinction_policy: ExtinctionPolicy::default(),
            threads: None,
            deterministic: DeterministicConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parses and validates YAML. The environment is not consulted.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(seed) = std::env::var(SEED_ENV_VAR)
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
        {
            self.seed = seed;
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.trial_config().validate()?;
        self.aggregator()?;
        let step = self.deterministic.step_days;
        if !step.is_finite() || step <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "deterministic step must be a positive number of days, got {step}"
            )));
        }
        Ok(())
    }

    pub fn params(&self) -> SimulationParams {
        SimulationParams {
            rates: self.rates,
            initial: self.initial,
            horizon: self.horizon_days,
        }
    }

    pub fn trial_config(&self) -> TrialConfig {
        TrialConfig {
            params: self.params(),
            trials: self.trials,
            seed: self.seed,
            policy: self.extinction_policy,
            threads: self.threads,
        }
    }

    pub fn peak_threshold(&self) -> f64 {
        self.peak_threshold_days.unwrap_or(self.horizon_days / 3.0)
    }

    pub fn aggregator(&self) -> Result<StatisticsAggregator, SimError> {
        StatisticsAggregator::new(self.peak_threshold())
    }
}
