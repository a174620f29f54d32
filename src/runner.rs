use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};

use crate::engine::{SimulationEngine, SimulationParams, SimulationState, Trajectory};
use crate::error::SimError;
use crate::peak::{SecondPeak, second_peak};

/// `CoupledLegacy` also counts every rabbit extinction as a fox extinction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtinctionPolicy {
    #[default]
    Independent,
    CoupledLegacy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtinctionTally {
    pub rabbits: bool,
    pub foxes: bool,
}

impl ExtinctionPolicy {
    pub fn tally(self, terminal: SimulationState) -> ExtinctionTally {
        match (self, terminal) {
            (ExtinctionPolicy::Independent, SimulationState::RabbitsExtinct) => ExtinctionTally {
                rabbits: true,
                foxes: false,
            },
            (ExtinctionPolicy::CoupledLegacy, SimulationState::RabbitsExtinct) => {
                ExtinctionTally {
                    rabbits: true,
                    foxes: true,
                }
            }
            (_, SimulationState::FoxesExtinct) => ExtinctionTally {
                rabbits: false,
                foxes: true,
            },
            (_, SimulationState::Running | SimulationState::HorizonReached) => {
                ExtinctionTally::default()
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrialConfig {
    pub params: SimulationParams,
    pub trials: usize,
    pub seed: u64,
    pub policy: ExtinctionPolicy,
    pub threads: Option<usize>,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            params: SimulationParams::default(),
            trials: 1000,
            seed: crate::config::DEFAULT_SEED,
            policy: ExtinctionPolicy::default(),
            threads: None,
        }
    }
}

impl TrialConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        self.params.validate()?;
        if self.trials == 0 {
            return Err(SimError::InvalidConfig(
                "number of trials must be greater than zero".into(),
            ));
        }
        if self.threads == Some(0) {
            return Err(SimError::InvalidConfig(
                "thread count must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrialResult {
    pub index: usize,
    pub seed: u64,
    pub trajectory: Trajectory,
    pub terminal: SimulationState,
    /// `Err(EmptyTrajectory)` when the trajectory is too short to split.
    pub second_peak: Result<SecondPeak, SimError>,
}

impl TrialResult {
    pub fn extinction(&self, policy: ExtinctionPolicy) -> ExtinctionTally {
        policy.tally(self.terminal)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrialFailure {
    pub index: usize,
    pub seed: u64,
    pub error: SimError,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrialBatch {
    pub trials: usize,
    pub policy: ExtinctionPolicy,
    pub results: Vec<TrialResult>,
    pub failures: Vec<TrialFailure>,
    pub rabbit_extinctions: usize,
    pub fox_extinctions: usize,
}

pub fn run_single_trial(
    params: &SimulationParams,
    base_seed: u64,
    index: usize,
) -> Result<TrialResult, SimError> {
    let seed = derive_seed(base_seed, index as u64);
    let rng = ChaCha8Rng::seed_from_u64(seed);
    let outcome = SimulationEngine::new(*params, rng)?.run()?;
    let second_peak = second_peak(&outcome.trajectory);
    Ok(TrialResult {
        index,
        seed,
        trajectory: outcome.trajectory,
        terminal: outcome.terminal,
        second_peak,
    })
}

/// Runs `config.trials` independent trials, in parallel, and reduces them in
/// trial-index order. Configuration errors abort the batch before any trial
/// starts; per-trial errors are recorded as [`TrialFailure`]s.
pub fn run_trials(config: &TrialConfig) -> Result<TrialBatch, SimError> {
    config.validate()?;
    info!(
        trials = config.trials,
        seed = config.seed,
        threads = ?config.threads,
        policy = ?config.policy,
        horizon = config.params.horizon,
        "starting trial batch"
    );

    let simulate = || -> Vec<Result<TrialResult, TrialFailure>> {
        (0..config.trials)
            .into_par_iter()
            .map(|index| {
                run_single_trial(&config.params, config.seed, index).map_err(|error| {
                    TrialFailure {
                        index,
                        seed: derive_seed(config.seed, index as u64),
                        error,
                    }
                })
            })
            .collect()
    };

    let outcomes = match config.threads {
        Some(n) => ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| SimError::ThreadPool(e.to_string()))?
            .install(simulate),
        None => simulate(),
    };

    let mut batch = TrialBatch {
        trials: config.trials,
        policy: config.policy,
        results: Vec::with_capacity(outcomes.len()),
        failures: Vec::new(),
        rabbit_extinctions: 0,
        fox_extinctions: 0,
    };
    for outcome in outcomes {
        match outcome {
            Ok(result) => {
                let tally = result.extinction(config.policy);
                batch.rabbit_extinctions += usize::from(tally.rabbits);
                batch.fox_extinctions += usize::from(tally.foxes);
                batch.results.push(result);
            }
            Err(failure) => {
                warn!(
                    trial = failure.index,
                    seed = failure.seed,
                    error = %failure.error,
                    "trial aborted"
                );
                batch.failures.push(failure);
            }
        }
    }

    info!(
        completed = batch.results.len(),
        failed = batch.failures.len(),
        rabbit_extinctions = batch.rabbit_extinctions,
        fox_extinctions = batch.fox_extinctions,
        "trial batch finished"
    );
    Ok(batch)
}

/// SplitMix64 over the base seed mixed with the trial index.
pub fn derive_seed(seed: u64, trial: u64) -> u64 {
    const GOLDEN_GAMMA: u64 = 0x9E3779B97F4A7C15;
    let mut z = seed ^ trial.wrapping_mul(GOLDEN_GAMMA);
    z = z.wrapping_add(GOLDEN_GAMMA);
    let mut result = z;
    result = (result ^ (result >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    result = (result ^ (result >> 27)).wrapping_mul(0x94D049BB133111EB);
    result ^ (result >> 31)
}
