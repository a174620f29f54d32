//! Stochastic simulation of a rabbit/fox predator-prey system.
//!
//! Each trial is a Gillespie run over four events (rabbit birth, rabbit
//! death, fox birth, fox death). Many independently seeded trials run in
//! parallel, each trajectory yields a midpoint-split "second peak" of the fox
//! population, and the batch is reduced to extinction probabilities plus the
//! filtered mean and interquartile range of the second peak.
//!
//! ```no_run
//! use rabbits_foxes::{StatisticsAggregator, TrialConfig, run_trials};
//!
//! let config = TrialConfig::default();
//! let batch = run_trials(&config)?;
//! let stats = StatisticsAggregator::for_horizon(config.params.horizon)?.aggregate(&batch)?;
//! println!("mean second peak: {}", stats.second_peak.mean_value);
//! # Ok::<(), rabbits_foxes::SimError>(())
//! ```

pub mod config;
pub mod deterministic;
pub mod engine;
pub mod error;
pub mod peak;
pub mod rates;
pub mod runner;
pub mod stats;

#[cfg(feature = "python")]
mod python;

pub use config::SimulationConfig;
pub use engine::{
    Sample, SimulationEngine, SimulationOutcome, SimulationParams, SimulationState, Trajectory,
};
pub use error::{ConfigError, SimError};
pub use peak::{Peak, SecondPeak, SplitPeaks, second_peak, split_peaks};
pub use rates::{Event, PopulationState, Propensities, RateConstants, propensities};
pub use runner::{
    ExtinctionPolicy, ExtinctionTally, TrialBatch, TrialConfig, TrialFailure, TrialResult,
    derive_seed, run_single_trial, run_trials,
};
pub use stats::{
    AggregateStatistics, ExtinctionStatistics, Quartiles, SecondPeakStatistics,
    StatisticsAggregator, percentile,
};
