//! Runs a batch of stochastic trials and the deterministic reference, then
//! logs the comparison.
//!
//! Usage: `rabbits-foxes [config.yaml]`. Without a path the reference
//! configuration is used. Log verbosity follows `RUST_LOG` (default `info`).

use std::path::Path;

use rabbits_foxes::{SimError, SimulationConfig, deterministic, run_trials};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = load_config()?;
    info!(
        trials = config.trials,
        seed = config.seed,
        horizon_days = config.horizon_days,
        rabbits = config.initial.rabbits,
        foxes = config.initial.foxes,
        "configuration loaded"
    );

    let solution = deterministic::solve(
        &config.rates,
        config.initial,
        config.horizon_days,
        config.deterministic.step_days,
        config.deterministic.method,
    )?;
    let peaks = solution.peaks()?;
    info!(
        method = ?config.deterministic.method,
        first_peak = peaks.first.value,
        first_peak_day = peaks.first.time,
        second_peak = peaks.second.value,
        second_peak_day = peaks.second.time,
        "deterministic fox peaks"
    );

    let batch = run_trials(&config.trial_config())?;
    let aggregator = config.aggregator()?;

    let extinction = aggregator.extinction(&batch);
    info!(
        policy = ?batch.policy,
        rabbit_extinctions = extinction.rabbit_extinctions,
        fox_extinctions = extinction.fox_extinctions,
        rabbit_extinction_percent = extinction.rabbit_extinction_percent,
        fox_extinction_percent = extinction.fox_extinction_percent,
        failed_trials = extinction.failed_trials,
        "extinction statistics"
    );

    match aggregator.second_peaks(&batch) {
        Ok(peaks) => info!(
            threshold_days = peaks.threshold,
            accepted = peaks.accepted,
            candidates = peaks.candidates,
            mean_second_peak = peaks.mean_value,
            mean_second_peak_day = peaks.mean_time,
            peak_q1 = peaks.value_quartiles.q1,
            peak_q3 = peaks.value_quartiles.q3,
            day_q1 = peaks.time_quartiles.q1,
            day_q3 = peaks.time_quartiles.q3,
            "stochastic second fox peak"
        ),
        Err(err @ SimError::NoValidSecondPeak { .. }) => {
            warn!(error = %err, "no second peak statistics");
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

fn load_config() -> Result<SimulationConfig, Box<dyn std::error::Error>> {
    match std::env::args_os().nth(1) {
        Some(path) => {
            info!(path = %Path::new(&path).display(), "loading configuration");
            Ok(SimulationConfig::from_file(Path::new(&path))?)
        }
        None => {
            let mut config = SimulationConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }
}
