use numpy::PyArray1;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::config::DEFAULT_SEED;
use crate::deterministic::{Method, solve};
use crate::engine::SimulationParams;
use crate::rates::{PopulationState, RateConstants};
use crate::runner::{ExtinctionPolicy, TrialConfig, run_trials};
use crate::stats::StatisticsAggregator;

fn parse_method(method: &str) -> PyResult<Method> {
    match method {
        m if m.eq_ignore_ascii_case("euler") => Ok(Method::Euler),
        m if m.eq_ignore_ascii_case("rk4") => Ok(Method::RungeKutta4),
        other => Err(PyValueError::new_err(format!(
            "unrecognized method '{other}' (expected 'euler' or 'rk4')"
        ))),
    }
}

#[pyfunction(signature = (
    rates=(0.015, 0.00004, 0.0004, 0.04),
    initial=(400, 200),
    horizon=600.0,
    trials=1000,
    seed=DEFAULT_SEED,
    peak_threshold=None,
    coupled_extinction=false,
    n_threads=None
))]
#[allow(clippy::too_many_arguments)]
pub fn simulate_trials<'py>(
    py: Python<'py>,
    rates: (f64, f64, f64, f64),
    initial: (i32, i32),
    horizon: f64,
    trials: usize,
    seed: u64,
    peak_threshold: Option<f64>,
    coupled_extinction: bool,
    n_threads: Option<usize>,
) -> PyResult<Bound<'py, PyDict>> {
    let config = TrialConfig {
        params: SimulationParams {
            rates: RateConstants::new(rates.0, rates.1, rates.2, rates.3)?,
            initial: PopulationState::new(initial.0, initial.1),
            horizon,
        },
        trials,
        seed,
        policy: if coupled_extinction {
            ExtinctionPolicy::CoupledLegacy
        } else {
            ExtinctionPolicy::Independent
        },
        threads: n_threads,
    };
    let aggregator = match peak_threshold {
        Some(threshold) => StatisticsAggregator::new(threshold)?,
        None => StatisticsAggregator::for_horizon(horizon)?,
    };
    let batch = py.detach(|| run_trials(&config))?;

    let trajectories = PyList::empty(py);
    for result in &batch.results {
        let entry = PyDict::new(py);
        entry.set_item("index", result.index)?;
        entry.set_item("seed", result.seed)?;
        entry.set_item("times", PyArray1::from_slice(py, result.trajectory.times()))?;
        entry.set_item(
            "rabbits",
            PyArray1::from_slice(py, result.trajectory.rabbits()),
        )?;
        entry.set_item("foxes", PyArray1::from_slice(py, result.trajectory.foxes()))?;
        entry.set_item("terminal", format!("{:?}", result.terminal))?;
        entry.set_item(
            "second_peak",
            result
                .second_peak
                .as_ref()
                .ok()
                .map(|peak| (peak.value, peak.time)),
        )?;
        trajectories.append(entry)?;
    }

    let failures = PyList::empty(py);
    for failure in &batch.failures {
        failures.append((failure.index, failure.seed, failure.error.to_string()))?;
    }

    let extinction = aggregator.extinction(&batch);
    let stats = PyDict::new(py);
    stats.set_item("trials", extinction.trials)?;
    stats.set_item("failed_trials", extinction.failed_trials)?;
    stats.set_item("rabbit_extinctions", extinction.rabbit_extinctions)?;
    stats.set_item("fox_extinctions", extinction.fox_extinctions)?;
    stats.set_item("rabbit_extinction_percent", extinction.rabbit_extinction_percent)?;
    stats.set_item("fox_extinction_percent", extinction.fox_extinction_percent)?;
    stats.set_item("peak_threshold", aggregator.threshold())?;
    match aggregator.second_peaks(&batch) {
        Ok(peaks) => {
            stats.set_item("accepted_second_peaks", peaks.accepted)?;
            stats.set_item("mean_second_peak", peaks.mean_value)?;
            stats.set_item("mean_second_peak_time", peaks.mean_time)?;
            stats.set_item(
                "second_peak_iqr",
                (peaks.value_quartiles.q1, peaks.value_quartiles.q3),
            )?;
            stats.set_item(
                "second_peak_time_iqr",
                (peaks.time_quartiles.q1, peaks.time_quartiles.q3),
            )?;
        }
        Err(err) => stats.set_item("second_peak_error", err.to_string())?,
    }

    let out = PyDict::new(py);
    out.set_item("trajectories", trajectories)?;
    out.set_item("failures", failures)?;
    out.set_item("statistics", stats)?;
    Ok(out)
}

#[pyfunction(signature = (
    rates=(0.015, 0.00004, 0.0004, 0.04),
    initial=(400, 200),
    horizon=600.0,
    step=1.0,
    method="rk4"
))]
pub fn solve_deterministic<'py>(
    py: Python<'py>,
    rates: (f64, f64, f64, f64),
    initial: (i32, i32),
    horizon: f64,
    step: f64,
    method: &str,
) -> PyResult<Bound<'py, PyDict>> {
    let rates = RateConstants::new(rates.0, rates.1, rates.2, rates.3)?;
    let method = parse_method(method)?;
    let solution = solve(
        &rates,
        PopulationState::new(initial.0, initial.1),
        horizon,
        step,
        method,
    )?;
    let peaks = solution.peaks()?;
    let out = PyDict::new(py);
    out.set_item("first_peak", (peaks.first.value, peaks.first.time))?;
    out.set_item("second_peak", (peaks.second.value, peaks.second.time))?;
    out.set_item("times", PyArray1::from_vec(py, solution.times))?;
    out.set_item("rabbits", PyArray1::from_vec(py, solution.rabbits))?;
    out.set_item("foxes", PyArray1::from_vec(py, solution.foxes))?;
    Ok(out)
}

#[pymodule]
fn rabbits_foxes(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_function(wrap_pyfunction!(simulate_trials, module)?)?;
    module.add_function(wrap_pyfunction!(solve_deterministic, module)?)?;
    Ok(())
}
