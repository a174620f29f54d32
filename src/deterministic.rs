//! Fixed-step integration of the rate equations
//!
//! ```text
//! dR/dt = k1·R − k2·R·F
//! dF/dt = k3·R·F − k4·F
//! ```
//!
//! used as the continuous reference the stochastic trials are compared with.

use serde::Deserialize;

use crate::error::SimError;
use crate::peak::{SplitPeaks, split_peaks};
use crate::rates::{PopulationState, RateConstants};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Euler,
    #[default]
    RungeKutta4,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeterministicSolution {
    pub times: Vec<f64>,
    pub rabbits: Vec<f64>,
    pub foxes: Vec<f64>,
}

impl DeterministicSolution {
    /// Fox peaks on either side of the midpoint.
    pub fn peaks(&self) -> Result<SplitPeaks<f64>, SimError> {
        split_peaks(&self.times, &self.foxes)
    }
}

#[inline]
fn derivatives(rates: &RateConstants, rabbits: f64, foxes: f64) -> (f64, f64) {
    let encounters = rabbits * foxes;
    (
        rates.rabbit_birth * rabbits - rates.rabbit_predation * encounters,
        rates.fox_birth * encounters - rates.fox_death * foxes,
    )
}

/// Integrates on the grid `t_i = i·step` for `i = 0..=floor(horizon/step)`.
pub fn solve(
    rates: &RateConstants,
    initial: PopulationState,
    horizon: f64,
    step: f64,
    method: Method,
) -> Result<DeterministicSolution, SimError> {
    rates.validate()?;
    initial.validate()?;
    if !horizon.is_finite() || horizon <= 0.0 {
        return Err(SimError::InvalidConfig(format!(
            "horizon must be a positive number of days, got {horizon}"
        )));
    }
    if !step.is_finite() || step <= 0.0 || step > horizon {
        return Err(SimError::InvalidConfig(format!(
            "step must be positive and no larger than the horizon, got {step}"
        )));
    }

    let steps = (horizon / step).floor() as usize;
    let mut solution = DeterministicSolution {
        times: Vec::with_capacity(steps + 1),
        rabbits: Vec::with_capacity(steps + 1),
        foxes: Vec::with_capacity(steps + 1),
    };
    let mut r = f64::from(initial.rabbits);
    let mut f = f64::from(initial.foxes);
    solution.times.push(0.0);
    solution.rabbits.push(r);
    solution.foxes.push(f);

    for i in 1..=steps {
        (r, f) = match method {
            Method::Euler => {
                let (dr, df) = derivatives(rates, r, f);
                (r + step * dr, f + step * df)
            }
            Method::RungeKutta4 => {
                let half = step / 2.0;
                let (k1r, k1f) = derivatives(rates, r, f);
                let (k2r, k2f) = derivatives(rates, r + half * k1r, f + half * k1f);
                let (k3r, k3f) = derivatives(rates, r + half * k2r, f + half * k2f);
                let (k4r, k4f) = derivatives(rates, r + step * k3r, f + step * k3f);
                (
                    r + step / 6.0 * (k1r + 2.0 * k2r + 2.0 * k3r + k4r),
                    f + step / 6.0 * (k1f + 2.0 * k2f + 2.0 * k3f + k4f),
                )
            }
        };
        solution.times.push(i as f64 * step);
        solution.rabbits.push(r);
        solution.foxes.push(f);
    }
    Ok(solution)
}
