//! Single-trial Gillespie loop.

use rand::Rng;
use rand::distributions::Open01;
use tracing::debug;

use crate::error::SimError;
use crate::rates::{PopulationState, RateConstants, propensities};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub rabbits: i32,
    pub foxes: i32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    times: Vec<f64>,
    rabbits: Vec<i32>,
    foxes: Vec<i32>,
}

impl Trajectory {
    pub(crate) fn starting_at(state: PopulationState) -> Self {
        let mut trajectory = Self::default();
        trajectory.push(0.0, state);
        trajectory
    }

    pub(crate) fn push(&mut self, time: f64, state: PopulationState) {
        self.times.push(time);
        self.rabbits.push(state.rabbits);
        self.foxes.push(state.foxes);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn rabbits(&self) -> &[i32] {
        &self.rabbits
    }

    pub fn foxes(&self) -> &[i32] {
        &self.foxes
    }

    pub fn get(&self, idx: usize) -> Option<Sample> {
        Some(Sample {
            time: *self.times.get(idx)?,
            rabbits: self.rabbits[idx],
            foxes: self.foxes[idx],
        })
    }

    pub fn last(&self) -> Option<Sample> {
        self.len().checked_sub(1).and_then(|idx| self.get(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len()).filter_map(|idx| self.get(idx))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimulationState {
    Running,
    RabbitsExtinct,
    FoxesExtinct,
    HorizonReached,
}

impl SimulationState {
    pub fn is_terminal(self) -> bool {
        self != SimulationState::Running
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationParams {
    pub rates: RateConstants,
    pub initial: PopulationState,
    pub horizon: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            rates: RateConstants::default(),
            initial: PopulationState::reference(),
            horizon: 600.0,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), SimError> {
        self.rates.validate()?;
        self.initial.validate()?;
        if !self.horizon.is_finite() || self.horizon <= 0.0 {
            return Err(SimError::InvalidConfig(format!(
                "horizon must be a positive number of days, got {}",
                self.horizon
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationOutcome {
    pub trajectory: Trajectory,
    /// Always one of the terminal states.
    pub terminal: SimulationState,
}

pub struct SimulationEngine<R> {
    params: SimulationParams,
    rng: R,
    population: PopulationState,
    time: f64,
    state: SimulationState,
    trajectory: Trajectory,
    failure: Option<SimError>,
    emitted: usize,
}

impl<R: Rng> SimulationEngine<R> {
    pub fn new(params: SimulationParams, rng: R) -> Result<Self, SimError> {
        params.validate()?;
        Ok(Self {
            params,
            rng,
            population: params.initial,
            time: 0.0,
            state: SimulationState::Running,
            trajectory: Trajectory::starting_at(params.initial),
            failure: None,
            emitted: 0,
        })
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn population(&self) -> PopulationState {
        self.population
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Advances by at most one event and returns the resulting state.
    ///
    /// Terminal engines return their terminal state unchanged. An engine that
    /// failed keeps returning the same error.
    pub fn step(&mut self) -> Result<SimulationState, SimError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        let props = propensities(self.population, &self.params.rates)?;
        let total_rate = props.total();

        if self.population.rabbits == 0 {
            return Ok(self.finish(SimulationState::RabbitsExtinct));
        }
        if self.population.foxes == 0 {
            return Ok(self.finish(SimulationState::FoxesExtinct));
        }
        if !(total_rate > 0.0 && total_rate.is_finite()) {
            let err = SimError::DegenerateRate {
                time: self.time,
                rabbits: self.population.rabbits,
                foxes: self.population.foxes,
            };
            self.failure = Some(err.clone());
            return Err(err);
        }

        let u1: f64 = self.rng.sample(Open01);
        let u2: f64 = self.rng.sample(Open01);

        let event = props.select(u1 * total_rate);
        self.population.apply(event);

        self.time = next_event_time(self.time, -u2.ln() / total_rate);
        self.trajectory.push(self.time, self.population);

        if self.time >= self.params.horizon {
            return Ok(self.finish(SimulationState::HorizonReached));
        }
        Ok(SimulationState::Running)
    }

    pub fn run(mut self) -> Result<SimulationOutcome, SimError> {
        while !self.state.is_terminal() {
            self.step()?;
        }
        Ok(SimulationOutcome {
            trajectory: self.trajectory,
            terminal: self.state,
        })
    }

    fn finish(&mut self, terminal: SimulationState) -> SimulationState {
        debug!(
            ?terminal,
            time = self.time,
            rabbits = self.population.rabbits,
            foxes = self.population.foxes,
            samples = self.trajectory.len(),
            "trial finished"
        );
        self.state = terminal;
        terminal
    }
}

// Times stay strictly increasing even when tau is below the f64 spacing at `time`.
pub(crate) fn next_event_time(time: f64, tau: f64) -> f64 {
    let next = time + tau;
    if next > time {
        next
    } else {
        f64::from_bits(time.to_bits() + 1)
    }
}

/// Yields every sample as it is produced, starting with `(0, R0, F0)`.
/// An error is yielded once, after which the iterator is exhausted.
impl<R: Rng> Iterator for SimulationEngine<R> {
    type Item = Result<Sample, SimError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(sample) = self.trajectory.get(self.emitted) {
                self.emitted += 1;
                return Some(Ok(sample));
            }
            if self.failure.is_some() || self.state.is_terminal() {
                return None;
            }
            if let Err(err) = self.step() {
                return Some(Err(err));
            }
        }
    }
}
