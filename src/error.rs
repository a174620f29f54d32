use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(
        "total propensity is zero at t={time} with {rabbits} rabbits and {foxes} foxes"
    )]
    DegenerateRate { time: f64, rabbits: i32, foxes: i32 },
    #[error("trajectory of length {len} is too short to split into two halves")]
    EmptyTrajectory { len: usize },
    #[error(
        "none of {candidates} second peaks occurred after the {threshold} day acceptance threshold"
    )]
    NoValidSecondPeak { threshold: f64, candidates: usize },
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

/// Errors raised while loading a [`SimulationConfig`](crate::SimulationConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to parse config YAML: {source}")]
    Yaml { source: serde_yml::Error },
    #[error(transparent)]
    Invalid(#[from] SimError),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

#[cfg(feature = "python")]
impl From<SimError> for pyo3::PyErr {
    fn from(err: SimError) -> Self {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<ConfigError> for pyo3::PyErr {
    fn from(err: ConfigError) -> Self {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
