//! Errors raised while loading configurations and driving the runner.

use std::fmt;
use std::io;

use sph_kernel::ParamError;

/// Failure to load or validate a [`SimulationConfig`](crate::SimulationConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The file is not valid configuration JSON.
    Parse(serde_json::Error),
    /// A layout or run-control field is unusable.
    Invalid(String),
    /// A simulation parameter is unusable.
    Params(ParamError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config file {}: {}", path, source)
            }
            ConfigError::Parse(e) => write!(f, "failed to parse config JSON: {}", e),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
            ConfigError::Params(e) => write!(f, "invalid simulation parameters: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Params(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<ParamError> for ConfigError {
    fn from(e: ParamError) -> Self {
        ConfigError::Params(e)
    }
}

/// Failure reported by a [`SimulationRunner`](crate::SimulationRunner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// The simulation thread panicked.
    ThreadPanicked,
    /// The simulation produced a non-finite particle state.
    NonFinite {
        /// Step at which the anomaly was detected.
        step: u64,
    },
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerError::ThreadPanicked => write!(f, "simulation thread panicked"),
            RunnerError::NonFinite { step } => {
                write!(f, "non-finite particle state at step {}", step)
            }
        }
    }
}

impl std::error::Error for RunnerError {}
