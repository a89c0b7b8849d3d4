//! Parameter validation errors.
//!
//! The numerical core never fails once constructed; the only fallible surface
//! is validating [`SimulationParams`](crate::params::SimulationParams) before a
//! [`ParticleSystem`](crate::system::ParticleSystem) is built.

use std::fmt;

/// Errors raised when simulation parameters are unusable.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    /// A parameter that must be strictly positive was zero or negative.
    NonPositive {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },
    /// A parameter fell outside its allowed closed range.
    OutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
        /// Lower bound (inclusive).
        min: f32,
        /// Upper bound (inclusive).
        max: f32,
    },
    /// A parameter was NaN or infinite.
    NotFinite {
        /// Parameter name.
        name: &'static str,
    },
    /// The spatial hash table must have at least one bucket.
    EmptyHashTable,
    /// The pinned axis is the one gravity acts along.
    PlanarAlongGravity,
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::NonPositive { name, value } => {
                write!(f, "{} must be positive, got {}", name, value)
            }
            ParamError::OutOfRange { name, value, min, max } => {
                write!(f, "{} must be in [{}, {}], got {}", name, min, max, value)
            }
            ParamError::NotFinite { name } => write!(f, "{} must be finite", name),
            ParamError::EmptyHashTable => write!(f, "table_size must be at least 1"),
            ParamError::PlanarAlongGravity => {
                write!(f, "planar_axis must differ from up_axis")
            }
        }
    }
}

impl std::error::Error for ParamError {}
