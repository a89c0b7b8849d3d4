//! Configuration parsing and validation for SPH simulations

use serde::{Deserialize, Serialize};
use sph_kernel::SimulationParams;
use std::fs;

use crate::error::ConfigError;

/// Main simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Human-readable simulation name
    pub name: String,
    /// Initial particle lattice
    pub layout: LatticeLayout,
    /// Kernel parameters; missing fields take their defaults
    #[serde(default)]
    pub params: SimulationParams,
    /// Stop after this many timesteps
    pub max_timesteps: Option<u64>,
    /// Stop after this much simulated time
    pub max_time: Option<f64>,
    /// Publish a snapshot every this many steps
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,
}

/// Regular lattice of `nx * ny * nz` particles filling `[min, max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeLayout {
    /// Particles along X
    pub nx: usize,
    /// Particles along Y
    pub ny: usize,
    /// Particles along Z
    pub nz: usize,
    /// Minimum corner [x, y, z]
    #[serde(default = "default_lattice_min")]
    pub min: [f32; 3],
    /// Maximum corner [x, y, z]
    #[serde(default = "default_lattice_max")]
    pub max: [f32; 3],
}

impl LatticeLayout {
    /// Total number of particles.
    pub fn count(&self) -> usize {
        self.nx * self.ny * self.nz
    }
}

// Default values
fn default_snapshot_interval() -> u64 {
    1
}

fn default_lattice_min() -> [f32; 3] {
    [-0.5; 3]
}

fn default_lattice_max() -> [f32; 3] {
    [0.5; 3]
}

impl Default for LatticeLayout {
    fn default() -> Self {
        Self {
            nx: 20,
            ny: 20,
            nz: 1,
            min: default_lattice_min(),
            max: default_lattice_max(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;

        let config = Self::from_json(&contents)?;
        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        if layout.count() == 0 {
            return Err(ConfigError::Invalid(
                "lattice must contain at least one particle".to_string(),
            ));
        }

        for (axis, name) in ["x", "y", "z"].iter().enumerate() {
            if layout.min[axis] >= layout.max[axis] {
                return Err(ConfigError::Invalid(format!(
                    "lattice min.{name} must be less than max.{name}"
                )));
            }
        }

        // The lattice has to start inside the domain walls
        let e = self.params.domain_half_extent;
        if layout.min.iter().chain(&layout.max).any(|c| c.abs() > e) {
            return Err(ConfigError::Invalid(format!(
                "lattice must lie inside the domain [-{e}, {e}]^3"
            )));
        }

        self.params.validate()?;

        // Check max_timesteps
        if let Some(max_timesteps) = self.max_timesteps {
            if max_timesteps == 0 {
                return Err(ConfigError::Invalid(
                    "max_timesteps must be at least 1".to_string(),
                ));
            }
        }

        // Check max_time
        if let Some(max_time) = self.max_time {
            if max_time <= 0.0 || !max_time.is_finite() {
                return Err(ConfigError::Invalid("max_time must be positive".to_string()));
            }
        }

        if self.snapshot_interval == 0 {
            return Err(ConfigError::Invalid(
                "snapshot_interval must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
