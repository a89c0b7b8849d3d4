//! Orchestration Layer
//!
//! This crate drives the SPH kernel from the outside:
//! - JSON configuration loading and validation
//! - Initial lattice seeding
//! - Simulation runner with lifecycle management and snapshot hand-off
//! - Binary frame encoding for renderers

#![warn(missing_docs)]

pub mod config;
pub mod domain;
pub mod error;
pub mod frame;
pub mod runner;

pub use config::{LatticeLayout, SimulationConfig};
pub use error::{ConfigError, RunnerError};
pub use runner::{RunLimits, RunnerState, SimulationRunner};

use sph_kernel::ParticleSystem;

/// Build the particle system described by a configuration.
pub fn build_system(config: &SimulationConfig) -> Result<ParticleSystem, ConfigError> {
    let particles = domain::seed_lattice(&config.layout, config.params.display_scale);
    let system = ParticleSystem::new(particles, config.params.clone())?;
    Ok(system)
}

/// Load a config file and wrap the resulting particle system in a runner.
///
/// The runner is returned in the `Created` state with the initial snapshot
/// already published; call [`SimulationRunner::start`] to begin stepping.
///
/// ```no_run
/// use sph_orchestrator::create_simulation;
///
/// let runner = create_simulation("configs/dam-break-2d.json")?;
/// runner.start();
/// let frame = runner.latest_snapshot();
/// println!("{} particles at t={}", frame.len(), frame.sim_time);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn create_simulation(config_path: &str) -> Result<SimulationRunner, ConfigError> {
    tracing::info!("Creating simulation from config: {}", config_path);

    let config = SimulationConfig::load(config_path)?;
    tracing::info!("Configuration loaded: {}", config.name);

    let system = build_system(&config)?;

    let runner = SimulationRunner::new(
        Box::new(system),
        RunLimits {
            max_timesteps: config.max_timesteps,
            max_time: config.max_time,
            snapshot_interval: config.snapshot_interval,
        },
    );

    tracing::info!(
        "Simulation '{}' ready: {} particles",
        config.name,
        config.layout.count()
    );
    Ok(runner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_system_from_json() {
        let config = SimulationConfig::from_json(
            r#"{ "name": "tiny", "layout": { "nx": 3, "ny": 3, "nz": 1 }, "max_timesteps": 3 }"#,
        )
        .unwrap();
        let mut system = build_system(&config).unwrap();
        assert_eq!(system.particles().len(), 9);
        system.step();
        assert_eq!(system.snapshot().version, 1);
    }

    #[test]
    fn test_create_simulation_missing_config() {
        assert!(matches!(
            create_simulation("does/not/exist.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
