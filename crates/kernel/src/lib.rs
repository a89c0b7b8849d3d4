//! SPH Fluid Simulation Kernel
//!
//! This crate provides the CPU core of a Smoothed Particle Hydrodynamics
//! (SPH) fluid simulator. It owns particle state and advances it step by step;
//! everything that draws or drives the simulation lives outside.
//!
//! # Modules
//! - [`particle`] -- Struct-of-arrays particle storage.
//! - [`sph`] -- Cubic-spline smoothing kernel and the per-step SPH passes.
//! - [`neighbor`] -- Sorted spatial hash grid for neighbor search.
//! - [`eos`] -- Linear equation of state.
//! - [`boundary`] -- Fixed cubic domain with damped reflection.
//! - [`system`] -- [`ParticleSystem`], the step driver.
//! - [`snapshot`] -- Owned, versioned copies of particle state.
//! - [`params`] -- Simulation parameters and their validation.

#![warn(missing_docs)]

pub mod boundary;
pub mod eos;
pub mod error;
pub mod neighbor;
pub mod params;
pub mod particle;
pub mod snapshot;
pub mod sph;
pub mod system;

pub use boundary::DomainBoundary;
pub use eos::linear_eos;
pub use error::ParamError;
pub use neighbor::{Candidates, SpatialHashGrid};
pub use params::{Axis, DisplayField, NeighborSearch, SimulationParams};
pub use particle::ParticleArrays;
pub use snapshot::{ParticleSample, Snapshot};
pub use sph::{cubic_spline, cubic_spline_derivative, support_radius, KERNEL_VOLUME_INTEGRAL};
pub use system::ParticleSystem;

// ---------------------------------------------------------------------------
// SimulationKernel trait
// ---------------------------------------------------------------------------

/// Energy and density diagnostics for the current state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyMetrics {
    /// Total kinetic energy `sum 0.5 m |v|^2`.
    pub kinetic: f64,
    /// Gravitational potential energy measured from the domain floor.
    pub potential: f64,
    /// `kinetic + potential`.
    pub total: f64,
    /// Signed drift of `total` relative to the initial energy.
    pub relative_drift: f64,
    /// Largest `|rho - rho0| / rho0` over all particles.
    pub max_density_variation: f32,
}

/// Interface the runner drives, independent of how a step is computed.
///
/// A `SimulationKernel` owns particle data and advances it in discrete steps:
///
/// 1. Neighbor search
/// 2. Density summation and equation of state
/// 3. Pair forces (pressure, optional viscosity) and gravity
/// 4. Time integration (semi-implicit Euler)
/// 5. Domain boundaries
pub trait SimulationKernel {
    /// Advance one step with the configured time step.
    fn step(&mut self);

    /// Advance one step of duration `dt`.
    fn step_with_dt(&mut self, dt: f32);

    /// Read back current particle state (immutable reference).
    fn particles(&self) -> &ParticleArrays;

    /// Owned copy of the state for display.
    fn snapshot(&self) -> Snapshot;

    /// Current energy / density diagnostics.
    fn energy_metrics(&self) -> EnergyMetrics;

    /// Number of particles in the simulation.
    fn particle_count(&self) -> usize;

    /// Steps taken since construction.
    fn steps_taken(&self) -> u64;

    /// Accumulated simulation time.
    fn sim_time(&self) -> f64;
}
