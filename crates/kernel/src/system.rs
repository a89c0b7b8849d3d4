//! The particle system: owns particle state and advances it one step at a time.

use tracing::{debug, info};

use crate::boundary::DomainBoundary;
use crate::error::ParamError;
use crate::neighbor::{Candidates, SpatialHashGrid};
use crate::params::{DisplayField, NeighborSearch, SimulationParams};
use crate::particle::ParticleArrays;
use crate::snapshot::{ParticleSample, Snapshot};
use crate::sph::{self, ForceContext};
use crate::{EnergyMetrics, SimulationKernel};

/// CPU SPH simulation over a fixed set of particles.
///
/// Each step runs, in order: grid rebuild, density summation, equation of
/// state, symmetric pair forces (plus optional viscosity), acceleration
/// finalization, semi-implicit Euler integration, domain boundaries and
/// display color update.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: ParticleArrays,
    params: SimulationParams,
    grid: SpatialHashGrid,
    boundary: DomainBoundary,
    /// Steps taken so far; also the snapshot version.
    steps: u64,
    sim_time: f64,
    initial_energy: f64,
}

impl ParticleSystem {
    /// Build a system from initial particle state.
    ///
    /// # Arguments
    /// * `particles` - Initial particles. The count is fixed from here on.
    /// * `params` - Simulation parameters, validated before use.
    ///
    /// # Returns
    /// The ready-to-step system, or the first invalid parameter.
    pub fn new(particles: ParticleArrays, params: SimulationParams) -> Result<Self, ParamError> {
        params.validate()?;

        let grid = SpatialHashGrid::new(params.effective_cell_size(), params.table_size);
        let boundary = DomainBoundary::new(params.domain_half_extent, params.damping);

        let mut system = Self {
            particles,
            params,
            grid,
            boundary,
            steps: 0,
            sim_time: 0.0,
            initial_energy: 0.0,
        };
        system.initial_energy = system.total_energy();

        info!(
            "Particle system ready: {} particles, h={}, cell_size={}, table_size={}, search={:?}, parallel={}",
            system.particles.len(),
            system.params.h,
            system.grid.cell_size(),
            system.grid.table_size(),
            system.params.neighbor_search,
            system.params.parallel,
        );

        Ok(system)
    }

    /// Advance by the configured `dt`.
    pub fn step(&mut self) {
        self.step_with_dt(self.params.dt);
    }

    /// Advance by an externally supplied `dt`.
    pub fn step_with_dt(&mut self, dt: f32) {
        let n = self.particles.len();
        let params = &self.params;

        let candidates = match params.neighbor_search {
            NeighborSearch::SpatialHash => {
                self.grid
                    .rebuild(&self.particles.x, &self.particles.y, &self.particles.z);
                Candidates::Grid(&self.grid)
            }
            NeighborSearch::AllPairs => Candidates::AllPairs { count: n },
        };

        sph::compute_density(&mut self.particles, &candidates, params);
        sph::compute_pressure(&mut self.particles, params.rest_density, params.stiffness);

        let ctx = ForceContext::new(params, dt, self.steps);
        let stats = sph::accumulate_pair_forces(
            &mut self.particles,
            &candidates,
            &ctx,
            params.parallel,
        );
        if stats.coincident_pairs > 0 {
            debug!(
                "step {}: {} coincident pairs given random directions",
                self.steps, stats.coincident_pairs
            );
        }

        let isolated =
            sph::finalize_accelerations(&mut self.particles, params.gravity, params.up_axis.index());
        if isolated > 0 {
            debug!(
                "step {}: {} particles with zero density, gravity only",
                self.steps, isolated
            );
        }

        if let Some(axis) = params.planar_axis {
            sph::constrain_to_plane(&mut self.particles, axis.index());
        }
        sph::integrate(&mut self.particles, dt);
        let contacts = self.boundary.apply_boundaries(&mut self.particles);

        self.update_display();
        self.steps += 1;
        self.sim_time += dt as f64;

        debug!(
            "step {} done: {} interacting pairs, {} wall contacts",
            self.steps, stats.interacting_pairs, contacts
        );
    }

    /// Refresh per-particle display colors and scales.
    ///
    /// Density maps `n = rho / rho0` to `(n, 1 - n, 0)`; speed is normalized by
    /// the fastest particle. Channels are clamped to [0, 1].
    fn update_display(&mut self) {
        let n = self.particles.len();
        let norm = match self.params.display_field {
            DisplayField::Density => self.params.rest_density,
            DisplayField::Speed => (0..n).map(|i| self.particles.speed(i)).fold(0.0, f32::max),
        };
        for i in 0..n {
            let t = if norm > 0.0 {
                (self.display_scalar(i) / norm).clamp(0.0, 1.0)
            } else {
                0.0
            };
            self.particles.color[i] = [t, 1.0 - t, 0.0];
            self.particles.scale[i] = self.params.display_scale;
        }
    }

    fn display_scalar(&self, i: usize) -> f32 {
        match self.params.display_field {
            DisplayField::Density => self.particles.density[i],
            DisplayField::Speed => self.particles.speed(i),
        }
    }

    /// Owned, versioned copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        let p = &self.particles;
        let particles = (0..p.len())
            .map(|i| ParticleSample {
                position: p.position(i),
                scalar: self.display_scalar(i),
                color: p.color[i],
                scale: p.scale[i],
            })
            .collect();
        Snapshot {
            version: self.steps,
            sim_time: self.sim_time,
            particles,
        }
    }

    /// Kinetic plus gravitational potential energy, with the floor of the
    /// domain as the potential zero.
    pub fn total_energy(&self) -> f64 {
        let (kinetic, potential) = self.energy_terms();
        kinetic + potential
    }

    fn energy_terms(&self) -> (f64, f64) {
        let m = self.params.mass as f64;
        let g = self.params.gravity as f64;
        let floor = -(self.params.domain_half_extent as f64);
        let up = self.params.up_axis.index();

        let mut kinetic = 0.0;
        let mut potential = 0.0;
        for i in 0..self.particles.len() {
            let v = self.particles.velocity(i);
            let v2: f64 = v.iter().map(|&c| (c as f64) * (c as f64)).sum();
            kinetic += 0.5 * m * v2;
            potential += m * g * (self.particles.position(i)[up] as f64 - floor);
        }
        (kinetic, potential)
    }

    /// Energy breakdown and density deviation for diagnostics.
    pub fn energy_metrics(&self) -> EnergyMetrics {
        let (kinetic, potential) = self.energy_terms();
        let total = kinetic + potential;
        let relative_drift = if self.initial_energy.abs() > 1.0e-12 {
            (total - self.initial_energy) / self.initial_energy.abs()
        } else {
            total - self.initial_energy
        };

        let rho0 = self.params.rest_density;
        let max_density_variation = self
            .particles
            .density
            .iter()
            .map(|&rho| (rho - rho0).abs() / rho0)
            .fold(0.0, f32::max);

        EnergyMetrics {
            kinetic,
            potential,
            total,
            relative_drift,
            max_density_variation,
        }
    }

    /// Total linear momentum `sum m v`.
    pub fn momentum(&self) -> [f64; 3] {
        let m = self.params.mass as f64;
        let mut p = [0.0f64; 3];
        for i in 0..self.particles.len() {
            let v = self.particles.velocity(i);
            for c in 0..3 {
                p[c] += m * v[c] as f64;
            }
        }
        p
    }

    /// Current particle state.
    pub fn particles(&self) -> &ParticleArrays {
        &self.particles
    }

    /// Parameters the system was built with.
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Number of steps taken.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Accumulated simulation time.
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    /// The domain walls.
    pub fn boundary(&self) -> &DomainBoundary {
        &self.boundary
    }
}

impl SimulationKernel for ParticleSystem {
    fn step(&mut self) {
        ParticleSystem::step(self);
    }

    fn step_with_dt(&mut self, dt: f32) {
        ParticleSystem::step_with_dt(self, dt);
    }

    fn particles(&self) -> &ParticleArrays {
        &self.particles
    }

    fn snapshot(&self) -> Snapshot {
        ParticleSystem::snapshot(self)
    }

    fn energy_metrics(&self) -> EnergyMetrics {
        ParticleSystem::energy_metrics(self)
    }

    fn particle_count(&self) -> usize {
        self.particles.len()
    }

    fn steps_taken(&self) -> u64 {
        self.steps
    }

    fn sim_time(&self) -> f64 {
        self.sim_time
    }
}
