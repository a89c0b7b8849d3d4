//! Simulation parameters.
//!
//! A flat set of named options consumed once at construction. Defaults
//! reproduce the 20x20 "dam break" setup the simulator was tuned on.

use serde::{Deserialize, Serialize};

use crate::error::ParamError;
use crate::sph::support_radius;

/// How pair candidates are found during the density and force passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NeighborSearch {
    /// 27-cell query against the spatial hash grid.
    SpatialHash,
    /// Exhaustive O(N^2) scan. Reference path for small systems and tests.
    AllPairs,
}

/// Axis along which gravity acts (gravity points towards `-axis`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// Component index (0, 1 or 2).
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Scalar reported per particle in snapshots and used for display colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayField {
    /// SPH density estimate.
    Density,
    /// Velocity magnitude.
    Speed,
}

/// All tunables of a [`ParticleSystem`](crate::ParticleSystem).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Fixed time step used by `step()`.
    #[serde(default = "default_dt")]
    pub dt: f32,
    /// Smoothing length. The kernel support radius is `2h`.
    #[serde(default = "default_h")]
    pub h: f32,
    /// Rest density rho0 of the linear equation of state.
    #[serde(default = "default_rest_density")]
    pub rest_density: f32,
    /// Stiffness k of the linear equation of state.
    #[serde(default = "default_stiffness")]
    pub stiffness: f32,
    /// Fraction of normal velocity lost at a wall, in [0, 1].
    #[serde(default = "default_damping")]
    pub damping: f32,
    /// Gravity magnitude, applied along `-up_axis`.
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    /// Uniform particle mass.
    #[serde(default = "default_mass")]
    pub mass: f32,
    /// Artificial viscosity coefficient mu.
    #[serde(default)]
    pub viscosity: f32,
    /// Number of buckets in the spatial hash table.
    #[serde(default = "default_table_size")]
    pub table_size: usize,
    /// Grid cell size. `None` means the kernel support radius `2h`.
    #[serde(default)]
    pub cell_size: Option<f32>,
    /// Include the self-contribution `m * W(0, h)` in the density sum.
    #[serde(default = "default_true")]
    pub self_density: bool,
    /// Apply the artificial-viscosity velocity correction.
    #[serde(default)]
    pub viscosity_enabled: bool,
    /// Pair candidate search strategy.
    #[serde(default = "default_neighbor_search")]
    pub neighbor_search: NeighborSearch,
    /// Run density and force passes across threads.
    #[serde(default)]
    pub parallel: bool,
    /// "Up" axis; gravity is subtracted along it.
    #[serde(default = "default_up_axis")]
    pub up_axis: Axis,
    /// Pin motion along this axis (a 2D slab in 3D). `None` leaves all
    /// three axes free.
    #[serde(default)]
    pub planar_axis: Option<Axis>,
    /// Seed for the tie-break directions of coincident particles.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Scalar exported for visualization.
    #[serde(default = "default_display_field")]
    pub display_field: DisplayField,
    /// Display radius written to every particle's scale.
    #[serde(default = "default_display_scale")]
    pub display_scale: f32,
    /// Half side length of the cubic domain `[-e, e]^3`.
    #[serde(default = "default_half_extent")]
    pub domain_half_extent: f32,
}

fn default_dt() -> f32 {
    0.05
}

fn default_h() -> f32 {
    0.125
}

fn default_rest_density() -> f32 {
    200.0
}

fn default_stiffness() -> f32 {
    1.5
}

fn default_damping() -> f32 {
    0.1
}

fn default_gravity() -> f32 {
    0.001
}

fn default_mass() -> f32 {
    1.0
}

fn default_table_size() -> usize {
    16_384
}

fn default_true() -> bool {
    true
}

fn default_neighbor_search() -> NeighborSearch {
    NeighborSearch::SpatialHash
}

fn default_up_axis() -> Axis {
    Axis::Y
}

fn default_seed() -> u64 {
    0x5eed
}

fn default_display_field() -> DisplayField {
    DisplayField::Density
}

fn default_display_scale() -> f32 {
    0.02
}

fn default_half_extent() -> f32 {
    1.0
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            dt: default_dt(),
            h: default_h(),
            rest_density: default_rest_density(),
            stiffness: default_stiffness(),
            damping: default_damping(),
            gravity: default_gravity(),
            mass: default_mass(),
            viscosity: 0.0,
            table_size: default_table_size(),
            cell_size: None,
            self_density: true,
            viscosity_enabled: false,
            neighbor_search: default_neighbor_search(),
            parallel: false,
            up_axis: default_up_axis(),
            planar_axis: None,
            seed: default_seed(),
            display_field: default_display_field(),
            display_scale: default_display_scale(),
            domain_half_extent: default_half_extent(),
        }
    }
}

impl SimulationParams {
    /// Grid cell size actually used: the configured value, or the kernel
    /// support radius `2h` when unset.
    pub fn effective_cell_size(&self) -> f32 {
        self.cell_size.unwrap_or_else(|| support_radius(self.h))
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<(), ParamError> {
        let finite = [
            ("dt", self.dt),
            ("h", self.h),
            ("rest_density", self.rest_density),
            ("stiffness", self.stiffness),
            ("damping", self.damping),
            ("gravity", self.gravity),
            ("mass", self.mass),
            ("viscosity", self.viscosity),
            ("display_scale", self.display_scale),
            ("domain_half_extent", self.domain_half_extent),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ParamError::NotFinite { name });
            }
        }

        let positive = [
            ("dt", self.dt),
            ("h", self.h),
            ("rest_density", self.rest_density),
            ("mass", self.mass),
            ("domain_half_extent", self.domain_half_extent),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(ParamError::NonPositive { name, value });
            }
        }

        if let Some(cell_size) = self.cell_size {
            if !cell_size.is_finite() {
                return Err(ParamError::NotFinite { name: "cell_size" });
            }
            if cell_size <= 0.0 {
                return Err(ParamError::NonPositive {
                    name: "cell_size",
                    value: cell_size,
                });
            }
            // Smaller cells let the 27-cell scan miss neighbors inside 2h.
            let support = support_radius(self.h);
            if cell_size < support {
                return Err(ParamError::OutOfRange {
                    name: "cell_size",
                    value: cell_size,
                    min: support,
                    max: f32::INFINITY,
                });
            }
        }

        if !(0.0..=1.0).contains(&self.damping) {
            return Err(ParamError::OutOfRange {
                name: "damping",
                value: self.damping,
                min: 0.0,
                max: 1.0,
            });
        }

        if self.viscosity < 0.0 {
            return Err(ParamError::OutOfRange {
                name: "viscosity",
                value: self.viscosity,
                min: 0.0,
                max: f32::INFINITY,
            });
        }

        if self.table_size == 0 {
            return Err(ParamError::EmptyHashTable);
        }

        if self.planar_axis == Some(self.up_axis) {
            return Err(ParamError::PlanarAlongGravity);
        }

        Ok(())
    }
}
