//! Fixed cubic domain walls.
//!
//! The fluid lives in the axis-aligned cube `[-e, e]^3`. After integration,
//! any particle that left the cube is clamped back onto the wall it crossed
//! and the corresponding velocity component is reflected and damped:
//! ```text
//! v_axis *= -(1 - damping)
//! ```
//! Each axis is handled independently, so a particle leaving through a corner
//! is clamped on several axes in the same pass.

use crate::particle::ParticleArrays;

/// Axis-aligned cubic domain centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainBoundary {
    /// Half side length `e` of the cube `[-e, e]^3`.
    pub half_extent: f32,
    /// Fraction of the normal velocity lost on contact, in [0, 1].
    pub damping: f32,
}

impl DomainBoundary {
    /// Create a boundary for the cube `[-half_extent, half_extent]^3`.
    pub fn new(half_extent: f32, damping: f32) -> Self {
        Self {
            half_extent,
            damping,
        }
    }

    /// Clamp every particle into the domain and reflect outgoing velocity.
    ///
    /// # Returns
    /// Number of wall contacts (one per clamped axis).
    pub fn apply_boundaries(&self, particles: &mut ParticleArrays) -> usize {
        let e = self.half_extent;
        let restitution = -(1.0 - self.damping);
        let mut contacts = 0;

        let ParticleArrays {
            x, y, z, vx, vy, vz, ..
        } = particles;

        for (pos, vel) in [(x, vx), (y, vy), (z, vz)] {
            for (p, v) in pos.iter_mut().zip(vel.iter_mut()) {
                if *p < -e {
                    *p = -e;
                } else if *p > e {
                    *p = e;
                } else {
                    continue;
                }
                *v *= restitution;
                contacts += 1;
            }
        }

        contacts
    }

    /// `true` if `pos` lies inside the closed cube.
    pub fn contains(&self, pos: [f32; 3]) -> bool {
        pos.iter().all(|c| (-self.half_extent..=self.half_extent).contains(c))
    }
}

impl Default for DomainBoundary {
    fn default() -> Self {
        Self::new(1.0, 0.1)
    }
}
