//! Owned, versioned copies of particle state for external readers.
//!
//! A renderer or runner never borrows the live particle arrays. It receives a
//! [`Snapshot`] whose `version` increases by one per simulation step, so a
//! reader can tell whether the frame it holds is stale.

use serde::{Deserialize, Serialize};

/// Display-relevant state of one particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleSample {
    /// World-space position.
    pub position: [f32; 3],
    /// Density or speed, depending on the configured display field.
    pub scalar: f32,
    /// RGB display color.
    pub color: [f32; 3],
    /// Display radius.
    pub scale: f32,
}

/// Read-only copy of the whole particle set after a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of steps taken when the snapshot was captured.
    pub version: u64,
    /// Accumulated simulation time.
    pub sim_time: f64,
    /// One sample per particle, in particle index order.
    pub particles: Vec<ParticleSample>,
}

impl Snapshot {
    /// Number of particles in the snapshot.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// `true` if the snapshot holds no particles.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Axis-aligned bounds of all positions, or `None` when empty.
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let first = self.particles.first()?.position;
        let mut lo = first;
        let mut hi = first;
        for sample in &self.particles[1..] {
            for c in 0..3 {
                lo[c] = lo[c].min(sample.position[c]);
                hi[c] = hi[c].max(sample.position[c]);
            }
        }
        Some((lo, hi))
    }
}
