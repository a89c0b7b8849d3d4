//! Domain setup: initial particle placement

use sph_kernel::ParticleArrays;

use crate::config::LatticeLayout;

/// Seed particles on a regular lattice.
///
/// Particle `(i, j, k)` sits at `min + (i/nx, j/ny, k/nz) * (max - min)`, at
/// rest, colored by its lattice coordinates `(i/nx, j/ny, k/nz)`. Particles
/// are ordered with `i` outermost and `k` innermost.
pub fn seed_lattice(layout: &LatticeLayout, display_scale: f32) -> ParticleArrays {
    let n = [layout.nx, layout.ny, layout.nz];
    let mut particles = ParticleArrays::with_capacity(layout.count());

    // Place particles on grid
    for i in 0..n[0] {
        for j in 0..n[1] {
            for k in 0..n[2] {
                let t = [
                    i as f32 / n[0] as f32,
                    j as f32 / n[1] as f32,
                    k as f32 / n[2] as f32,
                ];
                let mut position = [0.0; 3];
                for axis in 0..3 {
                    position[axis] =
                        layout.min[axis] + t[axis] * (layout.max[axis] - layout.min[axis]);
                }
                particles.push_particle(position, t, display_scale);
            }
        }
    }

    tracing::info!(
        "Seeded {}x{}x{} lattice: {} particles",
        n[0],
        n[1],
        n[2],
        particles.len()
    );

    particles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dam_break_lattice() {
        let particles = seed_lattice(&LatticeLayout::default(), 0.02);
        assert_eq!(particles.len(), 400);

        // First particle at the minimum corner
        assert_eq!(particles.position(0), [-0.5, -0.5, -0.5]);
        assert_eq!(particles.color[0], [0.0, 0.0, 0.0]);

        // Index (1, 0, 0) comes after all 20 y-rows of column 0
        let p = particles.position(20);
        assert!((p[0] - (-0.45)).abs() < 1.0e-6, "x={}", p[0]);
        assert_eq!(p[1], -0.5);
        assert!((particles.color[20][0] - 0.05).abs() < 1.0e-6);

        // The lattice stays on the half-open box
        for i in 0..particles.len() {
            let p = particles.position(i);
            assert!(p[0] >= -0.5 && p[0] < 0.5);
            assert!(p[1] >= -0.5 && p[1] < 0.5);
            assert_eq!(p[2], -0.5);
        }
    }

    #[test]
    fn test_lattice_starts_at_rest() {
        let layout = LatticeLayout {
            nx: 3,
            ny: 2,
            nz: 2,
            min: [0.0, 0.0, 0.0],
            max: [0.3, 0.2, 0.2],
        };
        let particles = seed_lattice(&layout, 0.05);
        assert_eq!(particles.len(), 12);
        for i in 0..particles.len() {
            assert_eq!(particles.velocity(i), [0.0; 3]);
            assert_eq!(particles.scale[i], 0.05);
        }
        let last = particles.position(11);
        assert!((last[0] - 0.2).abs() < 1.0e-6);
        assert!((last[1] - 0.1).abs() < 1.0e-6);
        assert!((last[2] - 0.1).abs() < 1.0e-6);
    }
}
