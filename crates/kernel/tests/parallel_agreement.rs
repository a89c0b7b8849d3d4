//! The parallel and all-pairs paths agree with the serial grid path.

use sph_kernel::{NeighborSearch, ParticleArrays, ParticleSystem, SimulationParams};

fn cube_lattice(n: usize, spacing: f32) -> ParticleArrays {
    let mut particles = ParticleArrays::with_capacity(n * n * n);
    let offset = -0.5 * spacing * n as f32;
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                let position = [
                    offset + i as f32 * spacing,
                    offset + j as f32 * spacing,
                    offset + k as f32 * spacing,
                ];
                particles.push_particle(position, [0.0; 3], 0.02);
            }
        }
    }
    particles
}

fn params() -> SimulationParams {
    SimulationParams {
        dt: 0.02,
        h: 0.07,
        rest_density: 2400.0,
        stiffness: 0.5,
        gravity: 0.02,
        damping: 0.3,
        ..SimulationParams::default()
    }
}

fn run(params: SimulationParams, steps: usize) -> ParticleArrays {
    let mut system = ParticleSystem::new(cube_lattice(6, 0.1), params).unwrap();
    for _ in 0..steps {
        system.step();
    }
    system.particles().clone()
}

fn max_deviation(a: &ParticleArrays, b: &ParticleArrays) -> (f32, f32) {
    let mut pos: f32 = 0.0;
    let mut vel: f32 = 0.0;
    for i in 0..a.len() {
        for c in 0..3 {
            pos = pos.max((a.position(i)[c] - b.position(i)[c]).abs());
            vel = vel.max((a.velocity(i)[c] - b.velocity(i)[c]).abs());
        }
    }
    (pos, vel)
}

fn max_density_deviation(a: &ParticleArrays, b: &ParticleArrays) -> f32 {
    a.density
        .iter()
        .zip(&b.density)
        .map(|(x, y)| (x - y).abs() / x.abs().max(1.0))
        .fold(0.0, f32::max)
}

#[test]
fn parallel_matches_serial() {
    let serial = run(params(), 20);
    let parallel = run(
        SimulationParams {
            parallel: true,
            ..params()
        },
        20,
    );
    let (pos, vel) = max_deviation(&serial, &parallel);
    let rho = max_density_deviation(&serial, &parallel);
    eprintln!("serial vs parallel: pos {pos:e}, vel {vel:e}, density {rho:e}");
    assert!(pos < 1.0e-5, "positions diverged by {pos}");
    assert!(vel < 1.0e-5, "velocities diverged by {vel}");
    assert!(rho < 1.0e-5, "densities diverged by {rho}");
}

#[test]
fn parallel_matches_serial_with_viscosity() {
    let viscous = SimulationParams {
        viscosity_enabled: true,
        viscosity: 0.5,
        ..params()
    };
    let serial = run(viscous.clone(), 20);
    let parallel = run(
        SimulationParams {
            parallel: true,
            ..viscous
        },
        20,
    );
    let (pos, vel) = max_deviation(&serial, &parallel);
    eprintln!("viscous serial vs parallel: pos {pos:e}, vel {vel:e}");
    assert!(pos < 1.0e-4, "positions diverged by {pos}");
    assert!(vel < 1.0e-4, "velocities diverged by {vel}");
}

#[test]
fn all_pairs_matches_spatial_hash() {
    let grid = run(params(), 20);
    let brute = run(
        SimulationParams {
            neighbor_search: NeighborSearch::AllPairs,
            ..params()
        },
        20,
    );
    let (pos, vel) = max_deviation(&grid, &brute);
    let rho = max_density_deviation(&grid, &brute);
    eprintln!("grid vs all-pairs: pos {pos:e}, vel {vel:e}, density {rho:e}");
    assert!(pos < 1.0e-5, "positions diverged by {pos}");
    assert!(vel < 1.0e-5, "velocities diverged by {vel}");
    assert!(rho < 1.0e-5, "densities diverged by {rho}");
}

#[test]
fn small_table_matches_large_table() {
    // Aliasing only adds candidates that fail the distance check.
    let large = run(params(), 10);
    let small = run(
        SimulationParams {
            table_size: 7,
            ..params()
        },
        10,
    );
    let (pos, _) = max_deviation(&large, &small);
    assert!(pos < 1.0e-5, "table size changed the result by {pos}");
}
