//! Free fall of an isolated particle.
//!
//! With no neighbors and no wall contact, only gravity acts. Semi-implicit
//! Euler then gives `v_n = -g n dt` and `y_n = y_0 - g dt^2 n (n + 1) / 2`.

use sph_kernel::{Axis, ParticleArrays, ParticleSystem, SimulationParams};

fn single(y0: f32) -> ParticleArrays {
    let mut particles = ParticleArrays::new();
    particles.push_particle([0.0, y0, 0.0], [0.0; 3], 0.02);
    particles
}

#[test]
fn free_fall_matches_discrete_euler() {
    let g = 1.0_f32;
    let dt = 0.01_f32;
    let y0 = 0.5_f32;
    let params = SimulationParams {
        gravity: g,
        dt,
        up_axis: Axis::Y,
        ..SimulationParams::default()
    };
    let mut system = ParticleSystem::new(single(y0), params).unwrap();

    for n in 1..=100u32 {
        system.step();
        let nf = n as f64;
        let expected_v = -(g as f64) * nf * dt as f64;
        let expected_y = y0 as f64 - (g as f64) * (dt as f64).powi(2) * nf * (nf + 1.0) / 2.0;
        let p = system.particles();
        assert!(
            (p.vy[0] as f64 - expected_v).abs() < 1.0e-5,
            "step {n}: vy={} expected {expected_v}",
            p.vy[0]
        );
        assert!(
            (p.y[0] as f64 - expected_y).abs() < 1.0e-5,
            "step {n}: y={} expected {expected_y}",
            p.y[0]
        );
        assert_eq!(p.vx[0], 0.0);
        assert_eq!(p.vz[0], 0.0);
    }
    eprintln!("after 100 steps: y={}, vy={}", system.particles().y[0], system.particles().vy[0]);
}

#[test]
fn free_fall_without_self_density() {
    // Zero density: the pressure accumulator is discarded, gravity still applies.
    let params = SimulationParams {
        gravity: 1.0,
        dt: 0.01,
        self_density: false,
        ..SimulationParams::default()
    };
    let mut system = ParticleSystem::new(single(0.0), params).unwrap();
    for _ in 0..10 {
        system.step();
    }
    let p = system.particles();
    assert!(p.is_finite());
    assert!((p.vy[0] + 0.1).abs() < 1.0e-6, "vy={}", p.vy[0]);
    assert_eq!(p.density[0], 0.0);
}

#[test]
fn falling_particle_bounces_off_floor() {
    let params = SimulationParams {
        gravity: 1.0,
        dt: 0.05,
        damping: 0.5,
        ..SimulationParams::default()
    };
    let mut system = ParticleSystem::new(single(-0.9), params).unwrap();
    let mut bounced = false;
    for _ in 0..20 {
        system.step();
        let p = system.particles();
        assert!(p.y[0] >= -1.0, "particle below floor: {}", p.y[0]);
        if p.y[0] == -1.0 {
            assert!(p.vy[0] > 0.0, "velocity not reflected: {}", p.vy[0]);
            bounced = true;
            break;
        }
    }
    assert!(bounced, "particle never reached the floor");
}
