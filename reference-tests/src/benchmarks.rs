//! Long-running validation benchmarks.
//!
//! These are marked with `#[ignore]` so they only run when explicitly
//! requested via:
//!
//! ```sh
//! cargo test --release -p reference-tests -- --ignored
//! ```

use crate::tests::project_path;
use sph_kernel::{NeighborSearch, ParticleSystem};
use sph_orchestrator::{build_system, SimulationConfig};
use std::time::Instant;

fn load_system(relative: &str, edit: impl FnOnce(&mut SimulationConfig)) -> ParticleSystem {
    let mut config = SimulationConfig::load(&project_path(relative)).expect("Failed to load config");
    edit(&mut config);
    build_system(&config).expect("Failed to build system")
}

/// Run the dam break four times longer than the reference test and print the
/// energy trace. The walls only ever remove energy, so growth comes from the
/// pressure model alone; it must stay bounded.
#[test]
#[ignore]
fn benchmark_dam_break_long_run() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .try_init();

    let mut system = load_system("configs/dam-break-2d.json", |_| {});
    let initial = system.energy_metrics();
    let mut peak_ratio = 1.0_f64;

    println!("\nDam Break Energy Trace:");
    println!("  {:>6} {:>12} {:>12} {:>12} {:>8}", "step", "KE", "PE", "total", "drift%");

    for step in 1..=1600 {
        system.step();
        let m = system.energy_metrics();
        peak_ratio = peak_ratio.max(m.total / initial.total);
        if step % 100 == 0 {
            println!(
                "  {:>6} {:>12.4e} {:>12.4e} {:>12.4e} {:>7.1}%",
                step,
                m.kinetic,
                m.potential,
                m.total,
                m.relative_drift * 100.0
            );
        }
    }

    println!("\n  Peak energy ratio: {:.2}x", peak_ratio);
    assert!(system.particles().is_finite());
    assert!(peak_ratio < 10.0, "energy grew {:.2}x", peak_ratio);

    let e = system.boundary().half_extent;
    for i in 0..system.particles().len() {
        let p = system.particles().position(i);
        assert!(p.iter().all(|c| c.abs() <= e), "particle {i} escaped: {p:?}");
    }
}

/// Grid and exhaustive search must produce the same trajectory; report the
/// speedup of the grid on the dam break.
#[test]
#[ignore]
fn benchmark_grid_against_all_pairs() {
    let steps = 100;

    let mut grid = load_system("configs/dam-break-2d.json", |_| {});
    let mut brute = load_system("configs/dam-break-2d.json", |c| {
        c.params.neighbor_search = NeighborSearch::AllPairs;
    });

    let start = Instant::now();
    for _ in 0..steps {
        grid.step();
    }
    let grid_time = start.elapsed();

    let start = Instant::now();
    for _ in 0..steps {
        brute.step();
    }
    let brute_time = start.elapsed();

    println!("\nNeighbor Search Comparison ({} steps, {} particles):", steps, grid.particles().len());
    println!("  Spatial hash: {:?}", grid_time);
    println!("  All pairs:    {:?}", brute_time);
    println!(
        "  Speedup:      {:.2}x",
        brute_time.as_secs_f64() / grid_time.as_secs_f64().max(1.0e-9)
    );

    // Summation order differs between the two searches, so allow for
    // accumulated rounding.
    let mut max_diff = 0.0_f32;
    for i in 0..grid.particles().len() {
        let a = grid.particles().position(i);
        let b = brute.particles().position(i);
        for c in 0..3 {
            max_diff = max_diff.max((a[c] - b[c]).abs());
        }
    }
    println!("  Max position difference: {:.3e}", max_diff);
    assert!(max_diff < 5.0e-2, "trajectories diverged by {max_diff}");
}

/// Serial against rayon-parallel step cost on the cube drop.
#[test]
#[ignore]
fn benchmark_parallel_speedup() {
    let steps = 300;

    let mut serial = load_system("configs/cube-drop.json", |c| c.params.parallel = false);
    let mut parallel = load_system("configs/cube-drop.json", |c| c.params.parallel = true);

    let start = Instant::now();
    for _ in 0..steps {
        serial.step();
    }
    let serial_time = start.elapsed();

    let start = Instant::now();
    for _ in 0..steps {
        parallel.step();
    }
    let parallel_time = start.elapsed();

    println!("\nParallel Speedup ({} steps, {} particles):", steps, serial.particles().len());
    println!("  Serial:   {:?}", serial_time);
    println!("  Parallel: {:?} on {} threads", parallel_time, available_threads());
    println!(
        "  Speedup:  {:.2}x",
        serial_time.as_secs_f64() / parallel_time.as_secs_f64().max(1.0e-9)
    );

    assert!(serial.particles().is_finite());
    assert!(parallel.particles().is_finite());
}

fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
