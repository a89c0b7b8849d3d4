//! Reference test framework for SPH fluid simulation validation
//!
//! Each reference test loads a shipped configuration, runs it for a fixed
//! number of steps and validates the final state against physical criteria:
//! containment, finiteness, bounded energy growth, settling and the
//! closed-form free-fall trajectory.

pub mod analytical;

#[cfg(test)]
mod benchmarks;

use sph_kernel::{EnergyMetrics, ParticleArrays, ParticleSystem};
use sph_orchestrator::{build_system, ConfigError, SimulationConfig};
use std::path::Path;

/// Expected result criteria for a reference test
#[derive(Debug, Clone, Default)]
pub struct ExpectedResult {
    /// Particle position bounds validation
    pub position_bounds: Option<PositionBoundsCheck>,
    /// Reject NaN or infinite particle state
    pub finite_state: bool,
    /// Upper bound on total energy relative to the initial energy
    pub energy_growth: Option<EnergyGrowthCheck>,
    /// Settling check (motion dies down, particles sink)
    pub settling: Option<SettlingCheck>,
    /// Compare particle 0 against ballistic free fall
    pub free_fall: Option<FreeFallCheck>,
}

/// Check that particles remain within the given bounds
#[derive(Debug, Clone)]
pub struct PositionBoundsCheck {
    /// Minimum bounds [x, y, z]
    pub min: [f32; 3],
    /// Maximum bounds [x, y, z]
    pub max: [f32; 3],
}

/// Check that the pressure model does not pump energy into the system
#[derive(Debug, Clone)]
pub struct EnergyGrowthCheck {
    /// Maximum allowed ratio of peak total energy to initial total energy
    pub max_ratio: f64,
}

/// Check that particles come to rest near the floor
#[derive(Debug, Clone)]
pub struct SettlingCheck {
    /// Final kinetic energy must be below this fraction of the peak
    pub max_kinetic_fraction: f64,
    /// Mean height along the up axis must end below this value
    pub max_mean_height: Option<f32>,
}

/// Check a lone particle against the discrete free-fall trajectory
#[derive(Debug, Clone)]
pub struct FreeFallCheck {
    /// Starting height of particle 0
    pub initial_height: f32,
    /// Absolute tolerance on height and velocity
    pub tolerance: f32,
}

/// Reference test definition
#[derive(Debug, Clone)]
pub struct ReferenceTest {
    /// Test name
    pub name: String,
    /// Path to configuration file
    pub config_path: String,
    /// Number of timesteps to run
    pub timesteps: u64,
    /// Expected results
    pub expected: ExpectedResult,
}

fn config_file(config_dir: &Path, name: &str) -> String {
    config_dir.join(name).to_string_lossy().into_owned()
}

fn domain_bounds() -> PositionBoundsCheck {
    PositionBoundsCheck {
        min: [-1.0, -1.0, -1.0],
        max: [1.0, 1.0, 1.0],
    }
}

/// Dam break: a 20x20 slab collapses under gravity. It must stay inside the
/// walls, stay finite and not gain much energy.
pub fn dam_break_test(config_dir: &Path) -> ReferenceTest {
    ReferenceTest {
        name: "Dam Break".to_string(),
        config_path: config_file(config_dir, "dam-break-2d.json"),
        timesteps: 400,
        expected: ExpectedResult {
            position_bounds: Some(domain_bounds()),
            finite_state: true,
            energy_growth: Some(EnergyGrowthCheck { max_ratio: 10.0 }),
            ..Default::default()
        },
    }
}

/// Cube drop: a viscous 6x6x6 block falls to the floor and comes to rest.
pub fn cube_drop_test(config_dir: &Path) -> ReferenceTest {
    ReferenceTest {
        name: "Cube Drop".to_string(),
        config_path: config_file(config_dir, "cube-drop.json"),
        timesteps: 1200,
        expected: ExpectedResult {
            position_bounds: Some(domain_bounds()),
            finite_state: true,
            energy_growth: Some(EnergyGrowthCheck { max_ratio: 2.0 }),
            settling: Some(SettlingCheck {
                max_kinetic_fraction: 0.05,
                max_mean_height: Some(-0.8),
            }),
            ..Default::default()
        },
    }
}

/// Free fall: a lone particle follows the discrete Euler trajectory.
pub fn free_fall_test(config_dir: &Path) -> ReferenceTest {
    ReferenceTest {
        name: "Free Fall".to_string(),
        config_path: config_file(config_dir, "free-fall.json"),
        timesteps: 100,
        expected: ExpectedResult {
            finite_state: true,
            free_fall: Some(FreeFallCheck {
                initial_height: 0.5,
                tolerance: 1.0e-4,
            }),
            ..Default::default()
        },
    }
}

/// Every scenario, reading configs from `config_dir`.
pub fn all_tests(config_dir: &Path) -> Vec<ReferenceTest> {
    vec![
        dam_break_test(config_dir),
        cube_drop_test(config_dir),
        free_fall_test(config_dir),
    ]
}

/// Energy observed over the course of a run.
#[derive(Debug, Clone, Copy)]
pub struct RunHistory {
    /// Metrics right after construction
    pub initial: EnergyMetrics,
    /// Largest kinetic energy seen after any step
    pub peak_kinetic: f64,
    /// Largest total energy seen after any step
    pub peak_total: f64,
}

impl RunHistory {
    fn new(initial: EnergyMetrics) -> Self {
        Self {
            initial,
            peak_kinetic: initial.kinetic,
            peak_total: initial.total,
        }
    }

    fn record(&mut self, metrics: &EnergyMetrics) {
        self.peak_kinetic = self.peak_kinetic.max(metrics.kinetic);
        self.peak_total = self.peak_total.max(metrics.total);
    }

    /// Peak total energy over initial total energy.
    pub fn energy_ratio(&self) -> f64 {
        if self.initial.total.abs() > 1.0e-12 {
            self.peak_total / self.initial.total
        } else {
            1.0
        }
    }
}

/// Result of running a reference test
#[derive(Debug)]
pub struct TestResult {
    /// Test name
    pub name: String,
    /// Overall pass/fail status
    pub passed: bool,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Final energy metrics
    pub metrics: EnergyMetrics,
    /// Energy history of the run
    pub history: RunHistory,
    /// Number of timesteps executed
    pub timesteps: u64,
    /// Simulation time reached
    pub sim_time: f64,
}

/// Individual check result
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Check name
    pub name: String,
    /// Pass/fail status
    pub passed: bool,
    /// Optional detail message
    pub message: Option<String>,
}

impl CheckResult {
    fn pass(name: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(name: &str, message: String) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: Some(message),
        }
    }
}

impl ReferenceTest {
    /// Run the reference test
    pub fn run(&self) -> Result<TestResult, ConfigError> {
        tracing::info!("Running reference test: {}", self.name);

        let config = SimulationConfig::load(&self.config_path)?;
        let mut system = build_system(&config)?;

        tracing::info!(
            "Initialized: {} particles, h={}, dt={}",
            system.particles().len(),
            system.params().h,
            system.params().dt,
        );

        let mut history = RunHistory::new(system.energy_metrics());
        let progress_interval = (self.timesteps / 10).max(1);

        for step in 1..=self.timesteps {
            system.step();
            let metrics = system.energy_metrics();
            history.record(&metrics);

            if step % progress_interval == 0 {
                tracing::info!(
                    "Progress: {}/{} steps ({:.0}%), KE={:.4e}, drift={:+.3}",
                    step,
                    self.timesteps,
                    step as f64 / self.timesteps as f64 * 100.0,
                    metrics.kinetic,
                    metrics.relative_drift,
                );
            }
        }

        let checks = self.validate(&system, &history);
        let passed = checks.iter().all(|c| c.passed);

        Ok(TestResult {
            name: self.name.clone(),
            passed,
            checks,
            metrics: system.energy_metrics(),
            history,
            timesteps: system.steps(),
            sim_time: system.sim_time(),
        })
    }

    fn validate(&self, system: &ParticleSystem, history: &RunHistory) -> Vec<CheckResult> {
        let particles = system.particles();
        let params = system.params();
        let mut checks = Vec::new();

        if let Some(ref bounds) = self.expected.position_bounds {
            checks.push(validate_position_bounds(particles, bounds));
        }

        if self.expected.finite_state {
            checks.push(validate_finite_state(particles));
        }

        if let Some(ref growth) = self.expected.energy_growth {
            checks.push(validate_energy_growth(history, growth));
        }

        if let Some(ref settling) = self.expected.settling {
            let up = params.up_axis.index();
            checks.push(validate_settling(
                particles,
                &system.energy_metrics(),
                history,
                up,
                settling,
            ));
        }

        if let Some(ref fall) = self.expected.free_fall {
            checks.push(validate_free_fall(
                particles,
                params.up_axis.index(),
                params.gravity,
                params.dt,
                system.steps(),
                fall,
            ));
        }

        checks
    }
}

fn validate_position_bounds(
    particles: &ParticleArrays,
    bounds: &PositionBoundsCheck,
) -> CheckResult {
    let mut violations = 0;
    let mut max_violation = 0.0_f32;

    for i in 0..particles.len() {
        let pos = particles.position(i);

        for axis in 0..3 {
            if pos[axis] < bounds.min[axis] {
                violations += 1;
                max_violation = max_violation.max(bounds.min[axis] - pos[axis]);
            }
            if pos[axis] > bounds.max[axis] {
                violations += 1;
                max_violation = max_violation.max(pos[axis] - bounds.max[axis]);
            }
        }
    }

    if violations == 0 {
        CheckResult::pass("Position Bounds")
    } else {
        CheckResult::fail(
            "Position Bounds",
            format!(
                "{} coordinates out of bounds (max violation: {:.6})",
                violations, max_violation
            ),
        )
    }
}

fn validate_finite_state(particles: &ParticleArrays) -> CheckResult {
    if particles.is_finite() {
        return CheckResult::pass("Finite State");
    }

    let bad = (0..particles.len())
        .filter(|&i| {
            particles.position(i).iter().any(|c| !c.is_finite())
                || particles.velocity(i).iter().any(|c| !c.is_finite())
        })
        .count();
    CheckResult::fail(
        "Finite State",
        format!("{} particles with non-finite position or velocity", bad),
    )
}

fn validate_energy_growth(history: &RunHistory, check: &EnergyGrowthCheck) -> CheckResult {
    let ratio = history.energy_ratio();
    if ratio.is_finite() && ratio <= check.max_ratio {
        CheckResult::pass("Energy Growth")
    } else {
        CheckResult::fail(
            "Energy Growth",
            format!(
                "peak energy {:.4e} is {:.2}x the initial {:.4e} (limit {:.2}x)",
                history.peak_total, ratio, history.initial.total, check.max_ratio
            ),
        )
    }
}

fn validate_settling(
    particles: &ParticleArrays,
    metrics: &EnergyMetrics,
    history: &RunHistory,
    up_axis: usize,
    check: &SettlingCheck,
) -> CheckResult {
    let limit = check.max_kinetic_fraction * history.peak_kinetic;
    if metrics.kinetic.is_nan() || metrics.kinetic > limit {
        return CheckResult::fail(
            "Settling",
            format!(
                "final KE {:.4e} exceeds {:.1}% of peak {:.4e}",
                metrics.kinetic,
                check.max_kinetic_fraction * 100.0,
                history.peak_kinetic
            ),
        );
    }

    if let Some(max_mean) = check.max_mean_height {
        let n = particles.len().max(1);
        let mean = (0..particles.len())
            .map(|i| particles.position(i)[up_axis])
            .sum::<f32>()
            / n as f32;
        if mean > max_mean {
            return CheckResult::fail(
                "Settling",
                format!("mean height {:.4} above {:.4}", mean, max_mean),
            );
        }
    }

    CheckResult::pass("Settling")
}

fn validate_free_fall(
    particles: &ParticleArrays,
    up_axis: usize,
    gravity: f32,
    dt: f32,
    steps: u64,
    check: &FreeFallCheck,
) -> CheckResult {
    if particles.is_empty() {
        return CheckResult::fail("Free Fall", "no particles".to_string());
    }

    let expected_height = analytical::free_fall_height(check.initial_height, gravity, dt, steps);
    let expected_velocity = analytical::free_fall_velocity(gravity, dt, steps);
    let height = particles.position(0)[up_axis];
    let velocity = particles.velocity(0)[up_axis];

    let height_error = (height - expected_height).abs();
    let velocity_error = (velocity - expected_velocity).abs();
    if height_error <= check.tolerance && velocity_error <= check.tolerance {
        CheckResult::pass("Free Fall")
    } else {
        CheckResult::fail(
            "Free Fall",
            format!(
                "height {:.6} (expected {:.6}), velocity {:.6} (expected {:.6})",
                height, expected_height, velocity, expected_velocity
            ),
        )
    }
}

impl TestResult {
    /// Print a summary of the test result
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(80));
        println!("Test: {}", self.name);
        println!("{}", "=".repeat(80));
        println!("Status: {}", if self.passed { "PASSED" } else { "FAILED" });
        println!("Timesteps: {}", self.timesteps);
        println!("Simulated time: {:.6}", self.sim_time);
        println!("\nEnergy:");
        println!("  Kinetic: {:.4e} (peak {:.4e})", self.metrics.kinetic, self.history.peak_kinetic);
        println!("  Potential: {:.4e}", self.metrics.potential);
        println!("  Total drift: {:+.1}%", self.metrics.relative_drift * 100.0);
        println!("  Peak/initial: {:.2}x", self.history.energy_ratio());
        println!("  Max density variation: {:.2}%", self.metrics.max_density_variation * 100.0);
        println!("\nValidation Checks:");
        for check in &self.checks {
            let status = if check.passed { "PASS" } else { "FAIL" };
            print!("  [{}] {}", status, check.name);
            if let Some(ref msg) = check.message {
                print!(" - {}", msg);
            }
            println!();
        }
        println!("{}", "=".repeat(80));
    }
}
