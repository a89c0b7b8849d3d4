//! Background stepping of a particle system.
//!
//! [`SimulationRunner`] moves the kernel onto its own thread and exposes
//! start/pause/resume/stop plus progress counters. The thread owns the kernel
//! outright; readers only ever receive owned [`Snapshot`] copies published
//! into a shared slot every `snapshot_interval` steps.

use sph_kernel::{EnergyMetrics, SimulationKernel, Snapshot};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::RunnerError;

/// Runner state enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerState {
    /// Simulation created but not yet started
    Created,
    /// Simulation actively running
    Running,
    /// Simulation paused
    Paused,
    /// Simulation finished (reached stopping condition or stopped)
    Finished,
    /// Simulation produced an unusable state and stopped
    Error,
}

/// Stopping conditions and publishing cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunLimits {
    /// Stop after this many timesteps
    pub max_timesteps: Option<u64>,
    /// Stop after this much simulated time
    pub max_time: Option<f64>,
    /// Publish a snapshot every this many steps (at least 1)
    pub snapshot_interval: u64,
}

/// Shared state between the runner thread and control interface
struct SharedState {
    /// Current runner state
    state: RunnerState,
    /// Current simulation time
    sim_time: f64,
    /// Number of timesteps executed
    timestep_count: u64,
    /// Failure that moved the runner into `Error`
    error: Option<RunnerError>,
    /// Set by `stop()`/drop; the thread publishes, then marks `Finished`
    stop_requested: bool,
    /// Most recently published snapshot
    snapshot: Arc<Snapshot>,
    /// Diagnostics captured with the snapshot
    metrics: EnergyMetrics,
}

/// Handle for controlling and querying a running simulation
pub struct SimulationRunner {
    /// Shared state (protected by mutex)
    shared: Arc<Mutex<SharedState>>,
    /// Handle to the background thread
    thread_handle: Option<thread::JoinHandle<()>>,
}

fn lock(shared: &Mutex<SharedState>) -> MutexGuard<'_, SharedState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SimulationRunner {
    /// Create a new simulation runner with the given kernel
    ///
    /// The initial state is published immediately as snapshot version 0.
    ///
    /// # Arguments
    /// * `kernel` - The simulation kernel to run
    /// * `limits` - Stopping conditions and snapshot cadence
    pub fn new(mut kernel: Box<dyn SimulationKernel + Send>, limits: RunLimits) -> Self {
        let shared = Arc::new(Mutex::new(SharedState {
            state: RunnerState::Created,
            sim_time: kernel.sim_time(),
            timestep_count: kernel.steps_taken(),
            error: None,
            stop_requested: false,
            snapshot: Arc::new(kernel.snapshot()),
            metrics: kernel.energy_metrics(),
        }));

        let shared_clone = Arc::clone(&shared);

        // Spawn background thread
        let thread_handle = thread::spawn(move || {
            run_simulation_loop(kernel.as_mut(), shared_clone, limits);
        });

        Self {
            shared,
            thread_handle: Some(thread_handle),
        }
    }

    /// Get current runner state
    pub fn state(&self) -> RunnerState {
        lock(&self.shared).state.clone()
    }

    /// Get current simulation time
    pub fn sim_time(&self) -> f64 {
        lock(&self.shared).sim_time
    }

    /// Get current timestep count
    pub fn timestep_count(&self) -> u64 {
        lock(&self.shared).timestep_count
    }

    /// Get the error if state is Error
    pub fn error(&self) -> Option<RunnerError> {
        lock(&self.shared).error.clone()
    }

    /// Latest published snapshot, as an owned copy
    pub fn latest_snapshot(&self) -> Snapshot {
        let snapshot = Arc::clone(&lock(&self.shared).snapshot);
        Snapshot::clone(&snapshot)
    }

    /// Version of the latest published snapshot
    ///
    /// Cheap way for a reader to check for a new frame before copying it.
    pub fn snapshot_version(&self) -> u64 {
        lock(&self.shared).snapshot.version
    }

    /// Diagnostics captured with the latest snapshot
    pub fn latest_metrics(&self) -> EnergyMetrics {
        lock(&self.shared).metrics
    }

    /// Pause the simulation
    pub fn pause(&self) {
        let mut state = lock(&self.shared);
        if state.state == RunnerState::Running {
            state.state = RunnerState::Paused;
        }
    }

    /// Resume the simulation
    pub fn resume(&self) {
        let mut state = lock(&self.shared);
        if state.state == RunnerState::Paused {
            state.state = RunnerState::Running;
        }
    }

    /// Start the simulation (transition from Created to Running)
    pub fn start(&self) {
        let mut state = lock(&self.shared);
        if state.state == RunnerState::Created {
            state.state = RunnerState::Running;
        }
    }

    /// Ask the simulation thread to finish after its current step
    ///
    /// The state turns `Finished` only once the thread has published the
    /// final snapshot.
    pub fn stop(&self) {
        lock(&self.shared).stop_requested = true;
    }

    /// Wait for the simulation thread to complete
    pub fn join(mut self) -> Result<(), RunnerError> {
        if let Some(handle) = self.thread_handle.take() {
            handle.join().map_err(|_| RunnerError::ThreadPanicked)?;
        }
        match lock(&self.shared).error.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for SimulationRunner {
    fn drop(&mut self) {
        // Signal the thread to wrap up
        lock(&self.shared).stop_requested = true;
    }
}

fn publish(kernel: &dyn SimulationKernel, shared: &Mutex<SharedState>) {
    let snapshot = Arc::new(kernel.snapshot());
    let metrics = kernel.energy_metrics();
    let mut guard = lock(shared);
    guard.snapshot = snapshot;
    guard.metrics = metrics;
}

/// Publish the final state and mark the run `Finished` under one lock, so a
/// reader that observes `Finished` also observes the last snapshot.
fn finish(kernel: &dyn SimulationKernel, shared: &Mutex<SharedState>) {
    let snapshot = Arc::new(kernel.snapshot());
    let metrics = kernel.energy_metrics();
    let mut guard = lock(shared);
    guard.snapshot = snapshot;
    guard.metrics = metrics;
    if guard.state != RunnerState::Error {
        guard.state = RunnerState::Finished;
    }
}

/// Main simulation loop executed in background thread
fn run_simulation_loop(
    kernel: &mut dyn SimulationKernel,
    shared: Arc<Mutex<SharedState>>,
    limits: RunLimits,
) {
    // Wait for start signal
    loop {
        let (state, stop_requested) = {
            let guard = lock(&shared);
            (guard.state.clone(), guard.stop_requested)
        };
        if stop_requested {
            finish(kernel, &shared);
            return;
        }

        match state {
            RunnerState::Created => {
                // Wait a bit and check again
                thread::sleep(Duration::from_millis(10));
            }
            RunnerState::Running => break,
            _ => return,
        }
    }

    let start_wall_time = Instant::now();
    let interval = limits.snapshot_interval.max(1);

    loop {
        // Check state
        let (current_state, stop_requested) = {
            let guard = lock(&shared);
            (guard.state.clone(), guard.stop_requested)
        };
        if stop_requested {
            tracing::info!("Simulation stopped at step {}", kernel.steps_taken());
            break;
        }

        match current_state {
            RunnerState::Running => {
                // Execute one timestep
                kernel.step();

                let timestep_count = kernel.steps_taken();
                let sim_time = kernel.sim_time();

                // Update shared state
                {
                    let mut guard = lock(&shared);
                    guard.sim_time = sim_time;
                    guard.timestep_count = timestep_count;
                }

                if !kernel.particles().is_finite() {
                    tracing::warn!(
                        "Non-finite particle state at step {}, stopping",
                        timestep_count
                    );
                    publish(kernel, &shared);
                    let mut guard = lock(&shared);
                    guard.state = RunnerState::Error;
                    guard.error = Some(RunnerError::NonFinite {
                        step: timestep_count,
                    });
                    break;
                }

                let reached_steps = limits
                    .max_timesteps
                    .is_some_and(|max_steps| timestep_count >= max_steps);
                let reached_time = limits.max_time.is_some_and(|max_t| sim_time >= max_t);

                if timestep_count % interval == 0 && !(reached_steps || reached_time) {
                    publish(kernel, &shared);
                }

                // Check stopping conditions
                if reached_steps || reached_time {
                    if reached_steps {
                        tracing::info!(
                            "Simulation finished: reached max_timesteps = {}",
                            timestep_count
                        );
                    } else {
                        tracing::info!("Simulation finished: reached max_time = {:.3}", sim_time);
                    }
                    break;
                }

                // Log progress periodically
                if timestep_count % 100 == 0 {
                    let wall_time = start_wall_time.elapsed().as_secs_f64();
                    let metrics = kernel.energy_metrics();
                    tracing::debug!(
                        "Step {}: sim_time={:.4}, energy={:.6}, wall_time={:.2}s",
                        timestep_count,
                        sim_time,
                        metrics.total,
                        wall_time,
                    );
                }
            }
            RunnerState::Paused => {
                // Wait while paused
                thread::sleep(Duration::from_millis(20));
            }
            RunnerState::Finished | RunnerState::Error | RunnerState::Created => {
                // Exit loop
                break;
            }
        }
    }

    // Final state is visible even when stopped between intervals
    finish(kernel, &shared);

    tracing::info!(
        "Simulation thread exiting: {} timesteps, {:.4} simulated, {:.2}s wall",
        kernel.steps_taken(),
        kernel.sim_time(),
        start_wall_time.elapsed().as_secs_f64(),
    );
}
