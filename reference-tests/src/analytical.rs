//! Closed-form references for the validation scenarios.
//!
//! The integrator is semi-implicit Euler, so the free-fall references are the
//! exact discrete trajectories rather than the continuous parabola:
//!
//! ```text
//! v_n = -g * dt * n
//! y_n = y_0 - g * dt^2 * n * (n + 1) / 2
//! ```

use sph_kernel::cubic_spline;

/// Velocity along the up axis after `steps` steps of free fall from rest.
pub fn free_fall_velocity(gravity: f32, dt: f32, steps: u64) -> f32 {
    -(gravity as f64 * dt as f64 * steps as f64) as f32
}

/// Height after `steps` steps of free fall from rest at `initial_height`.
pub fn free_fall_height(initial_height: f32, gravity: f32, dt: f32, steps: u64) -> f32 {
    let n = steps as f64;
    let drop = gravity as f64 * (dt as f64).powi(2) * n * (n + 1.0) / 2.0;
    (initial_height as f64 - drop) as f32
}

/// Continuous-time height `y0 - g t^2 / 2`, for comparison with the discrete one.
pub fn ballistic_height(initial_height: f32, gravity: f32, time: f64) -> f32 {
    (initial_height as f64 - 0.5 * gravity as f64 * time * time) as f32
}

/// Density of each particle of an isolated pair at separation `r`,
/// including the self contribution.
pub fn pair_density(mass: f32, r: f32, h: f32) -> f32 {
    mass * (cubic_spline(0.0, h) + cubic_spline(r, h))
}
