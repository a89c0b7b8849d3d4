//! SPH smoothing kernel functions and core SPH operators.
//!
//! Implements the cubic-spline-family kernel and its radial derivative, plus
//! the per-step passes: density summation, equation of state, symmetric
//! pressure forces with optional artificial viscosity, acceleration
//! finalization and semi-implicit Euler integration.
//!
//! Radius convention: `h` is the smoothing length and the kernel support
//! (zero-crossing distance) is `2h`. The doubling lives in [`support_radius`],
//! never inside the kernel itself.

use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::eos::linear_eos;
use crate::neighbor::Candidates;
use crate::params::SimulationParams;
use crate::particle::ParticleArrays;

/// Value of `integral 4 pi r^2 W(r, h) dr` over `[0, 2h]` for [`cubic_spline`].
///
/// The kernel keeps the `1 / (6 h^3)` scaling it was tuned with, so it
/// integrates to `2 pi / 3` rather than 1. The constant is independent of `h`.
pub const KERNEL_VOLUME_INTEGRAL: f32 = 2.0 * PI / 3.0;

/// Separation below which two particles are treated as coincident.
pub const COINCIDENT_EPSILON: f32 = 1.0e-5;

/// Densities at or below this are treated as zero (isolated particle).
pub const DENSITY_EPSILON: f32 = 1.0e-12;

/// Kernel support radius for smoothing length `h`.
#[inline]
pub fn support_radius(h: f32) -> f32 {
    2.0 * h
}

/// Cubic-spline smoothing kernel.
///
/// ```text
/// W(r, h) = (4 - 6q^2 + 3q^3) / (6h^3)   for 0 <= q <= 1
/// W(r, h) = (2 - q)^3 / (6h^3)           for 1 <  q <= 2
/// W(r, h) = 0                            for q > 2
/// ```
/// with `q = r / h`. Non-negative everywhere, continuous at `q = 1` and `q = 2`.
///
/// # Arguments
/// * `r` - Distance between two particles (must be >= 0).
/// * `h` - Smoothing length. The support radius is 2h.
pub fn cubic_spline(r: f32, h: f32) -> f32 {
    let q = r / h;
    let h3 = h * h * h;
    if q <= 1.0 {
        (4.0 - 6.0 * q * q + 3.0 * q * q * q) / (6.0 * h3)
    } else if q <= 2.0 {
        let t = 2.0 - q;
        t * t * t / (6.0 * h3)
    } else {
        0.0
    }
}

/// Radial derivative `dW/dr` of [`cubic_spline`].
///
/// ```text
/// dW(r, h) = (-12q + 9q^2) / (6h^4)   for 0 <= q <= 1
/// dW(r, h) = -3(2 - q)^2 / (6h^4)     for 1 <  q <= 2
/// dW(r, h) = 0                        for q > 2
/// ```
///
/// Never positive: the gradient always points back towards the kernel center.
/// The pressure pass multiplies it with `normalize(p_i - p_j)`.
pub fn cubic_spline_derivative(r: f32, h: f32) -> f32 {
    let q = r / h;
    let h4 = h * h * h * h;
    if q <= 1.0 {
        (-12.0 * q + 9.0 * q * q) / (6.0 * h4)
    } else if q <= 2.0 {
        let t = 2.0 - q;
        -3.0 * t * t / (6.0 * h4)
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Density summation
// ---------------------------------------------------------------------------

/// Compute density for all particles.
///
/// ```text
/// rho_i = sum_j m * W(|r_i - r_j|, h)
/// ```
///
/// Serially, each unordered pair is evaluated once (`j > i`) and added to both
/// sides. In parallel, each particle gathers over all its candidates so that it
/// is the only writer of its own density. The self term `m * W(0, h)` is
/// included when `params.self_density` is set.
pub fn compute_density(
    particles: &mut ParticleArrays,
    candidates: &Candidates<'_>,
    params: &SimulationParams,
) {
    let h = params.h;
    let m = params.mass;
    let self_term = if params.self_density {
        m * cubic_spline(0.0, h)
    } else {
        0.0
    };

    let ParticleArrays { x, y, z, density, .. } = particles;
    let (x, y, z) = (x.as_slice(), y.as_slice(), z.as_slice());

    if params.parallel {
        density.par_iter_mut().enumerate().for_each(|(i, rho)| {
            let mut sum = self_term;
            candidates.for_each([x[i], y[i], z[i]], |j| {
                if j != i {
                    let r = distance(x, y, z, i, j);
                    sum += m * cubic_spline(r, h);
                }
            });
            *rho = sum;
        });
        return;
    }

    density.fill(self_term);
    for i in 0..x.len() {
        candidates.for_each([x[i], y[i], z[i]], |j| {
            if j <= i {
                return;
            }
            let w = m * cubic_spline(distance(x, y, z, i, j), h);
            if w > 0.0 {
                density[i] += w;
                density[j] += w;
            }
        });
    }
}

/// Compute pressure from density with the linear equation of state.
pub fn compute_pressure(particles: &mut ParticleArrays, rest_density: f32, stiffness: f32) {
    for (p, &rho) in particles.pressure.iter_mut().zip(&particles.density) {
        *p = linear_eos(rho, rest_density, stiffness);
    }
}

// ---------------------------------------------------------------------------
// Pressure forces and viscosity
// ---------------------------------------------------------------------------

/// Counters from one force pass, reported in debug logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairStats {
    /// Pairs within the kernel support that were evaluated.
    pub interacting_pairs: usize,
    /// Pairs whose separation fell below [`COINCIDENT_EPSILON`].
    pub coincident_pairs: usize,
}

/// Per-step inputs of the pair force pass.
#[derive(Debug, Clone, Copy)]
pub struct ForceContext {
    /// Smoothing length.
    pub h: f32,
    /// Uniform particle mass.
    pub mass: f32,
    /// Viscosity coefficient, or `None` when viscosity is disabled.
    pub viscosity: Option<f32>,
    /// Time step used to integrate the viscosity correction.
    pub dt: f32,
    /// Seed for coincident-pair directions.
    pub seed: u64,
    /// Step counter, mixed into coincident-pair directions.
    pub step: u64,
}

impl ForceContext {
    /// Build a context from the simulation parameters.
    pub fn new(params: &SimulationParams, dt: f32, step: u64) -> Self {
        Self {
            h: params.h,
            mass: params.mass,
            viscosity: params.viscosity_enabled.then_some(params.viscosity),
            dt,
            seed: params.seed,
            step,
        }
    }
}

/// Accumulate symmetric pressure accelerations into `ax, ay, az`.
///
/// For every unordered pair `i < j` within the kernel support:
/// ```text
/// da = (P_i / rho_i^2 + P_j / rho_j^2) * dW(r, h) * normalize(r_i - r_j)
/// a_i -= da
/// a_j += da
/// ```
///
/// Coincident particles get a pseudo-random unit direction derived from
/// `(seed, step, i, j)`, so the serial and parallel paths agree. When
/// viscosity is enabled, the correction
/// ```text
/// dv = 2 mu m / (rho_i + rho_j) * (v_j - v_i) * dW(r, h)
/// ```
/// is integrated into the velocities immediately (`v_i -= dv dt`,
/// `v_j += dv dt`).
///
/// Accelerations are zeroed first. They are *not* divided by density here; see
/// [`finalize_accelerations`].
pub fn accumulate_pair_forces(
    particles: &mut ParticleArrays,
    candidates: &Candidates<'_>,
    ctx: &ForceContext,
    parallel: bool,
) -> PairStats {
    if parallel {
        return accumulate_pair_forces_parallel(particles, candidates, ctx);
    }

    let n = particles.len();
    let support = support_radius(ctx.h);
    let mut stats = PairStats::default();

    let ParticleArrays {
        x,
        y,
        z,
        vx,
        vy,
        vz,
        ax,
        ay,
        az,
        density,
        pressure,
        ..
    } = particles;

    let (x, y, z) = (x.as_slice(), y.as_slice(), z.as_slice());
    let (density, pressure) = (density.as_slice(), pressure.as_slice());

    ax.fill(0.0);
    ay.fill(0.0);
    az.fill(0.0);

    for i in 0..n {
        candidates.for_each([x[i], y[i], z[i]], |j| {
            if j <= i {
                return;
            }
            let Some(pair) = evaluate_pair(x, y, z, density, pressure, i, j, support, ctx) else {
                return;
            };
            stats.interacting_pairs += 1;
            stats.coincident_pairs += pair.coincident as usize;

            ax[i] -= pair.accel[0];
            ay[i] -= pair.accel[1];
            az[i] -= pair.accel[2];
            ax[j] += pair.accel[0];
            ay[j] += pair.accel[1];
            az[j] += pair.accel[2];

            if let Some(coeff) = pair.viscosity_coeff {
                let dvx = coeff * (vx[j] - vx[i]) * ctx.dt;
                let dvy = coeff * (vy[j] - vy[i]) * ctx.dt;
                let dvz = coeff * (vz[j] - vz[i]) * ctx.dt;
                vx[i] -= dvx;
                vy[i] -= dvy;
                vz[i] -= dvz;
                vx[j] += dvx;
                vy[j] += dvy;
                vz[j] += dvz;
            }
        });
    }

    stats
}

/// Gather form of [`accumulate_pair_forces`]: every particle sums over all of its
/// neighbors and writes only its own accumulator. Each pair is evaluated twice.
/// Viscosity reads velocities as they were before the pass.
fn accumulate_pair_forces_parallel(
    particles: &mut ParticleArrays,
    candidates: &Candidates<'_>,
    ctx: &ForceContext,
) -> PairStats {
    let n = particles.len();
    let support = support_radius(ctx.h);

    let results: Vec<([f32; 3], [f32; 3], PairStats)> = {
        let p = &*particles;
        (0..n)
            .into_par_iter()
            .map(|k| {
                let mut acc = [0.0f32; 3];
                let mut dv = [0.0f32; 3];
                let mut stats = PairStats::default();
                candidates.for_each([p.x[k], p.y[k], p.z[k]], |l| {
                    if l == k {
                        return;
                    }
                    let (lo, hi) = if k < l { (k, l) } else { (l, k) };
                    let Some(pair) = evaluate_pair(
                        &p.x, &p.y, &p.z, &p.density, &p.pressure, lo, hi, support, ctx,
                    ) else {
                        return;
                    };
                    // The lower index receives -da, the higher +da.
                    let sign = if k == lo { -1.0 } else { 1.0 };
                    if k == lo {
                        stats.interacting_pairs += 1;
                        stats.coincident_pairs += pair.coincident as usize;
                    }
                    for c in 0..3 {
                        acc[c] += sign * pair.accel[c];
                    }
                    if let Some(coeff) = pair.viscosity_coeff {
                        let rel = [
                            p.vx[hi] - p.vx[lo],
                            p.vy[hi] - p.vy[lo],
                            p.vz[hi] - p.vz[lo],
                        ];
                        for c in 0..3 {
                            dv[c] += sign * coeff * rel[c] * ctx.dt;
                        }
                    }
                });
                (acc, dv, stats)
            })
            .collect()
    };

    let mut total = PairStats::default();
    for (k, (acc, dv, stats)) in results.into_iter().enumerate() {
        particles.ax[k] = acc[0];
        particles.ay[k] = acc[1];
        particles.az[k] = acc[2];
        particles.vx[k] += dv[0];
        particles.vy[k] += dv[1];
        particles.vz[k] += dv[2];
        total.interacting_pairs += stats.interacting_pairs;
        total.coincident_pairs += stats.coincident_pairs;
    }
    total
}

/// Contribution of one ordered pair `lo < hi`.
struct PairTerm {
    accel: [f32; 3],
    viscosity_coeff: Option<f32>,
    coincident: bool,
}

#[allow(clippy::too_many_arguments)]
#[inline]
fn evaluate_pair(
    x: &[f32],
    y: &[f32],
    z: &[f32],
    density: &[f32],
    pressure: &[f32],
    lo: usize,
    hi: usize,
    support: f32,
    ctx: &ForceContext,
) -> Option<PairTerm> {
    let dx = x[lo] - x[hi];
    let dy = y[lo] - y[hi];
    let dz = z[lo] - z[hi];
    let r = (dx * dx + dy * dy + dz * dz).sqrt();
    if r >= support {
        return None;
    }

    let coincident = r < COINCIDENT_EPSILON;
    let dir = if coincident {
        coincident_direction(ctx.seed, ctx.step, lo, hi)
    } else {
        let inv_r = 1.0 / r;
        [dx * inv_r, dy * inv_r, dz * inv_r]
    };

    let dw = cubic_spline_derivative(r, ctx.h);
    let coeff = (pressure_term(pressure[lo], density[lo])
        + pressure_term(pressure[hi], density[hi]))
        * dw;

    let viscosity_coeff = ctx.viscosity.and_then(|mu| {
        let rho_sum = density[lo] + density[hi];
        (rho_sum > DENSITY_EPSILON).then(|| 2.0 * mu * ctx.mass / rho_sum * dw)
    });

    Some(PairTerm {
        accel: [coeff * dir[0], coeff * dir[1], coeff * dir[2]],
        viscosity_coeff,
        coincident,
    })
}

/// `P / rho^2`, or zero for an empty density.
#[inline]
fn pressure_term(p: f32, rho: f32) -> f32 {
    if rho > DENSITY_EPSILON {
        p / (rho * rho)
    } else {
        0.0
    }
}

/// Uniformly distributed unit vector for a coincident pair.
///
/// Deterministic in `(seed, step, lo, hi)` and independent of evaluation order.
pub fn coincident_direction(seed: u64, step: u64, lo: usize, hi: usize) -> [f32; 3] {
    let pair = ((lo as u64) << 32) ^ (hi as u64);
    let mixed = seed
        ^ step.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ pair.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    let mut rng = StdRng::seed_from_u64(mixed);
    let cz: f32 = rng.gen_range(-1.0..=1.0);
    let phi: f32 = rng.gen_range(0.0..2.0 * PI);
    let s = (1.0 - cz * cz).max(0.0).sqrt();
    [s * phi.cos(), s * phi.sin(), cz]
}

// ---------------------------------------------------------------------------
// Finalization and integration
// ---------------------------------------------------------------------------

/// Divide accumulated pressure accelerations by density and apply gravity.
///
/// Particles with no density (isolated, no self term) keep gravity only.
/// Returns the number of such particles.
pub fn finalize_accelerations(
    particles: &mut ParticleArrays,
    gravity: f32,
    up_axis: usize,
) -> usize {
    let mut isolated = 0;
    for i in 0..particles.len() {
        let rho = particles.density[i];
        if rho > DENSITY_EPSILON {
            let inv = 1.0 / rho;
            particles.ax[i] *= inv;
            particles.ay[i] *= inv;
            particles.az[i] *= inv;
        } else {
            particles.ax[i] = 0.0;
            particles.ay[i] = 0.0;
            particles.az[i] = 0.0;
            isolated += 1;
        }
        match up_axis {
            0 => particles.ax[i] -= gravity,
            1 => particles.ay[i] -= gravity,
            _ => particles.az[i] -= gravity,
        }
    }
    isolated
}

/// Zero velocity and acceleration along `axis`, keeping particles in the
/// plane they started in.
pub fn constrain_to_plane(particles: &mut ParticleArrays, axis: usize) {
    let (v, a) = match axis {
        0 => (&mut particles.vx, &mut particles.ax),
        1 => (&mut particles.vy, &mut particles.ay),
        _ => (&mut particles.vz, &mut particles.az),
    };
    v.fill(0.0);
    a.fill(0.0);
}

/// Semi-implicit Euler: `v += a dt`, then `x += v dt`.
pub fn integrate(particles: &mut ParticleArrays, dt: f32) {
    for i in 0..particles.len() {
        particles.vx[i] += particles.ax[i] * dt;
        particles.vy[i] += particles.ay[i] * dt;
        particles.vz[i] += particles.az[i] * dt;
        particles.x[i] += particles.vx[i] * dt;
        particles.y[i] += particles.vy[i] * dt;
        particles.z[i] += particles.vz[i] * dt;
    }
}

#[inline]
fn distance(x: &[f32], y: &[f32], z: &[f32], i: usize, j: usize) -> f32 {
    let dx = x[i] - x[j];
    let dy = y[i] - y[j];
    let dz = z[i] - z[j];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(separation: f32) -> ParticleArrays {
        let mut p = ParticleArrays::new();
        p.push_particle([0.0, 0.0, 0.0], [0.0; 3], 1.0);
        p.push_particle([separation, 0.0, 0.0], [0.0; 3], 1.0);
        p
    }

    #[test]
    fn kernel_at_zero_distance() {
        let w = cubic_spline(0.0, 1.0);
        assert!((w - 4.0 / 6.0).abs() < 1.0e-6, "w={w}");
    }

    #[test]
    fn kernel_at_support_radius() {
        let h = 0.1;
        let w = cubic_spline(support_radius(h), h);
        assert!(w.abs() < 1.0e-6, "kernel should vanish at 2h, got {w}");
    }

    #[test]
    fn kernel_beyond_support() {
        assert_eq!(cubic_spline(0.5, 0.1), 0.0);
        assert_eq!(cubic_spline_derivative(0.5, 0.1), 0.0);
    }

    #[test]
    fn kernel_continuous_at_q_one() {
        let h = 0.5;
        let eps = 1.0e-4;
        let below = cubic_spline(h * (1.0 - eps), h);
        let above = cubic_spline(h * (1.0 + eps), h);
        assert!((below - above).abs() < 1.0e-3, "{below} vs {above}");
        let d_below = cubic_spline_derivative(h * (1.0 - eps), h);
        let d_above = cubic_spline_derivative(h * (1.0 + eps), h);
        assert!((d_below - d_above).abs() < 1.0e-2, "{d_below} vs {d_above}");
    }

    #[test]
    fn kernel_non_negative_and_derivative_non_positive() {
        let h = 0.1;
        for i in 0..=250 {
            let r = i as f32 * 0.001;
            assert!(cubic_spline(r, h) >= 0.0, "W negative at r={r}");
            assert!(cubic_spline_derivative(r, h) <= 0.0, "dW positive at r={r}");
        }
    }

    #[test]
    fn derivative_is_zero_at_origin() {
        assert_eq!(cubic_spline_derivative(0.0, 0.3), 0.0);
    }

    #[test]
    fn serial_density_counts_each_pair_once() {
        let params = SimulationParams {
            h: 1.0,
            mass: 1.0,
            ..SimulationParams::default()
        };
        let mut p = pair(0.5);
        compute_density(&mut p, &Candidates::AllPairs { count: 2 }, &params);
        let expected = cubic_spline(0.0, 1.0) + cubic_spline(0.5, 1.0);
        assert!((p.density[0] - expected).abs() < 1.0e-6);
        assert!((p.density[1] - expected).abs() < 1.0e-6);
    }

    #[test]
    fn density_without_self_term() {
        let params = SimulationParams {
            h: 1.0,
            self_density: false,
            ..SimulationParams::default()
        };
        let mut p = pair(3.0);
        compute_density(&mut p, &Candidates::AllPairs { count: 2 }, &params);
        assert_eq!(p.density, vec![0.0, 0.0]);
    }

    #[test]
    fn pressure_uses_linear_eos() {
        let mut p = pair(0.5);
        p.density = vec![210.0, 190.0];
        compute_pressure(&mut p, 200.0, 2.0);
        assert!((p.pressure[0] - 20.0).abs() < 1.0e-4);
        assert!((p.pressure[1] + 20.0).abs() < 1.0e-4);
    }

    #[test]
    fn raw_pair_accelerations_cancel_for_unequal_densities() {
        let mut p = pair(0.7);
        p.density = vec![3.0, 0.4];
        p.pressure = vec![5.0, -2.0];
        let ctx = ForceContext {
            h: 1.0,
            mass: 1.0,
            viscosity: None,
            dt: 0.01,
            seed: 1,
            step: 0,
        };
        let stats = accumulate_pair_forces(&mut p, &Candidates::AllPairs { count: 2 }, &ctx, false);
        assert_eq!(stats.interacting_pairs, 1);
        assert_eq!(p.ax[0] + p.ax[1], 0.0);
        assert_eq!(p.ay[0] + p.ay[1], 0.0);
        assert_eq!(p.az[0] + p.az[1], 0.0);
    }

    #[test]
    fn positive_pressure_repels() {
        let mut p = pair(0.5);
        p.density = vec![1.0, 1.0];
        p.pressure = vec![1.0, 1.0];
        let ctx = ForceContext {
            h: 1.0,
            mass: 1.0,
            viscosity: None,
            dt: 0.01,
            seed: 1,
            step: 0,
        };
        accumulate_pair_forces(&mut p, &Candidates::AllPairs { count: 2 }, &ctx, false);
        // Particle 0 sits at the origin, particle 1 at +x.
        assert!(p.ax[0] < 0.0, "ax0={}", p.ax[0]);
        assert!(p.ax[1] > 0.0, "ax1={}", p.ax[1]);
    }

    #[test]
    fn coincident_particles_get_unit_direction() {
        let mut p = pair(0.0);
        p.density = vec![1.0, 1.0];
        p.pressure = vec![1.0, 1.0];
        let ctx = ForceContext {
            h: 1.0,
            mass: 1.0,
            viscosity: None,
            dt: 0.01,
            seed: 7,
            step: 3,
        };
        let stats = accumulate_pair_forces(&mut p, &Candidates::AllPairs { count: 2 }, &ctx, false);
        assert_eq!(stats.coincident_pairs, 1);
        // dW(0) = 0, so the force vanishes but must stay finite.
        assert!(p.ax.iter().chain(&p.ay).chain(&p.az).all(|v| v.is_finite()));

        let d = coincident_direction(7, 3, 0, 1);
        let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        assert!((len - 1.0).abs() < 1.0e-5, "len={len}");
        assert_eq!(d, coincident_direction(7, 3, 0, 1));
        assert_ne!(d, coincident_direction(7, 4, 0, 1));
    }

    #[test]
    fn viscosity_conserves_momentum_and_reduces_relative_velocity() {
        let mut p = pair(0.5);
        p.density = vec![1.0, 1.0];
        p.set_velocity(0, [1.0, 0.0, 0.0]);
        p.set_velocity(1, [-1.0, 0.0, 0.0]);
        let ctx = ForceContext {
            h: 1.0,
            mass: 1.0,
            viscosity: Some(0.5),
            dt: 0.1,
            seed: 1,
            step: 0,
        };
        accumulate_pair_forces(&mut p, &Candidates::AllPairs { count: 2 }, &ctx, false);
        assert!((p.vx[0] + p.vx[1]).abs() < 1.0e-6);
        assert!(p.vx[0] < 1.0 && p.vx[0] > 0.0, "vx0={}", p.vx[0]);
    }

    #[test]
    fn finalize_guards_zero_density() {
        let mut p = pair(5.0);
        p.ax = vec![3.0, 3.0];
        p.density = vec![0.0, 2.0];
        let isolated = finalize_accelerations(&mut p, 1.0, 1);
        assert_eq!(isolated, 1);
        assert_eq!(p.ax[0], 0.0);
        assert_eq!(p.ay[0], -1.0);
        assert!((p.ax[1] - 1.5).abs() < 1.0e-6);
        assert_eq!(p.ay[1], -1.0);
    }

    #[test]
    fn integrate_is_semi_implicit() {
        let mut p = pair(1.0);
        p.ay = vec![-2.0, -2.0];
        integrate(&mut p, 0.5);
        assert_eq!(p.vy[0], -1.0);
        // Position uses the updated velocity.
        assert_eq!(p.y[0], -0.5);
    }

    #[test]
    fn plane_constraint_zeroes_one_axis() {
        let mut p = pair(1.0);
        p.vz = vec![0.3, -0.2];
        p.az = vec![1.0, 4.0];
        p.vx = vec![0.5, 0.5];
        constrain_to_plane(&mut p, 2);
        integrate(&mut p, 0.1);
        assert_eq!(p.z, vec![0.0, 0.0]);
        assert_eq!(p.vz, vec![0.0, 0.0]);
        assert!((p.x[0] - 0.05).abs() < 1.0e-7);
    }
}
