//! Equation of state for the SPH fluid.
//!
//! The simulator uses a linear state equation, `P = k * (rho - rho0)`, rather
//! than a Tait or ideal-gas law. Stiffness and rest density are tuned against
//! this exact form, so it is kept as is.

/// Linear equation of state.
///
/// ```text
/// P = k * (rho - rho0)
/// ```
///
/// # Arguments
/// * `density` - Current density rho.
/// * `rest_density` - Reference rest density rho0.
/// * `stiffness` - Stiffness k.
///
/// # Returns
/// Pressure. Negative (tension) when `density < rest_density`; under-dense
/// neighbors then attract each other.
#[inline]
pub fn linear_eos(density: f32, rest_density: f32, stiffness: f32) -> f32 {
    stiffness * (density - rest_density)
}
