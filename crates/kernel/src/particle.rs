//! Particle data structures using struct-of-arrays layout.

/// Struct-of-arrays particle storage.
///
/// All arrays are parallel: index `i` across every array refers to the same particle.
/// The particle count is fixed once a simulation is built; nothing here resizes
/// after construction.
#[derive(Debug, Clone, Default)]
pub struct ParticleArrays {
    // ---- Positions ----
    /// X positions
    pub x: Vec<f32>,
    /// Y positions
    pub y: Vec<f32>,
    /// Z positions
    pub z: Vec<f32>,

    // ---- Velocities ----
    /// X velocities
    pub vx: Vec<f32>,
    /// Y velocities
    pub vy: Vec<f32>,
    /// Z velocities
    pub vz: Vec<f32>,

    // ---- Accelerations (scratch, rebuilt every step) ----
    /// X accelerations
    pub ax: Vec<f32>,
    /// Y accelerations
    pub ay: Vec<f32>,
    /// Z accelerations
    pub az: Vec<f32>,

    // ---- Derived fields ----
    /// SPH density estimate
    pub density: Vec<f32>,
    /// Pressure from the equation of state
    pub pressure: Vec<f32>,

    // ---- Display outputs (write-only for the simulation) ----
    /// RGB display color
    pub color: Vec<[f32; 3]>,
    /// Display scale (sphere radius)
    pub scale: Vec<f32>,
}

impl ParticleArrays {
    /// Create an empty particle collection with no particles allocated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty collection with room for `n` particles.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            z: Vec::with_capacity(n),
            vx: Vec::with_capacity(n),
            vy: Vec::with_capacity(n),
            vz: Vec::with_capacity(n),
            ax: Vec::with_capacity(n),
            ay: Vec::with_capacity(n),
            az: Vec::with_capacity(n),
            density: Vec::with_capacity(n),
            pressure: Vec::with_capacity(n),
            color: Vec::with_capacity(n),
            scale: Vec::with_capacity(n),
        }
    }

    /// Return the number of particles currently stored.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Return `true` if there are no particles.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Append a particle at rest.
    ///
    /// Velocity, acceleration, density and pressure start at zero.
    pub fn push_particle(&mut self, position: [f32; 3], color: [f32; 3], scale: f32) {
        self.x.push(position[0]);
        self.y.push(position[1]);
        self.z.push(position[2]);
        self.vx.push(0.0);
        self.vy.push(0.0);
        self.vz.push(0.0);
        self.ax.push(0.0);
        self.ay.push(0.0);
        self.az.push(0.0);
        self.density.push(0.0);
        self.pressure.push(0.0);
        self.color.push(color);
        self.scale.push(scale);
    }

    /// Position of particle `i`.
    #[inline]
    pub fn position(&self, i: usize) -> [f32; 3] {
        [self.x[i], self.y[i], self.z[i]]
    }

    /// Velocity of particle `i`.
    #[inline]
    pub fn velocity(&self, i: usize) -> [f32; 3] {
        [self.vx[i], self.vy[i], self.vz[i]]
    }

    /// Overwrite the velocity of particle `i`.
    pub fn set_velocity(&mut self, i: usize, v: [f32; 3]) {
        self.vx[i] = v[0];
        self.vy[i] = v[1];
        self.vz[i] = v[2];
    }

    /// Velocity magnitude of particle `i`.
    #[inline]
    pub fn speed(&self, i: usize) -> f32 {
        (self.vx[i] * self.vx[i] + self.vy[i] * self.vy[i] + self.vz[i] * self.vz[i]).sqrt()
    }

    /// `true` if every position and velocity component is finite.
    pub fn is_finite(&self) -> bool {
        [&self.x, &self.y, &self.z, &self.vx, &self.vy, &self.vz]
            .iter()
            .all(|a| a.iter().all(|v| v.is_finite()))
    }
}
