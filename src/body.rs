//! Per-body physical state and pairwise contributions.
//!
//! A body's own force, collision and energy terms live here; the passes in
//! [`crate::physics`] combine them across the whole body set.

use serde::{Deserialize, Serialize};

use crate::vector::Vector3;

/// Gravitational constant (m³ kg⁻¹ s⁻²).
pub const G: f64 = 6.674_30e-11;

/// Density used to derive a radius when none is supplied (Earth-like, kg/m³).
pub const DEFAULT_DENSITY: f64 = 5514.0;

/// Bodies lighter than this are inert: they would blow up `force / mass`.
pub const MIN_BODY_MASS: f64 = 1e-12;

/// Softening length as a fraction of the larger radius of a pair.
pub const SOFTENING_FRACTION: f64 = 0.1;

/// Separations below this contribute no potential energy.
const MIN_SEPARATION: f64 = 1e-15;

/// Radius of a uniform sphere of `mass` at [`DEFAULT_DENSITY`].
#[must_use]
pub fn radius_for_mass(mass: f64) -> f64 {
    if mass <= 0.0 {
        return 0.0;
    }
    (3.0 * mass / (4.0 * std::f64::consts::PI * DEFAULT_DENSITY)).cbrt()
}

/// Check that a mass can take part in the dynamics.
#[must_use]
pub fn is_valid_mass(mass: f64) -> bool {
    mass.is_finite() && mass >= MIN_BODY_MASS
}

/// A gravitating sphere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Label; not required to be unique.
    pub name: String,
    /// Mass (kg).
    pub mass: f64,
    /// Physical radius (m), used for softening and collisions.
    pub radius: f64,
    /// Position (m).
    pub position: Vector3,
    /// Velocity (m/s).
    pub velocity: Vector3,
    /// Acceleration from the latest force pass (m/s²).
    pub acceleration: Vector3,
    /// Acceleration retained from the previous step for the Verlet update.
    ///
    /// Zero until the body has been integrated once.
    pub prev_acceleration: Vector3,
    /// False once merged away or rejected as invalid.
    pub active: bool,
}

impl Body {
    /// Create a body whose radius is derived from its mass.
    ///
    /// A body with an unusable mass is created inactive.
    #[must_use]
    pub fn new(name: impl Into<String>, mass: f64, position: Vector3, velocity: Vector3) -> Self {
        Self {
            name: name.into(),
            mass,
            radius: radius_for_mass(mass),
            position,
            velocity,
            acceleration: Vector3::zero(),
            prev_acceleration: Vector3::zero(),
            active: is_valid_mass(mass),
        }
    }

    /// Override the derived radius. Non-positive values keep the derived one.
    #[must_use]
    pub fn with_radius(mut self, radius: f64) -> Self {
        if radius > 0.0 && radius.is_finite() {
            self.radius = radius;
        }
        self
    }

    /// Reason this body cannot be simulated, if any.
    #[must_use]
    pub fn invalid_reason(&self) -> Option<String> {
        if !is_valid_mass(self.mass) {
            return Some(format!("mass {:e} kg below minimum {MIN_BODY_MASS:e}", self.mass));
        }
        if !self.position.is_finite() {
            return Some("non-finite position".to_string());
        }
        if !self.velocity.is_finite() {
            return Some("non-finite velocity".to_string());
        }
        None
    }

    /// Remove the body from the dynamics without freeing its slot.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.acceleration = Vector3::zero();
        self.prev_acceleration = Vector3::zero();
    }

    /// Kinetic energy ½mv² (J).
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    /// Linear momentum mv (kg·m/s).
    #[must_use]
    pub fn momentum(&self) -> Vector3 {
        self.velocity * self.mass
    }

    /// Softening length for the pair: a tenth of the larger radius.
    #[must_use]
    pub fn softening_with(&self, other: &Self) -> f64 {
        self.radius.max(other.radius) * SOFTENING_FRACTION
    }

    /// Softened gravitational force exerted on `self` by `other` (N).
    ///
    /// Magnitude is `G·m1·m2 / (d² + s²)`, directed from `self` toward
    /// `other`. Either body being inactive yields zero. Callers exclude the
    /// self-pair by slot index.
    #[must_use]
    pub fn force_from(&self, other: &Self) -> Vector3 {
        if !self.active || !other.active {
            return Vector3::zero();
        }

        let direction = other.position - self.position;
        let softening = self.softening_with(other);
        let distance_sq = direction.magnitude_squared() + softening * softening;
        if distance_sq <= 0.0 {
            return Vector3::zero();
        }

        let force_magnitude = G * self.mass * other.mass / distance_sq;
        direction.normalize() * force_magnitude
    }

    /// Whether the two centres are closer than `(r1 + r2) · factor`.
    #[must_use]
    pub fn collides_with(&self, other: &Self, distance_factor: f64) -> bool {
        if !self.active || !other.active {
            return false;
        }
        let min_distance = (self.radius + other.radius) * distance_factor;
        (self.position - other.position).magnitude() < min_distance
    }

    /// Unsoftened pair potential `-G·m1·m2 / d` (J).
    #[must_use]
    pub fn potential_energy_with(&self, other: &Self) -> f64 {
        if !self.active || !other.active {
            return 0.0;
        }
        let distance = (self.position - other.position).magnitude();
        if distance < MIN_SEPARATION {
            return 0.0;
        }
        -G * self.mass * other.mass / distance
    }
}
