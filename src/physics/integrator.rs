//! Kinematic integrators.
//!
//! Two schemes share one trait so a run can select either:
//!
//! - [`VerletIntegrator`]: velocity Verlet from a stored acceleration. It keeps
//!   one extra acceleration vector per body and adds the `½ a dt²` term to
//!   every position update.
//! - [`EulerIntegrator`]: first order (`v += a·dt; p += v·dt`), kept as the
//!   baseline the Verlet scheme is measured against.
//!
//! Both read the accelerations left on each body by the force pass and never
//! touch inactive bodies.

use serde::{Deserialize, Serialize};

use crate::body::Body;

/// Numerical integrator for one body over one step.
pub trait Integrator {
    /// Advance a single active body by `dt` seconds.
    fn advance(&self, body: &mut Body, dt: f64);

    /// Short identifier for logs and summaries.
    fn name(&self) -> &'static str;

    /// Order of the global truncation error.
    fn error_order(&self) -> u32;

    /// Advance every active body by `dt`; inactive bodies are left untouched.
    fn step(&self, bodies: &mut [Body], dt: f64) {
        for body in bodies.iter_mut().filter(|b| b.active) {
            self.advance(body, dt);
        }
    }
}

/// Velocity Verlet.
///
/// With `a` freshly computed at the current position and `a_prev` retained
/// from the previous step (zero before the first):
///
/// ```text
/// x += v dt + ½ a dt²
/// v += ½ (a_prev + a) dt
/// a_prev := a
/// ```
///
/// The position update reads the velocity from before the step.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerletIntegrator;

impl VerletIntegrator {
    /// Create a new Verlet integrator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Integrator for VerletIntegrator {
    fn advance(&self, body: &mut Body, dt: f64) {
        let acceleration = body.acceleration;

        body.position += body.velocity * dt + acceleration * (0.5 * dt * dt);
        body.velocity += (body.prev_acceleration + acceleration) * (0.5 * dt);
        body.prev_acceleration = acceleration;
    }

    fn name(&self) -> &'static str {
        "verlet"
    }

    fn error_order(&self) -> u32 {
        2
    }
}

/// Explicit first-order Euler stepping.
#[derive(Debug, Clone, Copy, Default)]
pub struct EulerIntegrator;

impl EulerIntegrator {
    /// Create a new Euler integrator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Integrator for EulerIntegrator {
    fn advance(&self, body: &mut Body, dt: f64) {
        body.velocity += body.acceleration * dt;
        body.position += body.velocity * dt;
        body.prev_acceleration = body.acceleration;
    }

    fn name(&self) -> &'static str {
        "euler"
    }

    fn error_order(&self) -> u32 {
        1
    }
}

/// Integrator selection in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegratorKind {
    /// Velocity Verlet (2nd order).
    #[default]
    Verlet,
    /// Explicit Euler (1st order).
    Euler,
}

impl IntegratorKind {
    /// Instantiate the selected integrator.
    #[must_use]
    pub fn build(self) -> Box<dyn Integrator + Send + Sync> {
        match self {
            Self::Verlet => Box::new(VerletIntegrator::new()),
            Self::Euler => Box::new(EulerIntegrator::new()),
        }
    }
}

impl std::str::FromStr for IntegratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "verlet" => Ok(Self::Verlet),
            "euler" => Ok(Self::Euler),
            other => Err(format!("unknown integrator '{other}' (expected verlet or euler)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Vector3;

    const EPSILON: f64 = 1e-12;

    fn falling_body() -> Body {
        let mut body = Body::new("probe", 1.0, Vector3::zero(), Vector3::new(1.0, 0.0, 0.0));
        body.acceleration = Vector3::new(0.0, -2.0, 0.0);
        body
    }

    #[test]
    fn test_verlet_first_step_averages_with_zero() {
        let mut body = falling_body();
        VerletIntegrator::new().advance(&mut body, 1.0);

        // x = v dt + ½ a dt² = (1, -1)
        assert!((body.position.x - 1.0).abs() < EPSILON);
        assert!((body.position.y + 1.0).abs() < EPSILON);
        // v += ½(0 + -2)·1
        assert_eq!(body.velocity, Vector3::new(1.0, -1.0, 0.0));
        assert_eq!(body.prev_acceleration, Vector3::new(0.0, -2.0, 0.0));
    }

    #[test]
    fn test_verlet_position_uses_velocity_before_step() {
        let mut body = falling_body();
        body.prev_acceleration = Vector3::new(0.0, -4.0, 0.0);
        VerletIntegrator::new().advance(&mut body, 1.0);

        // x += (1, 0)·1 + ½(0, -2)·1
        assert!((body.position.x - 1.0).abs() < EPSILON);
        assert!((body.position.y + 1.0).abs() < EPSILON);
        // v += ½(-4 + -2)·1
        assert!((body.velocity.x - 1.0).abs() < EPSILON);
        assert!((body.velocity.y + 3.0).abs() < EPSILON);
        assert_eq!(body.prev_acceleration, Vector3::new(0.0, -2.0, 0.0));
    }

    #[test]
    fn test_verlet_constant_acceleration_half_kick_lag() {
        // Starting from a_prev = 0 the velocity trails the exact a·t by ½ a dt.
        let integrator = VerletIntegrator::new();
        let mut body = falling_body();
        let dt = 0.1;
        let steps = 100;
        for _ in 0..steps {
            integrator.advance(&mut body, dt);
        }
        let t = dt * f64::from(steps);
        assert!((body.velocity.y - (-2.0 * (t - 0.5 * dt))).abs() < 1e-9);
        assert!((body.velocity.x - 1.0).abs() < 1e-12);
        assert!((body.position.x - t).abs() < 1e-9);
    }

    #[test]
    fn test_euler_step() {
        let mut body = falling_body();
        EulerIntegrator::new().advance(&mut body, 1.0);

        assert_eq!(body.velocity, Vector3::new(1.0, -2.0, 0.0));
        assert_eq!(body.position, Vector3::new(1.0, -2.0, 0.0));
    }

    #[test]
    fn test_inactive_bodies_untouched() {
        let mut bodies = vec![falling_body(), falling_body()];
        bodies[1].active = false;
        let before = bodies[1].clone();

        VerletIntegrator::new().step(&mut bodies, 1.0);
        EulerIntegrator::new().step(&mut bodies, 1.0);

        assert_eq!(bodies[1], before);
        assert_ne!(bodies[0].position, Vector3::zero());
    }

    #[test]
    fn test_integrator_kind_parse_and_build() {
        assert_eq!("verlet".parse::<IntegratorKind>(), Ok(IntegratorKind::Verlet));
        assert_eq!("Euler".parse::<IntegratorKind>(), Ok(IntegratorKind::Euler));
        assert!("rk4".parse::<IntegratorKind>().is_err());

        assert_eq!(IntegratorKind::Verlet.build().error_order(), 2);
        assert_eq!(IntegratorKind::Euler.build().name(), "euler");
    }
}
