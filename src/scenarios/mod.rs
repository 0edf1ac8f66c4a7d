//! Pre-built initial conditions.
//!
//! - Solar system: the Sun and six planets on the +x axis, physical radii
//! - Kepler: Sun and Earth on a circular orbit
//! - Random: seeded bodies with roughly tangential velocities
//! - Explicit: a body list from configuration

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::body::{Body, G};
use crate::config::{BodyConfig, ScenarioConfig};
use crate::error::{SimError, SimResult};
use crate::vector::Vector3;

/// Solar mass (kg).
pub const SOLAR_MASS: f64 = 1.989e30;

/// Earth mass (kg).
pub const EARTH_MASS: f64 = 5.972e24;

/// Astronomical unit (m).
pub const AU: f64 = 1.496e11;

/// Orbital speed of Earth used by the two-body scenario (m/s).
pub const EARTH_ORBITAL_SPEED: f64 = 29_780.0;

/// Random scenarios give each body a circular speed around this multiple of
/// `max_mass` sitting at the origin.
const CENTRAL_MASS_FACTOR: f64 = 10.0;

impl ScenarioConfig {
    /// Materialize the initial body set.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Scenario`] if a random scenario has unusable bounds
    /// or an explicit list is empty.
    pub fn build_bodies(&self) -> SimResult<Vec<Body>> {
        match self {
            Self::SolarSystem => Ok(solar_system()),
            Self::Kepler => Ok(kepler_pair()),
            Self::Random {
                count,
                max_distance,
                max_mass,
                seed,
            } => random_bodies(*count, *max_distance, *max_mass, *seed),
            Self::Bodies { bodies } => {
                if bodies.is_empty() {
                    return Err(SimError::scenario("explicit body list is empty"));
                }
                Ok(bodies.iter().map(BodyConfig::to_body).collect())
            }
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SolarSystem => "solar-system",
            Self::Kepler => "kepler",
            Self::Random { .. } => "random",
            Self::Bodies { .. } => "bodies",
        }
    }
}

impl BodyConfig {
    /// Convert into a body; an omitted radius is derived from the mass.
    #[must_use]
    pub fn to_body(&self) -> Body {
        let [px, py, pz] = self.position;
        let [vx, vy, vz] = self.velocity;
        let body = Body::new(
            self.name.clone(),
            self.mass,
            Vector3::new(px, py, pz),
            Vector3::new(vx, vy, vz),
        );
        match self.radius {
            Some(radius) => body.with_radius(radius),
            None => body,
        }
    }
}

/// The Sun and the six innermost planets through Saturn.
#[must_use]
pub fn solar_system() -> Vec<Body> {
    // (name, mass kg, distance m, speed m/s, radius m)
    const PLANETS: [(&str, f64, f64, f64, f64); 7] = [
        ("Sun", SOLAR_MASS, 0.0, 0.0, 6.96e8),
        ("Mercury", 3.301e23, 57.9e9, 47.4e3, 2.44e6),
        ("Venus", 4.867e24, 108.2e9, 35.0e3, 6.05e6),
        ("Earth", EARTH_MASS, 149.6e9, 29.8e3, 6.37e6),
        ("Mars", 6.417e23, 227.9e9, 24.1e3, 3.39e6),
        ("Jupiter", 1.898e27, 778.5e9, 13.1e3, 6.99e7),
        ("Saturn", 5.683e26, 1.432e12, 9.7e3, 5.82e7),
    ];

    PLANETS
        .iter()
        .map(|&(name, mass, distance, speed, radius)| {
            Body::new(
                name,
                mass,
                Vector3::new(distance, 0.0, 0.0),
                Vector3::new(0.0, speed, 0.0),
            )
            .with_radius(radius)
        })
        .collect()
}

/// Sun at rest at the origin with Earth at 1 AU on a circular orbit.
///
/// Radii are derived from mass at the default density.
#[must_use]
pub fn kepler_pair() -> Vec<Body> {
    vec![
        Body::new("Sun", SOLAR_MASS, Vector3::zero(), Vector3::zero()),
        Body::new(
            "Earth",
            EARTH_MASS,
            Vector3::new(AU, 0.0, 0.0),
            Vector3::new(0.0, EARTH_ORBITAL_SPEED, 0.0),
        ),
    ]
}

/// Draw `count` bodies from a PCG generator seeded with `seed`.
///
/// Positions are uniform in a cube of half-width `max_distance`, masses
/// uniform in `[max_mass / 100, max_mass]`. Each body moves tangentially in
/// the xy-plane at a random fraction of the circular speed around a central
/// mass of `10 · max_mass`. A draw landing exactly on the origin is skipped,
/// so fewer than `count` bodies may be returned.
///
/// # Errors
///
/// Returns [`SimError::Scenario`] if `count` is zero or a bound is not
/// positive and finite.
pub fn random_bodies(
    count: usize,
    max_distance: f64,
    max_mass: f64,
    seed: u64,
) -> SimResult<Vec<Body>> {
    if count == 0 {
        return Err(SimError::scenario("random scenario needs at least one body"));
    }
    if !(max_distance > 0.0 && max_distance.is_finite()) {
        return Err(SimError::scenario(format!(
            "max_distance must be positive and finite, got {max_distance}"
        )));
    }
    if !(max_mass > 0.0 && max_mass.is_finite()) {
        return Err(SimError::scenario(format!(
            "max_mass must be positive and finite, got {max_mass}"
        )));
    }

    let mut rng = Pcg64::seed_from_u64(seed);
    let central_mass = max_mass * CENTRAL_MASS_FACTOR;
    let mut bodies = Vec::with_capacity(count);

    for i in 0..count {
        let position = Vector3::new(
            rng.gen_range(-max_distance..max_distance),
            rng.gen_range(-max_distance..max_distance),
            rng.gen_range(-max_distance..max_distance),
        );
        let speed_fraction: f64 = rng.gen();
        let mass = rng.gen_range(max_mass / 100.0..=max_mass);

        let orbital_radius = position.magnitude();
        if orbital_radius <= 0.0 {
            continue;
        }

        let radial = position.normalize();
        let tangential = Vector3::new(-radial.y, radial.x, 0.0).normalize();
        let circular_speed = (G * central_mass / orbital_radius).sqrt();
        let velocity = tangential * (circular_speed * speed_fraction);

        bodies.push(Body::new(format!("Body{}", i + 1), mass, position, velocity));
    }

    Ok(bodies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solar_system_layout() {
        let bodies = solar_system();
        assert_eq!(bodies.len(), 7);
        assert_eq!(bodies[0].name, "Sun");
        assert_eq!(bodies[6].name, "Saturn");
        assert!((bodies[0].radius - 6.96e8).abs() < 1.0);
        assert!(bodies.iter().all(|b| b.active));
        assert!(bodies
            .windows(2)
            .all(|pair| pair[0].position.x < pair[1].position.x));
    }

    #[test]
    fn test_kepler_pair() {
        let bodies = kepler_pair();
        assert_eq!(bodies.len(), 2);
        assert!((bodies[1].position.x - AU).abs() < f64::EPSILON);
        assert!((bodies[1].velocity.y - EARTH_ORBITAL_SPEED).abs() < f64::EPSILON);
        assert_eq!(bodies[0].velocity, Vector3::zero());
    }

    #[test]
    fn test_random_is_reproducible() {
        let a = random_bodies(25, 1e11, 1e30, 7);
        let b = random_bodies(25, 1e11, 1e30, 7);
        let c = random_bodies(25, 1e11, 1e30, 8);
        assert!(a.is_ok());
        assert_eq!(a.as_ref().ok(), b.as_ref().ok());
        assert_ne!(a.as_ref().ok(), c.as_ref().ok());
    }

    #[test]
    fn test_random_bounds() {
        let bodies = random_bodies(50, 1e11, 1e30, 3).unwrap_or_default();
        assert_eq!(bodies.len(), 50);
        for body in &bodies {
            assert!(body.active);
            assert!(body.mass >= 1e28 && body.mass <= 1e30);
            assert!(body.position.x.abs() <= 1e11);
            assert!(body.position.y.abs() <= 1e11);
            assert!(body.position.z.abs() <= 1e11);
            assert!(body.velocity.z.abs() < f64::EPSILON);
            // Velocity is perpendicular to the xy projection of the position.
            let along = body.velocity.x * body.position.x + body.velocity.y * body.position.y;
            assert!(along.abs() <= 1e-6 * body.velocity.magnitude() * body.position.magnitude());
        }
        assert_eq!(bodies[0].name, "Body1");
    }

    #[test]
    fn test_random_rejects_bad_bounds() {
        assert!(random_bodies(0, 1e11, 1e30, 1).is_err());
        assert!(random_bodies(5, 0.0, 1e30, 1).is_err());
        assert!(random_bodies(5, 1e11, f64::NAN, 1).is_err());
    }

    #[test]
    fn test_explicit_bodies() {
        let scenario = ScenarioConfig::Bodies {
            bodies: vec![
                BodyConfig {
                    name: "A".to_string(),
                    mass: 1e24,
                    position: [1.0, 2.0, 3.0],
                    velocity: [4.0, 5.0, 6.0],
                    radius: Some(1e6),
                },
                BodyConfig {
                    name: "dust".to_string(),
                    mass: 0.0,
                    position: [0.0; 3],
                    velocity: [0.0; 3],
                    radius: None,
                },
            ],
        };
        let bodies = scenario.build_bodies().unwrap_or_default();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0].position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(bodies[0].velocity, Vector3::new(4.0, 5.0, 6.0));
        assert!((bodies[0].radius - 1e6).abs() < f64::EPSILON);
        assert!(!bodies[1].active);
    }

    #[test]
    fn test_empty_explicit_list_rejected() {
        let scenario = ScenarioConfig::Bodies { bodies: Vec::new() };
        assert!(matches!(scenario.build_bodies(), Err(SimError::Scenario(_))));
    }

    #[test]
    fn test_labels() {
        assert_eq!(ScenarioConfig::SolarSystem.label(), "solar-system");
        assert_eq!(ScenarioConfig::random(3, 1).label(), "random");
    }
}
