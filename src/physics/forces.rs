//! Pairwise gravitational acceleration pass.
//!
//! Direct O(n²) summation over active bodies; the target body counts are
//! tens to low hundreds.

use crate::body::Body;
use crate::vector::Vector3;

/// Recompute `acceleration` for every active body from all other active bodies.
///
/// Self-interaction is excluded by slot index. Inactive bodies keep a zero
/// acceleration.
pub fn compute_accelerations(bodies: &mut [Body]) {
    let accelerations = accelerations_for(bodies);
    for (body, acceleration) in bodies.iter_mut().zip(accelerations) {
        body.acceleration = acceleration;
    }
}

/// Accelerations for the current positions without touching the bodies.
#[must_use]
pub fn accelerations_for(bodies: &[Body]) -> Vec<Vector3> {
    let n = bodies.len();
    let mut accelerations = vec![Vector3::zero(); n];

    for i in 0..n {
        let body = &bodies[i];
        if !body.active {
            continue;
        }

        let mut total = Vector3::zero();
        for (j, other) in bodies.iter().enumerate() {
            if i == j || !other.active {
                continue;
            }
            total += body.force_from(other);
        }

        // a = F / m
        accelerations[i] = total / body.mass;
    }

    accelerations
}
