//! Proximity collision detection and perfectly inelastic merging.
//!
//! Merged bodies conserve mass, linear momentum and (at equal density)
//! volume. Kinetic energy is not conserved.

use serde::{Deserialize, Serialize};

use crate::body::Body;

/// Record of one merge performed during a collision pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeEvent {
    /// Slot index of the body that absorbed the other.
    pub survivor: usize,
    /// Slot index of the body that went inactive.
    pub absorbed: usize,
    /// Name of the survivor after the merge.
    pub name: String,
    /// Combined mass (kg).
    pub mass: f64,
}

/// Merge the lighter of `a` and `b` into the heavier one.
///
/// Returns `true` when `a` survived. Ties go to `a`. The survivor's name
/// becomes `"{a}+{b}"` regardless of which one survived.
pub fn merge_pair(a: &mut Body, b: &mut Body) -> bool {
    let total_mass = a.mass + b.mass;

    let velocity = (a.momentum() + b.momentum()) / total_mass;
    let position = (a.position * a.mass + b.position * b.mass) / total_mass;
    let radius = (a.radius.powi(3) + b.radius.powi(3)).cbrt();
    let name = format!("{}+{}", a.name, b.name);

    let a_survives = a.mass >= b.mass;
    let (survivor, absorbed) = if a_survives { (a, b) } else { (b, a) };

    survivor.mass = total_mass;
    survivor.velocity = velocity;
    survivor.position = position;
    survivor.radius = radius;
    survivor.name = name;
    absorbed.deactivate();

    a_survives
}

/// Detect and resolve every collision in the current body set.
///
/// Pairs are visited with the outer index ascending and the inner index above
/// it. Any pair involving a body already absorbed in this pass is skipped.
pub fn resolve_collisions(bodies: &mut [Body], distance_factor: f64) -> Vec<MergeEvent> {
    let mut events = Vec::new();
    let n = bodies.len();

    for i in 0..n {
        if !bodies[i].active {
            continue;
        }
        for j in (i + 1)..n {
            if !bodies[i].active {
                break;
            }
            if !bodies[j].active {
                continue;
            }
            if !bodies[i].collides_with(&bodies[j], distance_factor) {
                continue;
            }

            let (head, tail) = bodies.split_at_mut(j);
            let first = &mut head[i];
            let second = &mut tail[0];
            let first_survives = merge_pair(first, second);

            let (survivor, absorbed) = if first_survives { (i, j) } else { (j, i) };
            let merged = &bodies[survivor];
            tracing::debug!(
                survivor,
                absorbed,
                name = %merged.name,
                mass = merged.mass,
                "bodies merged"
            );
            events.push(MergeEvent {
                survivor,
                absorbed,
                name: merged.name.clone(),
                mass: merged.mass,
            });
        }
    }

    events
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::vector::Vector3;
    use proptest::prelude::*;

    proptest! {
        /// Falsification: a merge loses neither mass nor momentum.
        #[test]
        fn prop_merge_conserves_mass_and_momentum(
            m1 in 1e3f64..1e30, m2 in 1e3f64..1e30,
            vx1 in -1e4f64..1e4, vy1 in -1e4f64..1e4,
            vx2 in -1e4f64..1e4, vy2 in -1e4f64..1e4,
        ) {
            let mut a = Body::new("a", m1, Vector3::zero(), Vector3::new(vx1, vy1, 0.0));
            let mut b = Body::new("b", m2, Vector3::new(1.0, 0.0, 0.0), Vector3::new(vx2, vy2, 0.0));
            let p_before = a.momentum() + b.momentum();
            let total = m1 + m2;

            let a_survives = merge_pair(&mut a, &mut b);
            let survivor = if a_survives { &a } else { &b };

            prop_assert!((survivor.mass - total).abs() <= f64::EPSILON * total);
            let scale = p_before.magnitude().max(total);
            prop_assert!((survivor.momentum() - p_before).magnitude() <= 1e-9 * scale);
            prop_assert!(a.active != b.active);
        }
    }
}
