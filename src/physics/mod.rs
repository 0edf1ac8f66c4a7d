//! Physics passes over a body set.
//!
//! Each pass works on `&mut [Body]` or `&[Body]` and honours the `active`
//! flag. A step composes them in a fixed order:
//! timestep → forces → collisions → integration → quarantine → energy.

pub mod collision;
pub mod energy;
pub mod forces;
pub mod integrator;
pub mod timestep;

pub use collision::{merge_pair, resolve_collisions, MergeEvent};
pub use energy::{system_energy, EnergyInfo, EnergyMonitor, EnergyStatus};
pub use forces::{accelerations_for, compute_accelerations};
pub use integrator::{EulerIntegrator, Integrator, IntegratorKind, VerletIntegrator};
pub use timestep::adaptive_timestep;

use crate::body::Body;
use crate::error::SimError;

/// Deactivate every active body whose state is unusable.
///
/// Catches invalid masses and NaN/Inf in position, velocity or acceleration.
/// The body keeps its slot; one error is returned per quarantined body.
pub fn quarantine_invalid(bodies: &mut [Body]) -> Vec<SimError> {
    let mut errors = Vec::new();

    for (index, body) in bodies.iter_mut().enumerate() {
        if !body.active {
            continue;
        }

        let error = if let Some(reason) = body.invalid_reason() {
            SimError::InvalidBody { index, reason }
        } else if !body.acceleration.is_finite() {
            SimError::NonFiniteValue {
                location: format!("body {index} ({}) acceleration", body.name),
            }
        } else {
            continue;
        };

        tracing::warn!(index, name = %body.name, %error, "body quarantined");
        body.deactivate();
        errors.push(error);
    }

    errors
}
