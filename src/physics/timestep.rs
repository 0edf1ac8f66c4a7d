//! Adaptive time-step heuristic.
//!
//! Bodies under strong acceleration relative to their size need finer
//! steps. Each active body proposes `safety · sqrt(radius / |a|)`; the step
//! is the smallest proposal, clamped to `[MIN_STEP_FRACTION · base, base]`.

use crate::body::Body;

/// Multiplier applied to each body's `sqrt(radius / |a|)` proposal.
pub const SAFETY_FACTOR: f64 = 0.1;

/// Floor on the adapted step as a fraction of the base step.
pub const MIN_STEP_FRACTION: f64 = 0.01;

/// Accelerations at or below this are ignored.
pub const MIN_ACCELERATION: f64 = 1e-15;

/// Adapted step for the current accelerations.
///
/// Reads the `acceleration` already stored on each body (from the previous
/// force pass). Returns `base_dt` when `enabled` is false.
#[must_use]
pub fn adaptive_timestep(bodies: &[Body], base_dt: f64, enabled: bool) -> f64 {
    if !enabled {
        return base_dt;
    }

    let proposed = bodies
        .iter()
        .filter(|b| b.active)
        .filter_map(|body| {
            let a = body.acceleration.magnitude();
            (a > MIN_ACCELERATION).then(|| SAFETY_FACTOR * (body.radius / a).sqrt())
        })
        .filter(|dt| dt.is_finite())
        .fold(base_dt, f64::min);

    proposed.min(base_dt).max(base_dt * MIN_STEP_FRACTION)
}
