//! Energy accounting and drift monitoring.
//!
//! Total energy is kinetic plus pairwise potential over active bodies. The
//! monitor captures a baseline once, then reports relative drift against it.
//! Drift beyond tolerance is surfaced as a warning and never stops a run.

use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::error::SimError;

/// Energy breakdown of a body set (J).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyInfo {
    /// Σ ½mv² over active bodies.
    pub kinetic: f64,
    /// Σ_{i<j} -G·mᵢ·mⱼ/dᵢⱼ over active pairs.
    pub potential: f64,
    /// kinetic + potential.
    pub total: f64,
    /// |total − baseline| / |baseline|; zero for the baseline itself.
    pub relative_error: f64,
}

/// Compute the energy of the active bodies. `relative_error` is left at zero.
#[must_use]
pub fn system_energy(bodies: &[Body]) -> EnergyInfo {
    let kinetic: f64 = bodies
        .iter()
        .filter(|b| b.active)
        .map(Body::kinetic_energy)
        .sum();

    let mut potential = 0.0;
    for (i, body) in bodies.iter().enumerate() {
        if !body.active {
            continue;
        }
        for other in bodies.iter().skip(i + 1).filter(|b| b.active) {
            potential += body.potential_energy_with(other);
        }
    }

    EnergyInfo {
        kinetic,
        potential,
        total: kinetic + potential,
        relative_error: 0.0,
    }
}

/// Outcome of one energy check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnergyStatus {
    /// Drift within tolerance.
    Nominal,
    /// Drift beyond tolerance; the run continues.
    Drift {
        /// Relative error against the baseline.
        relative_error: f64,
        /// Configured tolerance.
        tolerance: f64,
    },
}

impl EnergyStatus {
    /// Check if this check exceeded tolerance.
    #[must_use]
    pub const fn is_drift(&self) -> bool {
        matches!(self, Self::Drift { .. })
    }

    /// Convert a drift into the matching error value for reporting.
    #[must_use]
    pub fn as_error(&self) -> Option<SimError> {
        match *self {
            Self::Nominal => None,
            Self::Drift {
                relative_error,
                tolerance,
            } => Some(SimError::EnergyDrift {
                drift: relative_error,
                tolerance,
            }),
        }
    }
}

/// Tracks energy drift against a baseline captured at simulation start.
#[derive(Debug, Clone)]
pub struct EnergyMonitor {
    tolerance: f64,
    baseline: Option<EnergyInfo>,
    latest: EnergyInfo,
    warning_count: usize,
}

impl EnergyMonitor {
    /// Create a monitor with a relative tolerance.
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            baseline: None,
            latest: EnergyInfo::default(),
            warning_count: 0,
        }
    }

    /// Capture the baseline from the initial body set.
    pub fn initialize(&mut self, bodies: &[Body]) {
        let baseline = system_energy(bodies);
        self.baseline = Some(baseline);
        self.latest = baseline;
        self.warning_count = 0;
    }

    /// Baseline energy, once captured.
    #[must_use]
    pub const fn baseline(&self) -> Option<EnergyInfo> {
        self.baseline
    }

    /// Most recent measurement.
    #[must_use]
    pub const fn latest(&self) -> EnergyInfo {
        self.latest
    }

    /// Number of checks that exceeded tolerance.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warning_count
    }

    /// Configured tolerance.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Measure the body set and compare against the baseline.
    ///
    /// The first call without a baseline captures it and reports nominal.
    pub fn check(&mut self, bodies: &[Body]) -> EnergyStatus {
        let Some(baseline) = self.baseline else {
            self.initialize(bodies);
            return EnergyStatus::Nominal;
        };

        let mut current = system_energy(bodies);
        current.relative_error = relative_error(current.total, baseline.total);
        self.latest = current;

        if current.relative_error > self.tolerance {
            self.warning_count += 1;
            return EnergyStatus::Drift {
                relative_error: current.relative_error,
                tolerance: self.tolerance,
            };
        }

        EnergyStatus::Nominal
    }
}

fn relative_error(current: f64, baseline: f64) -> f64 {
    if baseline.abs() > f64::EPSILON {
        (current - baseline).abs() / baseline.abs()
    } else {
        (current - baseline).abs()
    }
}
