//! # nbody-sim
//!
//! Gravitational N-body simulation core.
//!
//! - Pairwise Newtonian forces with size-scaled softening
//! - Perfectly inelastic merging of overlapping bodies
//! - Velocity Verlet and explicit Euler integrators
//! - Adaptive timestep driven by peak acceleration
//! - Energy drift monitoring against an initial baseline
//! - Snapshot publishing to a concurrent reader and CSV export
//!
//! ## Example
//!
//! ```rust
//! use nbody_sim::prelude::*;
//!
//! let config = SimConfig::builder()
//!     .scenario(ScenarioConfig::Kepler)
//!     .max_iterations(10)
//!     .build();
//!
//! let mut sim = Simulation::from_config(&config).unwrap();
//! let summary = sim.run(&NeverStop, &mut []);
//! assert_eq!(summary.iterations, 10);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
    clippy::needless_range_loop,
)]

pub mod body;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod physics;
pub mod scenarios;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::body::{Body, G};
    pub use crate::config::{BodyConfig, ScenarioConfig, SimConfig, SimConfigBuilder};
    pub use crate::engine::{
        spawn_realtime, CancelToken, NeverStop, RunSummary, SentinelFile, Simulation,
        SimulationState, Snapshot, SnapshotSink, StopReason, StopSignal,
    };
    pub use crate::error::{SimError, SimResult};
    pub use crate::physics::{EnergyInfo, EnergyMonitor, IntegratorKind};
    pub use crate::vector::Vector3;
}

/// Re-export for public API
pub use error::{SimError, SimResult};
