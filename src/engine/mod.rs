//! Simulation session and step loop.
//!
//! A [`Simulation`] owns its body set, configuration, integrator and energy
//! baseline; nothing is process-global, so independent sessions can run side
//! by side. Each iteration runs, in order:
//!
//! 1. adaptive timestep from the accelerations of the previous force pass
//! 2. force pass
//! 3. collision pass (when enabled)
//! 4. integration of active bodies
//! 5. quarantine of bodies with non-finite state
//! 6. energy check on the first iteration and every `energy_check_interval`
//!    iterations after that (when enabled)
//!
//! The session moves from `Running` to the terminal `Stopped` state; there is
//! no pause or resume.

pub mod publish;
pub mod realtime;
pub mod signal;

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub use publish::{BodyRecord, Snapshot, SnapshotPublisher, SnapshotSink, SnapshotSubscriber};
pub use realtime::{spawn_realtime, RealtimeRun};
pub use signal::{CancelToken, NeverStop, SentinelFile, StopReason, StopSignal};

use crate::body::Body;
use crate::config::{RunConfig, SimConfig, SimulationConfig};
use crate::error::{SimError, SimResult};
use crate::physics::{
    adaptive_timestep, compute_accelerations, quarantine_invalid, resolve_collisions, EnergyInfo,
    EnergyMonitor, EnergyStatus, Integrator, MergeEvent,
};
use crate::vector::Vector3;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationState {
    /// Accepting steps.
    Running,
    /// Terminal.
    Stopped(StopReason),
}

/// What one iteration did.
#[derive(Debug, Default)]
pub struct StepReport {
    /// Iteration number after this step (1-based).
    pub iteration: u64,
    /// Step size used (s).
    pub dt: f64,
    /// Merges performed in the collision pass.
    pub merges: Vec<MergeEvent>,
    /// Bodies deactivated for non-finite state.
    pub quarantined: Vec<SimError>,
    /// Energy check outcome, on iterations where one ran.
    pub energy: Option<EnergyStatus>,
}

/// Outcome of [`Simulation::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Iterations completed over the life of the session.
    pub iterations: u64,
    /// Simulated time (s).
    pub simulated_time: f64,
    /// Merges performed.
    pub collisions: usize,
    /// Bodies deactivated for invalid state.
    pub quarantined: usize,
    /// Active bodies at the end.
    pub active_bodies: usize,
    /// Latest energy measurement.
    pub final_energy: EnergyInfo,
    /// Energy checks that exceeded tolerance.
    pub energy_warnings: usize,
    /// Wall-clock duration of the run.
    pub wall_clock: Duration,
    /// Why the run ended.
    pub stop_reason: StopReason,
}

/// One simulation session.
pub struct Simulation {
    bodies: Vec<Body>,
    physics: SimulationConfig,
    run: RunConfig,
    integrator: Box<dyn Integrator + Send + Sync>,
    energy: EnergyMonitor,
    iteration: u64,
    time: f64,
    last_dt: f64,
    collisions: usize,
    quarantined: usize,
    state: SimulationState,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("bodies", &self.bodies.len())
            .field("integrator", &self.integrator.name())
            .field("iteration", &self.iteration)
            .field("time", &self.time)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Create a session over `bodies`.
    ///
    /// Bodies with unusable state are deactivated up front, initial
    /// accelerations are computed and the energy baseline is captured.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration fails validation.
    pub fn new(config: &SimConfig, mut bodies: Vec<Body>) -> SimResult<Self> {
        config.check()?;

        let quarantined = quarantine_invalid(&mut bodies).len();
        compute_accelerations(&mut bodies);

        let mut energy = EnergyMonitor::new(config.physics.energy_tolerance);
        energy.initialize(&bodies);

        let integrator = config.run.integrator.build();
        tracing::debug!(
            bodies = bodies.len(),
            active = bodies.iter().filter(|b| b.active).count(),
            integrator = integrator.name(),
            "simulation created"
        );

        Ok(Self {
            bodies,
            physics: config.physics.clone(),
            run: config.run.clone(),
            integrator,
            energy,
            iteration: 0,
            time: 0.0,
            last_dt: 0.0,
            collisions: 0,
            quarantined,
            state: SimulationState::Running,
        })
    }

    /// Create a session from the configured scenario.
    ///
    /// # Errors
    ///
    /// Returns error if validation fails or the scenario cannot be built.
    pub fn from_config(config: &SimConfig) -> SimResult<Self> {
        let bodies = config.scenario.build_bodies()?;
        Self::new(config, bodies)
    }

    /// Every slot, active or not.
    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Completed iterations.
    #[must_use]
    pub const fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Simulated time (s).
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    /// Merges performed so far.
    #[must_use]
    pub const fn collisions(&self) -> usize {
        self.collisions
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SimulationState {
        self.state
    }

    /// Energy monitor with the captured baseline.
    #[must_use]
    pub const fn energy(&self) -> &EnergyMonitor {
        &self.energy
    }

    /// Name of the active integrator.
    #[must_use]
    pub fn integrator_name(&self) -> &'static str {
        self.integrator.name()
    }

    /// Total momentum of the active bodies (kg·m/s).
    #[must_use]
    pub fn total_momentum(&self) -> Vector3 {
        self.bodies
            .iter()
            .filter(|b| b.active)
            .map(Body::momentum)
            .sum()
    }

    /// Copy the current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            self.iteration,
            self.time,
            self.last_dt,
            self.energy.latest(),
            &self.bodies,
        )
    }

    /// Advance one iteration.
    pub fn step(&mut self) -> StepReport {
        let dt = adaptive_timestep(&self.bodies, self.run.base_dt, self.physics.adaptive_timestep);

        compute_accelerations(&mut self.bodies);

        let merges = if self.physics.collision_detection {
            resolve_collisions(&mut self.bodies, self.physics.collision_distance_factor)
        } else {
            Vec::new()
        };
        self.collisions += merges.len();

        self.integrator.step(&mut self.bodies, dt);

        let quarantined = quarantine_invalid(&mut self.bodies);
        self.quarantined += quarantined.len();

        self.iteration += 1;
        self.time += dt;
        self.last_dt = dt;

        let energy = (self.physics.energy_monitoring && self.energy_check_due())
            .then(|| self.check_energy());

        StepReport {
            iteration: self.iteration,
            dt,
            merges,
            quarantined,
            energy,
        }
    }

    // First step, then every `energy_check_interval` steps.
    fn energy_check_due(&self) -> bool {
        self.iteration == 1 || self.iteration % self.run.energy_check_interval == 0
    }

    fn check_energy(&mut self) -> EnergyStatus {
        let status = self.energy.check(&self.bodies);
        if let Some(err) = status.as_error() {
            tracing::warn!(iteration = self.iteration, %err, "energy conservation degraded");
        }
        status
    }

    /// Step until `stop` fires or the iteration bound is reached.
    ///
    /// The initial state and every `publish_interval`-th iteration go to each
    /// sink; the final state is always delivered. Sink failures are logged and
    /// the run continues. A session that has already stopped returns at once.
    pub fn run(&mut self, stop: &dyn StopSignal, sinks: &mut [&mut dyn SnapshotSink]) -> RunSummary {
        let started = Instant::now();

        if let SimulationState::Stopped(reason) = self.state {
            return self.summary(reason, started.elapsed());
        }

        tracing::info!(
            bodies = self.bodies.len(),
            integrator = self.integrator.name(),
            base_dt = self.run.base_dt,
            max_iterations = self.run.max_iterations,
            initial_energy = self.energy.latest().total,
            "simulation started"
        );

        let mut delivered = self.iteration;
        self.deliver(sinks);

        let reason = loop {
            if let Some(reason) = stop.poll() {
                break reason;
            }
            if self.iteration >= self.run.max_iterations {
                break StopReason::IterationLimit;
            }

            self.step();

            if self.iteration % self.run.publish_interval == 0 {
                self.deliver(sinks);
                delivered = self.iteration;
            }
            if self.iteration % self.run.progress_interval == 0 {
                self.log_progress();
            }
            if self.run.step_delay_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.run.step_delay_ms));
            }
        };

        if delivered != self.iteration {
            self.deliver(sinks);
        }
        for sink in sinks.iter_mut() {
            if let Err(err) = sink.finish() {
                tracing::warn!(%err, "snapshot sink failed to finish");
            }
        }

        self.state = SimulationState::Stopped(reason);
        let summary = self.summary(reason, started.elapsed());
        tracing::info!(
            %reason,
            iterations = summary.iterations,
            simulated_days = summary.simulated_time / 86_400.0,
            collisions = summary.collisions,
            energy_error = summary.final_energy.relative_error,
            "simulation stopped"
        );
        summary
    }

    fn deliver(&self, sinks: &mut [&mut dyn SnapshotSink]) {
        if sinks.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for sink in sinks.iter_mut() {
            if let Err(err) = sink.record(&snapshot) {
                tracing::warn!(iteration = self.iteration, %err, "snapshot export failed");
            }
        }
    }

    fn log_progress(&self) {
        let latest = self.energy.latest();
        tracing::info!(
            iteration = self.iteration,
            simulated_days = self.time / 86_400.0,
            dt = self.last_dt,
            active = self.bodies.iter().filter(|b| b.active).count(),
            collisions = self.collisions,
            energy_error = latest.relative_error,
            "progress"
        );
    }

    fn summary(&self, stop_reason: StopReason, wall_clock: Duration) -> RunSummary {
        RunSummary {
            iterations: self.iteration,
            simulated_time: self.time,
            collisions: self.collisions,
            quarantined: self.quarantined,
            active_bodies: self.bodies.iter().filter(|b| b.active).count(),
            final_energy: self.energy.latest(),
            energy_warnings: self.energy.warning_count(),
            wall_clock,
            stop_reason,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Falsification: without collisions, total momentum is invariant.
        #[test]
        fn prop_momentum_conserved_without_collisions(
            specs in prop::collection::vec(
                (1e20f64..1e26, -1e11f64..1e11, -1e11f64..1e11, -1e4f64..1e4, -1e4f64..1e4),
                2..8,
            ),
        ) {
            let bodies: Vec<Body> = specs
                .iter()
                .enumerate()
                .map(|(i, &(mass, x, y, vx, vy))| {
                    Body::new(format!("p{i}"), mass, Vector3::new(x, y, 1e9 * i as f64), Vector3::new(vx, vy, 0.0))
                })
                .collect();
            let config = SimConfig::builder()
                .collision_detection(false)
                .base_dt(3600.0)
                .build();
            let Ok(mut sim) = Simulation::new(&config, bodies) else {
                return Err(TestCaseError::fail("config rejected"));
            };

            let before = sim.total_momentum();
            let scale: f64 = sim
                .bodies()
                .iter()
                .map(|b| b.momentum().magnitude() + b.mass * b.acceleration.magnitude() * 3600.0 * 20.0)
                .sum();
            for _ in 0..10 {
                sim.step();
            }
            let after = sim.total_momentum();

            prop_assert!((after - before).magnitude() <= 1e-9 * scale.max(1.0));
        }

        /// Falsification: an all-inactive body set never moves.
        #[test]
        fn prop_all_inactive_is_idempotent(
            specs in prop::collection::vec((-1e9f64..1e9, -1e3f64..1e3), 1..10),
            steps in 1usize..20,
        ) {
            let bodies: Vec<Body> = specs
                .iter()
                .map(|&(x, v)| {
                    let mut body = Body::new("idle", 1e20, Vector3::new(x, 0.0, 0.0), Vector3::new(v, 0.0, 0.0));
                    body.active = false;
                    body
                })
                .collect();
            let before = bodies.clone();
            let Ok(mut sim) = Simulation::new(&SimConfig::default(), bodies) else {
                return Err(TestCaseError::fail("config rejected"));
            };

            for _ in 0..steps {
                sim.step();
            }

            for (b, a) in before.iter().zip(sim.bodies()) {
                prop_assert_eq!(b.position, a.position);
                prop_assert_eq!(b.velocity, a.velocity);
            }
        }
    }
}
