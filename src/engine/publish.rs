//! Step-complete snapshots and the single-writer publish channel.
//!
//! The simulation thread copies its body set into an immutable [`Snapshot`]
//! and swaps it into a shared slot. The lock is held only for the swap;
//! readers clone the `Arc` and do their own work without it.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::error::SimResult;
use crate::physics::EnergyInfo;
use crate::vector::Vector3;

/// Read-only copy of one body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyRecord {
    /// Slot index in the body set.
    pub index: usize,
    /// Label.
    pub name: String,
    /// Mass (kg).
    pub mass: f64,
    /// Radius (m).
    pub radius: f64,
    /// Position (m).
    pub position: Vector3,
    /// Velocity (m/s).
    pub velocity: Vector3,
    /// Liveness flag.
    pub active: bool,
    /// ½mv² (J).
    pub kinetic_energy: f64,
}

impl BodyRecord {
    /// Copy the exported fields of `body`.
    #[must_use]
    pub fn from_body(index: usize, body: &Body) -> Self {
        Self {
            index,
            name: body.name.clone(),
            mass: body.mass,
            radius: body.radius,
            position: body.position,
            velocity: body.velocity,
            active: body.active,
            kinetic_energy: body.kinetic_energy(),
        }
    }
}

/// Full state after a completed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Completed iterations; zero for the initial state.
    pub iteration: u64,
    /// Simulated time (s).
    pub time: f64,
    /// Step size used for the latest iteration (s).
    pub dt: f64,
    /// Most recent energy measurement.
    pub energy: EnergyInfo,
    /// Every slot, active or not.
    pub bodies: Vec<BodyRecord>,
}

impl Snapshot {
    /// Copy the whole body set.
    #[must_use]
    pub fn capture(iteration: u64, time: f64, dt: f64, energy: EnergyInfo, bodies: &[Body]) -> Self {
        Self {
            iteration,
            time,
            dt,
            energy,
            bodies: bodies
                .iter()
                .enumerate()
                .map(|(index, body)| BodyRecord::from_body(index, body))
                .collect(),
        }
    }

    /// Number of active bodies.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.active).count()
    }
}

/// Consumer of step-complete snapshots.
///
/// Sink failures are reported by the loop and never stop it.
pub trait SnapshotSink {
    /// Receive a snapshot. Sinks decide their own cadence.
    ///
    /// # Errors
    ///
    /// Returns error if the sink could not record the snapshot.
    fn record(&mut self, snapshot: &Snapshot) -> SimResult<()>;

    /// Flush buffered output at the end of a run.
    ///
    /// # Errors
    ///
    /// Returns error if buffered output could not be written.
    fn finish(&mut self) -> SimResult<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Slot {
    version: u64,
    latest: Option<Arc<Snapshot>>,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        // Writers replace the slot whole, so a poisoned lock still holds a valid value.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Writer half of the publish channel.
#[derive(Debug, Default)]
pub struct SnapshotPublisher {
    shared: Arc<Shared>,
}

impl SnapshotPublisher {
    /// Create an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reader that has seen nothing yet.
    #[must_use]
    pub fn subscribe(&self) -> SnapshotSubscriber {
        SnapshotSubscriber {
            shared: Arc::clone(&self.shared),
            seen: 0,
        }
    }

    /// Replace the published snapshot and wake waiting readers.
    pub fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        {
            let mut slot = self.shared.lock();
            slot.version += 1;
            slot.latest = Some(snapshot);
        }
        self.shared.ready.notify_all();
    }

    /// Mark the channel finished; waiting readers return immediately.
    pub fn close(&self) {
        self.shared.lock().closed = true;
        self.shared.ready.notify_all();
    }

    /// Number of snapshots published so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.shared.lock().version
    }
}

impl SnapshotSink for SnapshotPublisher {
    fn record(&mut self, snapshot: &Snapshot) -> SimResult<()> {
        self.publish(snapshot.clone());
        Ok(())
    }
}

/// Reader half of the publish channel.
#[derive(Debug, Clone)]
pub struct SnapshotSubscriber {
    shared: Arc<Shared>,
    seen: u64,
}

impl SnapshotSubscriber {
    /// Latest snapshot regardless of whether it was seen before.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.shared.lock().latest.clone()
    }

    /// Check if the writer closed the channel.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Block until a snapshot newer than the last one returned is published,
    /// the channel closes, or `timeout` elapses.
    ///
    /// Returns `None` on timeout or on close with nothing new.
    pub fn wait_newer(&mut self, timeout: Duration) -> Option<Arc<Snapshot>> {
        let seen = self.seen;
        let guard = self.shared.lock();
        let (slot, _timeout) = self
            .shared
            .ready
            .wait_timeout_while(guard, timeout, |slot| slot.version <= seen && !slot.closed)
            .unwrap_or_else(PoisonError::into_inner);

        if slot.version <= seen {
            return None;
        }
        self.seen = slot.version;
        slot.latest.clone()
    }
}
