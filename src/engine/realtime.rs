//! Background simulation thread with a snapshot subscriber.
//!
//! The worker owns the session outright and publishes step-complete copies;
//! the caller keeps a [`SnapshotSubscriber`] and a [`CancelToken`].

use std::thread::{self, JoinHandle};

use super::publish::{SnapshotPublisher, SnapshotSink, SnapshotSubscriber};
use super::signal::{CancelToken, StopSignal};
use super::{RunSummary, Simulation};
use crate::error::{SimError, SimResult};

/// Handle to a simulation running on its own thread.
#[derive(Debug)]
pub struct RealtimeRun {
    handle: JoinHandle<(Simulation, RunSummary)>,
    cancel: CancelToken,
    subscriber: SnapshotSubscriber,
}

impl RealtimeRun {
    /// Token that stops the worker after its current step.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request a stop.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Reader for published snapshots.
    #[must_use]
    pub fn subscriber(&self) -> SnapshotSubscriber {
        self.subscriber.clone()
    }

    /// Check if the worker has returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker and take back the session.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Worker`] if the worker panicked.
    pub fn join(self) -> SimResult<(Simulation, RunSummary)> {
        self.handle.join().map_err(|panic| {
            let message = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            SimError::Worker(message)
        })
    }
}

/// Move `simulation` onto a worker thread and start running it.
///
/// The worker stops on its iteration bound, on `stop`, or on the returned
/// handle's cancel token, whichever comes first. `sinks` receive every
/// delivered snapshot on the worker thread; the publish channel is closed
/// when the run ends.
///
/// # Errors
///
/// Returns error if the thread cannot be spawned.
pub fn spawn_realtime<S>(
    mut simulation: Simulation,
    stop: S,
    mut sinks: Vec<Box<dyn SnapshotSink + Send>>,
) -> SimResult<RealtimeRun>
where
    S: StopSignal + Send + 'static,
{
    let cancel = CancelToken::new();
    let mut publisher = SnapshotPublisher::new();
    let subscriber = publisher.subscribe();
    let worker_cancel = cancel.clone();

    let handle = thread::Builder::new()
        .name("nbody-sim".to_string())
        .spawn(move || {
            let signal = (worker_cancel, stop);
            let summary = {
                let mut targets: Vec<&mut dyn SnapshotSink> = Vec::with_capacity(sinks.len() + 1);
                targets.push(&mut publisher);
                for sink in &mut sinks {
                    targets.push(sink.as_mut());
                }
                simulation.run(&signal, &mut targets)
            };
            publisher.close();
            (simulation, summary)
        })?;

    Ok(RealtimeRun {
        handle,
        cancel,
        subscriber,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{ScenarioConfig, SimConfig};
    use crate::engine::{NeverStop, StopReason};
    use std::time::Duration;

    fn session(iterations: u64, delay_ms: u64) -> Simulation {
        let mut config = SimConfig::builder()
            .scenario(ScenarioConfig::Kepler)
            .max_iterations(iterations)
            .build();
        config.run.step_delay_ms = delay_ms;
        Simulation::from_config(&config).unwrap()
    }

    #[test]
    fn test_runs_to_completion_and_closes_channel() {
        let run = spawn_realtime(session(50, 0), NeverStop, Vec::new()).unwrap();
        let mut reader = run.subscriber();

        let (sim, summary) = run.join().unwrap();

        assert_eq!(summary.stop_reason, StopReason::IterationLimit);
        assert_eq!(sim.iteration(), 50);
        assert!(reader.is_closed());
        assert_eq!(
            reader.wait_newer(Duration::from_millis(10)).map(|s| s.iteration),
            Some(50)
        );
    }

    #[test]
    fn test_cancel_stops_worker() {
        let run = spawn_realtime(session(1_000_000, 1), NeverStop, Vec::new()).unwrap();
        let mut reader = run.subscriber();

        let first = reader.wait_newer(Duration::from_secs(5));
        assert!(first.is_some());
        run.cancel();

        let (sim, summary) = run.join().unwrap();
        assert_eq!(summary.stop_reason, StopReason::Cancelled);
        assert!(sim.iteration() < 1_000_000);
        // Every published snapshot is step-complete: one record per slot.
        let last = reader.latest().unwrap();
        assert_eq!(last.bodies.len(), 2);
        assert_eq!(last.iteration, sim.iteration());
    }
}
