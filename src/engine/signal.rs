//! Cooperative stop signals polled at the top of every iteration.
//!
//! A step always runs to completion; a stop is only observed between steps.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SimResult;

/// Why a run reached the terminal `Stopped` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// An in-process cancellation flag was raised.
    Cancelled,
    /// An external stop marker appeared.
    StopRequested,
    /// The configured iteration bound was reached.
    IterationLimit,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Cancelled => "cancelled",
            Self::StopRequested => "stop requested",
            Self::IterationLimit => "iteration limit reached",
        };
        f.write_str(text)
    }
}

/// Source of stop requests.
pub trait StopSignal {
    /// Return a reason if the run should stop before the next step.
    fn poll(&self) -> Option<StopReason>;
}

/// Never requests a stop; the run ends at its iteration bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverStop;

impl StopSignal for NeverStop {
    fn poll(&self) -> Option<StopReason> {
        None
    }
}

/// Shared cancellation flag.
///
/// Clones share the same flag, so one handle can live on a UI thread while
/// the simulation thread polls another.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an unset token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Check if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl StopSignal for CancelToken {
    fn poll(&self) -> Option<StopReason> {
        self.is_cancelled().then_some(StopReason::Cancelled)
    }
}

/// Stop marker on disk: the run stops once the file exists.
#[derive(Debug, Clone)]
pub struct SentinelFile {
    path: PathBuf,
}

impl SentinelFile {
    /// Watch `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Watched path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove a marker left behind by an earlier run.
    ///
    /// Returns `true` if a stale marker was removed.
    ///
    /// # Errors
    ///
    /// Returns error if the marker exists but cannot be removed.
    pub fn clear_stale(&self) -> SimResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        tracing::info!(path = %self.path.display(), "removed stale stop sentinel");
        Ok(true)
    }
}

impl StopSignal for SentinelFile {
    fn poll(&self) -> Option<StopReason> {
        self.path.exists().then_some(StopReason::StopRequested)
    }
}

/// Either signal stops the run; the first one polled wins.
impl<A: StopSignal, B: StopSignal> StopSignal for (A, B) {
    fn poll(&self) -> Option<StopReason> {
        self.0.poll().or_else(|| self.1.poll())
    }
}

impl<S: StopSignal + ?Sized> StopSignal for &S {
    fn poll(&self) -> Option<StopReason> {
        (**self).poll()
    }
}

impl<S: StopSignal + ?Sized> StopSignal for Box<S> {
    fn poll(&self) -> Option<StopReason> {
        (**self).poll()
    }
}
