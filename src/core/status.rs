//! Run status published to observers
//!
//! The coordinator owns a [`StatusTracker`]; anything that wants to watch a
//! run (the CLI progress printer, a future serving layer) takes a read-only
//! `watch::Receiver` from [`StatusTracker::subscribe`].

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Regions,
    Registry,
    Geocoding,
    Finished,
}

/// Snapshot of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStatus {
    pub state: RunState,
    pub phase: Phase,
    pub message: String,
    /// 0.0 to 100.0 within the current phase
    pub percent: f64,
    pub eta: Option<Duration>,
    pub processed: u64,
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl RunStatus {
    pub fn idle() -> Self {
        Self {
            state: RunState::Idle,
            phase: Phase::Idle,
            message: String::new(),
            percent: 0.0,
            eta: None,
            processed: 0,
            total: 0,
            succeeded: 0,
            failed: 0,
        }
    }
}

impl Default for RunStatus {
    fn default() -> Self {
        Self::idle()
    }
}

/// Progress figures for one step of a phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub processed: u64,
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub eta: Option<Duration>,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.processed as f64 / self.total as f64 * 100.0).min(100.0)
    }
}

/// Estimated time left, extrapolated from the average so far
pub fn estimate_remaining(elapsed: Duration, processed: u64, total: u64) -> Option<Duration> {
    if processed == 0 {
        return None;
    }
    let remaining = total.saturating_sub(processed);
    Some(elapsed.mul_f64(remaining as f64 / processed as f64))
}

#[derive(Debug, Clone)]
pub struct StatusTracker {
    tx: Arc<watch::Sender<RunStatus>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RunStatus::idle());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<RunStatus> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> RunStatus {
        self.tx.borrow().clone()
    }

    /// Resets everything and marks a new run as started
    pub fn begin(&self, message: impl Into<String>) {
        self.tx.send_replace(RunStatus {
            state: RunState::Running,
            message: message.into(),
            ..RunStatus::idle()
        });
    }

    /// Enters a phase, clearing the previous phase's counters
    pub fn enter_phase(&self, phase: Phase, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|status| {
            status.phase = phase;
            status.message = message;
            status.percent = 0.0;
            status.eta = None;
            status.processed = 0;
            status.total = 0;
            status.succeeded = 0;
            status.failed = 0;
        });
    }

    pub fn progress(&self, progress: Progress, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|status| {
            status.message = message;
            status.percent = progress.percent();
            status.eta = progress.eta;
            status.processed = progress.processed;
            status.total = progress.total;
            status.succeeded = progress.succeeded;
            status.failed = progress.failed;
        });
    }

    pub fn finish(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|status| {
            status.state = RunState::Done;
            status.phase = Phase::Finished;
            status.message = message;
            status.eta = None;
        });
    }

    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|status| {
            status.state = RunState::Failed;
            status.message = message;
            status.eta = None;
        });
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}
