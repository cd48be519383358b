//! Bounded-duration recording timer with early cancel

use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Upper bound for an SOS recording
pub const SOS_RECORDING_LIMIT: Duration = Duration::from_secs(4 * 60);

/// Upper bound for a voice guidance recording
pub const VOICE_RECORDING_LIMIT: Duration = Duration::from_secs(2 * 60);

/// Why a recording ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The time limit was reached
    DeadlineReached,
    /// Stopped explicitly before the limit
    Stopped,
}

/// A one-shot timer that fires at its deadline or when stopped, whichever
/// comes first
#[derive(Debug)]
pub struct RecordingTimer {
    started: Instant,
    limit: Duration,
    stop_tx: Option<oneshot::Sender<()>>,
    outcome: watch::Receiver<Option<StopReason>>,
    task: JoinHandle<()>,
}

impl RecordingTimer {
    /// Start timing. Must be called within a tokio runtime.
    pub fn start(limit: Duration) -> Self {
        let started = Instant::now();
        let deadline = started + limit;
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let (outcome_tx, outcome) = watch::channel(None);

        let task = tokio::spawn(async move {
            let reason = tokio::select! {
                _ = tokio::time::sleep_until(deadline) => StopReason::DeadlineReached,
                // A dropped sender counts as a stop
                _ = stop_rx => StopReason::Stopped,
            };
            debug!("Recording timer finished: {:?}", reason);
            outcome_tx.send_replace(Some(reason));
        });

        Self {
            started,
            limit,
            stop_tx: Some(stop_tx),
            outcome,
            task,
        }
    }

    /// Stop early. Stopping an already finished timer has no effect.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Wait for the timer to finish and report why it did
    pub async fn finished(&mut self) -> StopReason {
        match self.outcome.wait_for(Option::is_some).await {
            Ok(reason) => (*reason).unwrap_or(StopReason::Stopped),
            // The task is gone without reporting, which only happens on runtime shutdown
            Err(_) => StopReason::Stopped,
        }
    }

    /// How the timer ended, if it has
    pub fn outcome(&self) -> Option<StopReason> {
        *self.outcome.borrow()
    }

    /// Configured limit
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Time since start, capped at the limit
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed().min(self.limit)
    }

    /// Time remaining before the deadline
    pub fn time_left(&self) -> Duration {
        if self.outcome().is_some() {
            return Duration::ZERO;
        }
        self.limit.saturating_sub(self.started.elapsed())
    }

    /// Fraction of the limit used so far, between 0.0 and 1.0
    pub fn progress(&self) -> f64 {
        if self.limit.is_zero() {
            return 1.0;
        }
        (self.elapsed().as_secs_f64() / self.limit.as_secs_f64()).clamp(0.0, 1.0)
    }
}

impl Drop for RecordingTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
