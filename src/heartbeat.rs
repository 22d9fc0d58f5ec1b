//! Background connection-health monitoring.
//!
//! A lightweight timer fires a native `describe` op at the backend on an
//! interval. `describe` is side-effect free and nREPL-native, so it never
//! perturbs session state the way a stray `eval` probe would. Three
//! consecutive failures and the heartbeat gives up on the connection,
//! closing it so the next tool call surfaces `not-connected` instead of
//! hanging on a dead socket.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::rp::RpValue;
use crate::state::StateCore;

/// Consecutive probe failures tolerated before the connection is torn down.
pub const FAILURE_THRESHOLD: u32 = 3;

/// Outcome of the most recent heartbeat probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The backend answered in time.
    Ok,
    /// The backend did not answer, answered with an error, or timed out.
    Failed,
}

/// The heartbeat's observed state, readable by the `status` and
/// `health_check` tools.
#[derive(Debug, Clone, Default)]
pub struct HeartbeatRecord {
    /// When the most recent probe ran.
    pub last_probe_at: Option<Instant>,
    /// The most recent probe's outcome.
    pub last_outcome: Option<ProbeOutcome>,
    /// How many probes have failed in a row.
    pub consecutive_failures: u32,
}

/// Shared handle to the heartbeat's record, plus the means to stop it.
#[derive(Clone)]
pub struct Heartbeat {
    record: Arc<RwLock<HeartbeatRecord>>,
    cancel: CancellationToken,
}

impl Heartbeat {
    /// Spawn the background probe loop, firing every `interval` until the
    /// returned [`Heartbeat`] is dropped or [`Heartbeat::stop`] is called.
    pub fn spawn(state: StateCore, interval: Duration, probe_timeout: Duration) -> Self {
        let record = Arc::new(RwLock::new(HeartbeatRecord::default()));
        let cancel = CancellationToken::new();
        let task_record = record.clone();
        let task_cancel = cancel.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        Self::run_probe(&state, &task_record, probe_timeout).await;
                    }
                }
            }
        });

        Self { record, cancel }
    }

    async fn run_probe(state: &StateCore, record: &Arc<RwLock<HeartbeatRecord>>, probe_timeout: Duration) {
        if !state.rp.is_connected().await {
            return;
        }
        let outcome = match tokio::time::timeout(probe_timeout, state.rp.send("describe", &[] as &[(&str, RpValue)])).await {
            Ok(Ok(_)) => ProbeOutcome::Ok,
            Ok(Err(e)) => {
                debug!(error = %e, "heartbeat probe failed");
                ProbeOutcome::Failed
            }
            Err(_) => {
                debug!("heartbeat probe timed out");
                ProbeOutcome::Failed
            }
        };

        let mut guard = record.write().await;
        guard.last_probe_at = Some(Instant::now());
        guard.last_outcome = Some(outcome);
        match outcome {
            ProbeOutcome::Ok => guard.consecutive_failures = 0,
            ProbeOutcome::Failed => {
                guard.consecutive_failures += 1;
                if guard.consecutive_failures >= FAILURE_THRESHOLD {
                    warn!(
                        failures = guard.consecutive_failures,
                        "heartbeat exceeded failure threshold, closing connection"
                    );
                    drop(guard);
                    state.rp.close().await;
                    return;
                }
            }
        }
    }

    /// Snapshot the current heartbeat record.
    pub async fn snapshot(&self) -> HeartbeatRecord {
        self.record.read().await.clone()
    }

    /// Stop the background probe loop.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_threshold_is_three() {
        assert_eq!(FAILURE_THRESHOLD, 3);
    }

    #[tokio::test]
    async fn snapshot_is_empty_before_any_probe() {
        let state = StateCore::new(
            Arc::new(crate::rp::RpClient::new(Duration::from_secs(1))),
            4,
            std::path::PathBuf::from("."),
            Duration::from_secs(5),
        );
        let hb = Heartbeat::spawn(state, Duration::from_secs(60), Duration::from_millis(100));
        let snap = hb.snapshot().await;
        assert!(snap.last_outcome.is_none());
        hb.stop();
    }
}
