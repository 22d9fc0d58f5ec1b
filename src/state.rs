//! Shared bridge state: sessions, the recent-command ring buffer, and the
//! single RP client every tool dispatches through.
//!
//! The RP client manages its own locking internally (it's single-flight by
//! design, see [`crate::rp::client`]), so it lives outside the `RwLock` here.
//! Everything else -- sessions, history, the default session pointer -- is
//! read far more often than written, hence `RwLock` over `Mutex`: tool
//! handlers that only need a snapshot (e.g. `status`) never block each other.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::rp::RpClient;

/// A cap-bounded FIFO. Pushing past `cap` evicts the oldest entry -- the cap
/// is authoritative, never advisory (spec.md §9).
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    cap: usize,
    items: VecDeque<T>,
}

impl<T> RingBuffer<T> {
    /// Build an empty ring buffer holding at most `cap` items.
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            items: VecDeque::with_capacity(cap),
        }
    }

    /// Push `item`, evicting the oldest entry if the buffer is already full.
    pub fn push(&mut self, item: T) {
        if self.items.len() >= self.cap {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Number of items currently held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` if no items are held.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A record of one tool invocation, kept for the `resources/read` history
/// view and for the `status` tool's recent-activity summary.
#[derive(Debug, Clone)]
pub struct CommandRecord {
    /// Monotonically increasing sequence number, unique within a run.
    pub seq: u64,
    /// The tool name invoked.
    pub tool: String,
    /// A short, human-readable summary of the arguments (never the full
    /// payload -- this buffer is meant for `resources/read`, not audit).
    pub summary: String,
    /// `true` if the tool call failed.
    pub is_error: bool,
    /// When the invocation completed.
    pub at: Instant,
}

/// An RP session known to this bridge.
#[derive(Debug, Clone)]
pub struct Session {
    /// The RP-side session id.
    pub id: String,
    /// When this session was created (via `clone` or implicit default).
    pub created_at: Instant,
    /// When this session was last used by a tool call.
    pub last_used_at: Instant,
    /// The namespace this session was last observed evaluating in.
    pub namespace: Option<String>,
}

impl Session {
    fn new(id: String) -> Self {
        let now = Instant::now();
        Self {
            id,
            created_at: now,
            last_used_at: now,
            namespace: None,
        }
    }
}

struct StateInner {
    sessions: HashMap<String, Session>,
    default_session: Option<String>,
    history: RingBuffer<CommandRecord>,
    next_seq: u64,
    host: Option<String>,
    port: Option<u16>,
}

/// Shared, cheaply-clonable handle to the bridge's mutable state.
///
/// Invariants maintained across every method below:
///
/// - I1: `default_session`, if `Some`, always names a key present in `sessions`.
/// - I2: `history.len() <= history_cap` always.
/// - I3: `CommandRecord::seq` values are strictly increasing within a run.
/// - I4: a session's `last_used_at` only moves forward.
/// - I5: `rp` is the single source of truth for connectivity; `StateInner`
///   never independently tracks a "connected" bool that could drift from it.
#[derive(Clone)]
pub struct StateCore {
    /// The single RP client every tool dispatches through.
    pub rp: Arc<RpClient>,
    /// The configured workspace directory discovery polls for the sentinel
    /// file in, honoring the `WORKSPACE`/`--workspace` override.
    pub workspace: Arc<PathBuf>,
    /// The configured deadline for sentinel-file discovery.
    pub discovery_deadline: Duration,
    inner: Arc<RwLock<StateInner>>,
}

impl StateCore {
    /// Build fresh state with no sessions and an empty history buffer.
    pub fn new(rp: Arc<RpClient>, history_cap: usize, workspace: PathBuf, discovery_deadline: Duration) -> Self {
        Self {
            rp,
            workspace: Arc::new(workspace),
            discovery_deadline,
            inner: Arc::new(RwLock::new(StateInner {
                sessions: HashMap::new(),
                default_session: None,
                history: RingBuffer::new(history_cap),
                next_seq: 0,
                host: None,
                port: None,
            })),
        }
    }

    /// Record the backend address once discovery or `connect` succeeds.
    pub async fn set_peer(&self, host: String, port: u16) {
        let mut inner = self.inner.write().await;
        inner.host = Some(host);
        inner.port = Some(port);
    }

    /// The backend address, if known.
    pub async fn peer(&self) -> Option<(String, u16)> {
        let inner = self.inner.read().await;
        match (&inner.host, inner.port) {
            (Some(h), Some(p)) => Some((h.clone(), p)),
            _ => None,
        }
    }

    /// Register `session_id`, making it the default if none is set yet.
    pub async fn register_session(&self, session_id: String) {
        let mut inner = self.inner.write().await;
        if inner.default_session.is_none() {
            inner.default_session = Some(session_id.clone());
        }
        inner
            .sessions
            .entry(session_id.clone())
            .or_insert_with(|| Session::new(session_id));
    }

    /// The default session id, if any session has been established.
    pub async fn default_session(&self) -> Option<String> {
        self.inner.read().await.default_session.clone()
    }

    /// Resolve a tool call's effective session: the caller-supplied id if
    /// present, otherwise the default.
    pub async fn resolve_session(&self, requested: Option<&str>) -> Option<String> {
        match requested {
            Some(id) => Some(id.to_string()),
            None => self.default_session().await,
        }
    }

    /// Touch a session's `last_used_at` and, if known, its namespace.
    pub async fn touch_session(&self, session_id: &str, namespace: Option<String>) {
        let mut inner = self.inner.write().await;
        if let Some(session) = inner.sessions.get_mut(session_id) {
            session.last_used_at = Instant::now();
            if namespace.is_some() {
                session.namespace = namespace;
            }
        }
    }

    /// Snapshot of all known sessions, for the `status` tool.
    pub async fn sessions_snapshot(&self) -> Vec<Session> {
        self.inner.read().await.sessions.values().cloned().collect()
    }

    /// How long a session has existed.
    pub fn session_age(session: &Session) -> Duration {
        session.created_at.elapsed()
    }

    /// Append a command record, evicting the oldest if the buffer is full.
    pub async fn record_command(&self, tool: &str, summary: String, is_error: bool) -> u64 {
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.history.push(CommandRecord {
            seq,
            tool: tool.to_string(),
            summary,
            is_error,
            at: Instant::now(),
        });
        seq
    }

    /// Snapshot of the recent-command history, oldest first.
    pub async fn history_snapshot(&self) -> Vec<CommandRecord> {
        self.inner.read().await.history.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn test_state() -> StateCore {
        StateCore::new(
            Arc::new(RpClient::new(StdDuration::from_secs(5))),
            3,
            PathBuf::from("."),
            StdDuration::from_secs(5),
        )
    }

    #[test]
    fn ring_buffer_evicts_oldest_past_cap() {
        let mut rb = RingBuffer::new(2);
        rb.push(1);
        rb.push(2);
        rb.push(3);
        let items: Vec<_> = rb.iter().copied().collect();
        assert_eq!(items, vec![2, 3]);
    }

    #[tokio::test]
    async fn first_registered_session_becomes_default() {
        let state = test_state();
        state.register_session("sess-a".to_string()).await;
        state.register_session("sess-b".to_string()).await;
        assert_eq!(state.default_session().await, Some("sess-a".to_string()));
    }

    #[tokio::test]
    async fn resolve_session_prefers_explicit_over_default() {
        let state = test_state();
        state.register_session("sess-a".to_string()).await;
        let resolved = state.resolve_session(Some("sess-b")).await;
        assert_eq!(resolved, Some("sess-b".to_string()));
    }

    #[tokio::test]
    async fn history_respects_cap() {
        let state = test_state();
        for i in 0..5 {
            state.record_command("eval", format!("call {i}"), false).await;
        }
        let history = state.history_snapshot().await;
        assert_eq!(history.len(), 3);
        assert_eq!(history.first().unwrap().summary, "call 2");
        assert_eq!(history.last().unwrap().summary, "call 4");
    }

    #[tokio::test]
    async fn sequence_numbers_strictly_increase() {
        let state = test_state();
        let a = state.record_command("eval", "a".to_string(), false).await;
        let b = state.record_command("eval", "b".to_string(), false).await;
        assert!(b > a);
    }
}
