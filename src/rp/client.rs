//! The single-flight RP client.
//!
//! One connection, one in-flight operation at a time: a `tokio::sync::Mutex`
//! around the connection serializes every `send`, and the read loop that
//! merges messages until a terminal status runs inline inside the caller's
//! `send` rather than as an independent background task (spec.md §3, §9 --
//! this bridge never pipelines concurrent ops onto one backend session).

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::{BridgeError, Result};
use crate::rp::codec::{decode_value, encode_value};
use crate::rp::connection::Connection;
use crate::rp::message::{Merger, MergedReply, RpMessage, RpValue};

/// Owns the (possibly absent) connection to an RP backend and serializes
/// every operation sent to it.
pub struct RpClient {
    conn: Mutex<Option<Connection>>,
    next_id: AtomicU64,
    /// How long to wait for a terminal status before giving up on an op.
    pub eval_timeout: Duration,
    /// Per-connection cache of which native middleware ops the backend
    /// supports, keyed by op name. Cleared on every `connect()` -- the
    /// decision is scoped to one connection and re-made on reconnect,
    /// since a different backend process may load different middleware.
    native_ops: Mutex<HashMap<String, bool>>,
}

impl RpClient {
    /// Build a client with no connection yet.
    pub fn new(eval_timeout: Duration) -> Self {
        Self {
            conn: Mutex::new(None),
            next_id: AtomicU64::new(1),
            eval_timeout,
            native_ops: Mutex::new(HashMap::new()),
        }
    }

    fn fresh_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    /// `true` if a connection is currently held.
    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    /// Address of the current connection, if any.
    pub async fn peer(&self) -> Option<(String, u16)> {
        self.conn
            .lock()
            .await
            .as_ref()
            .map(|c| (c.host.clone(), c.port))
    }

    /// Open a connection to `host:port`, replacing any existing one.
    pub async fn connect(&self, host: &str, port: u16) -> Result<()> {
        let new_conn = Connection::connect(host, port).await?;
        let mut guard = self.conn.lock().await;
        *guard = Some(new_conn);
        self.native_ops.lock().await.clear();
        Ok(())
    }

    /// Drop the current connection, if any.
    pub async fn close(&self) {
        let mut guard = self.conn.lock().await;
        *guard = None;
    }

    /// The cached native-op-support decision for `op`, if one has been made
    /// on the current connection yet.
    pub async fn native_supported(&self, op: &str) -> Option<bool> {
        self.native_ops.lock().await.get(op).copied()
    }

    /// Cache whether `op` is supported natively by the current connection.
    pub async fn set_native_supported(&self, op: &str, supported: bool) {
        self.native_ops.lock().await.insert(op.to_string(), supported);
    }

    /// Send `op` with `fields`, returning the merged reply once a terminal
    /// `"done"` status is observed or `self.eval_timeout` elapses.
    ///
    /// On timeout or transport failure the connection is torn down --
    /// a half-read byte stream can't be trusted for a subsequent op.
    pub async fn send(&self, op: &str, fields: &[(&str, RpValue)]) -> Result<MergedReply> {
        let id = self.fresh_id();
        let mut request: RpMessage = BTreeMap::new();
        request.insert("op".to_string(), RpValue::Str(op.to_string()));
        request.insert("id".to_string(), RpValue::Str(id.clone()));
        for (k, v) in fields {
            request.insert((*k).to_string(), v.clone());
        }

        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(BridgeError::NotConnected)?;

        let write_result = encode_value(&RpValue::Dict(request), &mut conn.writer).await;
        if let Err(e) = write_result {
            *guard = None;
            return Err(e);
        }

        let result = tokio::time::timeout(self.eval_timeout, Self::read_until_done(conn, &id)).await;
        match result {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => {
                *guard = None;
                Err(e)
            }
            Err(_) => {
                *guard = None;
                Err(BridgeError::EvalTimeout(self.eval_timeout))
            }
        }
    }

    async fn read_until_done(conn: &mut Connection, expected_id: &str) -> Result<MergedReply> {
        let mut messages = Vec::new();
        loop {
            let value = decode_value(&mut conn.reader).await?;
            let RpValue::Dict(msg) = value else {
                return Err(BridgeError::Codec(
                    "RP message must be a dictionary".to_string(),
                ));
            };
            let belongs = msg
                .get("id")
                .and_then(RpValue::as_str)
                .map(|id| id == expected_id)
                .unwrap_or(false);
            if !belongs {
                continue;
            }
            let done = matches!(
                msg.get("status"),
                Some(RpValue::List(items)) if items.iter().any(|v| v.as_str() == Some("done"))
            );
            messages.push(msg);
            if done {
                return Ok(Merger::merge(&messages));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    use tokio::io::AsyncReadExt;

    fn dict(fields: &[(&str, RpValue)]) -> RpValue {
        RpValue::Dict(fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    fn status(tags: &[&str]) -> RpValue {
        RpValue::List(tags.iter().map(|t| RpValue::Str(t.to_string())).collect())
    }

    async fn spawn_fake_backend(replies: Vec<RpValue>) -> (String, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut scratch = [0u8; 1024];
            let _ = socket.read(&mut scratch).await;
            for reply in replies {
                socket.write_all(&crate::rp::codec::encode_to_vec(&reply)).await.unwrap();
            }
        });
        (addr.ip().to_string(), addr.port())
    }

    #[tokio::test]
    async fn send_merges_until_done() {
        let (host, port) = spawn_fake_backend(vec![
            dict(&[("id", RpValue::Str("1".into())), ("out", RpValue::Str("hello ".into())), ("status", status(&[]))]),
            dict(&[("id", RpValue::Str("1".into())), ("out", RpValue::Str("world".into()))]),
            dict(&[("id", RpValue::Str("1".into())), ("status", status(&["done"]))]),
        ])
        .await;
        let client = RpClient::new(Duration::from_secs(5));
        client.connect(&host, port).await.unwrap();
        let reply = client
            .send("eval", &[("code", RpValue::Str("(+ 1 1)".into()))])
            .await
            .unwrap();
        assert_eq!(reply.out, "hello world");
        assert!(reply.is_done());
    }

    #[tokio::test]
    async fn send_ignores_spurious_done_message_without_matching_id() {
        let (host, port) = spawn_fake_backend(vec![
            dict(&[("status", status(&["done"]))]),
            dict(&[("id", RpValue::Str("1".into())), ("value", RpValue::Str("6".into())), ("status", status(&["done"]))]),
        ])
        .await;
        let client = RpClient::new(Duration::from_secs(5));
        client.connect(&host, port).await.unwrap();
        let reply = client
            .send("eval", &[("code", RpValue::Str("(+ 1 2 3)".into()))])
            .await
            .unwrap();
        assert_eq!(reply.value.as_deref(), Some("6"));
    }

    #[tokio::test]
    async fn send_without_connection_errors() {
        let client = RpClient::new(Duration::from_secs(1));
        let err = client.send("eval", &[]).await.unwrap_err();
        assert_eq!(err.kind(), "not-connected");
    }

    #[tokio::test]
    async fn send_times_out_when_backend_is_silent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });
        let client = RpClient::new(Duration::from_millis(50));
        client.connect(&addr.ip().to_string(), addr.port()).await.unwrap();
        let err = client.send("eval", &[]).await.unwrap_err();
        assert_eq!(err.kind(), "eval-timeout");
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn close_drops_connection() {
        let (host, port) = spawn_fake_backend(vec![dict(&[("status", status(&["done"]))])]).await;
        let client = RpClient::new(Duration::from_secs(5));
        client.connect(&host, port).await.unwrap();
        assert!(client.is_connected().await);
        client.close().await;
        assert!(!client.is_connected().await);
    }

    #[tokio::test]
    async fn native_op_support_is_cached_and_cleared_on_reconnect() {
        let (host, port) = spawn_fake_backend(vec![]).await;
        let client = RpClient::new(Duration::from_secs(5));
        assert_eq!(client.native_supported("apropos").await, None);
        client.set_native_supported("apropos", false).await;
        assert_eq!(client.native_supported("apropos").await, Some(false));

        client.connect(&host, port).await.unwrap();
        assert_eq!(
            client.native_supported("apropos").await,
            None,
            "reconnecting must re-make the native-op decision"
        );
    }
}
