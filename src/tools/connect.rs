//! `connect` -- open (or reopen) the bridge's connection to a backend.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::mcp::CallToolResult;
use crate::state::StateCore;
use crate::tools::{optional_str, ToolExecutor};

pub struct ConnectTool;

#[async_trait]
impl ToolExecutor for ConnectTool {
    fn name(&self) -> &'static str {
        "connect"
    }

    fn description(&self) -> &'static str {
        "Connect the bridge to a backend at host:port. Omit both to use sentinel-file discovery in the configured workspace."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "host": {"type": "string", "description": "Backend host; defaults to localhost"},
                "port": {"type": "integer", "description": "Backend port; if omitted, discovery is attempted"},
            },
        })
    }

    async fn call(&self, state: &StateCore, arguments: Value) -> Result<CallToolResult> {
        let host = optional_str(&arguments, "host").unwrap_or_else(|| "localhost".to_string());
        let port = match arguments.get("port").and_then(Value::as_u64) {
            Some(p) => p as u16,
            None => {
                crate::rp::discovery::discover(
                    &state.workspace,
                    crate::rp::discovery::DEFAULT_SENTINEL_NAME,
                    state.discovery_deadline,
                )
                .await?
            }
        };

        state.rp.connect(&host, port).await?;
        state.set_peer(host.clone(), port).await;

        let reply = state.rp.send("clone", &[]).await?;
        let session_id = reply
            .last_field("new-session")
            .ok_or_else(|| crate::error::BridgeError::Internal("clone op returned no new-session".to_string()))?;
        state.register_session(session_id.clone()).await;

        Ok(CallToolResult::ok_text(format!(
            "connected to {host}:{port}, default session {session_id}"
        )))
    }
}
