//! `status` -- a snapshot of connection, sessions, and recent activity.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::mcp::CallToolResult;
use crate::state::StateCore;
use crate::tools::ToolExecutor;

pub struct StatusTool;

#[async_trait]
impl ToolExecutor for StatusTool {
    fn name(&self) -> &'static str {
        "status"
    }

    fn description(&self) -> &'static str {
        "Report whether the bridge is connected, its known sessions, and recent tool activity."
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn call(&self, state: &StateCore, _arguments: Value) -> Result<CallToolResult> {
        let connected = state.rp.is_connected().await;
        let peer = state.peer().await;
        let sessions = state.sessions_snapshot().await;
        let history = state.history_snapshot().await;

        let mut text = String::new();
        text.push_str(&format!("connected: {connected}\n"));
        if let Some((host, port)) = peer {
            text.push_str(&format!("backend: {host}:{port}\n"));
        }
        text.push_str(&format!("sessions: {}\n", sessions.len()));
        for session in &sessions {
            text.push_str(&format!(
                "  {} (ns={})\n",
                session.id,
                session.namespace.as_deref().unwrap_or("?")
            ));
        }
        text.push_str(&format!("recent commands: {}\n", history.len()));
        for record in history.iter().rev().take(5) {
            text.push_str(&format!(
                "  #{} {} ({})\n",
                record.seq,
                record.tool,
                if record.is_error { "error" } else { "ok" }
            ));
        }

        Ok(CallToolResult::ok_text(text))
    }
}
