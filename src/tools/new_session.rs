//! `new_session` -- clone a fresh RP session off the current one.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{BridgeError, Result};
use crate::mcp::CallToolResult;
use crate::rp::RpValue;
use crate::state::StateCore;
use crate::tools::{optional_str, ToolExecutor};

pub struct NewSessionTool;

#[async_trait]
impl ToolExecutor for NewSessionTool {
    fn name(&self) -> &'static str {
        "new-session"
    }

    fn description(&self) -> &'static str {
        "Clone a fresh session, optionally off an explicit parent session."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session": {"type": "string", "description": "Parent session id to clone from; defaults to the bridge's default session"},
            },
        })
    }

    async fn call(&self, state: &StateCore, arguments: Value) -> Result<CallToolResult> {
        let parent = match optional_str(&arguments, "session") {
            Some(id) => Some(id),
            None => state.default_session().await,
        };

        let mut fields = Vec::new();
        if let Some(parent) = &parent {
            fields.push(("session", RpValue::Str(parent.clone())));
        }

        let reply = state.rp.send("clone", &fields).await?;
        let new_id = reply
            .last_field("new-session")
            .ok_or_else(|| BridgeError::Internal("clone op returned no new-session".to_string()))?;
        state.register_session(new_id.clone()).await;

        Ok(CallToolResult::ok_text(format!("new session: {new_id}")).with_eval_meta(Some(new_id), None))
    }
}
