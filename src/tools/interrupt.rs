//! `interrupt` -- ask the backend to interrupt a running evaluation.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::mcp::CallToolResult;
use crate::rp::RpValue;
use crate::state::StateCore;
use crate::tools::{optional_str, resolve_session, ToolExecutor};

pub struct InterruptTool;

#[async_trait]
impl ToolExecutor for InterruptTool {
    fn name(&self) -> &'static str {
        "interrupt"
    }

    fn description(&self) -> &'static str {
        "Interrupt a pending evaluation in a session."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session": {"type": "string"},
                "interrupt_id": {"type": "string", "description": "The id of the in-flight eval message to interrupt"},
            },
        })
    }

    async fn call(&self, state: &StateCore, arguments: Value) -> Result<CallToolResult> {
        let session = resolve_session(state, &arguments).await;
        let mut fields = Vec::new();
        if let Some(session) = &session {
            fields.push(("session", RpValue::Str(session.clone())));
        }
        if let Some(id) = optional_str(&arguments, "interrupt_id") {
            fields.push(("interrupt-id", RpValue::Str(id)));
        }

        let reply = state.rp.send("interrupt", &fields).await?;
        let outcome = reply.status.join(",");
        Ok(CallToolResult::ok_text(format!("interrupt status: {outcome}")))
    }
}
