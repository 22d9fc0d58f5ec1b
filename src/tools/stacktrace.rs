//! `stacktrace` -- fetch the stack trace for the session's last exception.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::mcp::CallToolResult;
use crate::rp::RpValue;
use crate::state::StateCore;
use crate::tools::{native_or_eval, resolve_session, ToolExecutor};

pub struct StacktraceTool;

#[async_trait]
impl ToolExecutor for StacktraceTool {
    fn name(&self) -> &'static str {
        "stacktrace"
    }

    fn description(&self) -> &'static str {
        "Fetch the stack trace for the session's last exception."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session": {"type": "string"},
            },
        })
    }

    async fn call(&self, state: &StateCore, arguments: Value) -> Result<CallToolResult> {
        let session = resolve_session(state, &arguments).await;

        let reply = native_or_eval(
            state,
            session.as_deref(),
            "stacktrace",
            &[],
            || "(clojure.repl/pst)".to_string(),
        )
        .await?;

        let frames: Vec<String> = reply
            .raw
            .iter()
            .filter_map(|m| m.get("class").and_then(RpValue::as_str))
            .map(str::to_string)
            .collect();

        let text = if frames.is_empty() {
            if reply.err.is_empty() {
                "no exception recorded for this session".to_string()
            } else {
                reply.err.clone()
            }
        } else {
            frames.join("\n")
        };

        Ok(CallToolResult::ok_text(text))
    }
}
