//! `load-file` -- send a local file's contents to the backend's `load-file`
//! op (falls back to a plain `eval` of the file's forms when unsupported).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::mcp::CallToolResult;
use crate::rp::RpValue;
use crate::state::StateCore;
use crate::tools::{native_or_eval, required_str, resolve_session, ToolExecutor};

pub struct LoadFileTool;

#[async_trait]
impl ToolExecutor for LoadFileTool {
    fn name(&self) -> &'static str {
        "load-file"
    }

    fn description(&self) -> &'static str {
        "Load a local file's contents into the backend."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file-path": {"type": "string", "description": "Path to the file, resolved relative to the bridge's working directory"},
                "session": {"type": "string"},
                "ns": {"type": "string"},
            },
            "required": ["file-path"],
        })
    }

    async fn call(&self, state: &StateCore, arguments: Value) -> Result<CallToolResult> {
        let path = required_str(&arguments, "file-path")?;
        let session = resolve_session(state, &arguments).await;
        let contents = tokio::fs::read_to_string(&path).await?;

        let reply = native_or_eval(
            state,
            session.as_deref(),
            "load-file",
            &[
                ("file", RpValue::Str(contents.clone())),
                ("file-path", RpValue::Str(path.clone())),
            ],
            || contents.clone(),
        )
        .await?;

        if let Some(ex) = &reply.ex {
            return Err(crate::error::BridgeError::EvalError {
                ex: ex.clone(),
                root_ex: reply.root_ex.clone(),
            });
        }

        Ok(CallToolResult::ok_text(format!("loaded {path}")))
    }
}
