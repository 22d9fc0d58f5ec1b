//! `describe` -- report the backend's advertised ops and versions.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::mcp::CallToolResult;
use crate::rp::RpValue;
use crate::state::StateCore;
use crate::tools::ToolExecutor;

pub struct DescribeTool;

#[async_trait]
impl ToolExecutor for DescribeTool {
    fn name(&self) -> &'static str {
        "describe"
    }

    fn description(&self) -> &'static str {
        "List the backend's supported ops and version information."
    }

    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn call(&self, state: &StateCore, _arguments: Value) -> Result<CallToolResult> {
        let reply = state.rp.send("describe", &[] as &[(&str, RpValue)]).await?;
        let ops = reply
            .raw
            .iter()
            .find_map(|m| m.get("ops"))
            .map(describe_ops)
            .unwrap_or_default();

        let mut text = String::new();
        if ops.is_empty() {
            text.push_str("backend reported no ops\n");
        } else {
            text.push_str(&format!("{} ops supported:\n", ops.len()));
            for op in ops {
                text.push_str(&format!("  {op}\n"));
            }
        }
        Ok(CallToolResult::ok_text(text))
    }
}

fn describe_ops(value: &RpValue) -> Vec<String> {
    match value {
        RpValue::Dict(map) => {
            let mut ops: Vec<String> = map.keys().cloned().collect();
            ops.sort();
            ops
        }
        _ => Vec::new(),
    }
}
