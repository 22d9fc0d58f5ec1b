//! `raw` -- send an arbitrary RP message verbatim. An escape hatch for
//! backend ops this bridge doesn't wrap natively; `message` carries the
//! full op dictionary (it must at least contain `op`), per spec.md §4.5.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::{BridgeError, Result};
use crate::mcp::CallToolResult;
use crate::rp::RpValue;
use crate::state::StateCore;
use crate::tools::{resolve_session, ToolExecutor};

pub struct RawTool;

#[async_trait]
impl ToolExecutor for RawTool {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn description(&self) -> &'static str {
        "Send an arbitrary RP message verbatim; returns the merged reply as JSON."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {"type": "object", "description": "The full RP op dictionary, e.g. {\"op\": \"ls-sessions\"}"},
                "session": {"type": "string"},
            },
            "required": ["message"],
        })
    }

    async fn call(&self, state: &StateCore, arguments: Value) -> Result<CallToolResult> {
        let message = arguments
            .get("message")
            .and_then(Value::as_object)
            .ok_or_else(|| BridgeError::Schema("'message' must be an object".to_string()))?;

        let op = message
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::Schema("'message' must contain an 'op' field".to_string()))?
            .to_string();

        let mut owned_fields = json_to_rp_fields(message)?;
        owned_fields.retain(|(k, _)| k != "op");
        if let Some(session) = resolve_session(state, &arguments).await {
            if !owned_fields.iter().any(|(k, _)| k == "session") {
                owned_fields.push(("session".to_string(), RpValue::Str(session)));
            }
        }
        let field_refs: Vec<(&str, RpValue)> = owned_fields.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();

        let reply = state.rp.send(&op, &field_refs).await?;

        let rendered = json!({
            "out": reply.out,
            "err": reply.err,
            "value": reply.value,
            "ex": reply.ex,
            "ns": reply.ns,
            "session": reply.session,
            "status": reply.status,
        });

        Ok(CallToolResult::ok_text(
            serde_json::to_string_pretty(&rendered).map_err(BridgeError::from)?,
        ))
    }
}

fn json_to_rp_fields(obj: &Map<String, Value>) -> Result<Vec<(String, RpValue)>> {
    obj.iter()
        .map(|(k, v)| {
            v.as_str()
                .map(|s| (k.clone(), RpValue::Str(s.to_string())))
                .ok_or_else(|| BridgeError::Schema(format!("field '{k}' must be a string")))
        })
        .collect()
}
