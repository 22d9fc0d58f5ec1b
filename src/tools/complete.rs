//! `complete` -- completion candidates for a symbol prefix.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::mcp::CallToolResult;
use crate::rp::RpValue;
use crate::state::StateCore;
use crate::tools::{native_or_eval, required_str, resolve_session, ToolExecutor};

pub struct CompleteTool;

#[async_trait]
impl ToolExecutor for CompleteTool {
    fn name(&self) -> &'static str {
        "complete"
    }

    fn description(&self) -> &'static str {
        "List completion candidates for a symbol prefix."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prefix": {"type": "string"},
                "session": {"type": "string"},
            },
            "required": ["prefix"],
        })
    }

    async fn call(&self, state: &StateCore, arguments: Value) -> Result<CallToolResult> {
        let prefix = required_str(&arguments, "prefix")?;
        let session = resolve_session(state, &arguments).await;

        let reply = native_or_eval(
            state,
            session.as_deref(),
            "complete",
            &[("prefix", RpValue::Str(prefix.clone()))],
            || {
                format!(
                    "(->> (all-ns) (mapcat ns-publics) (map (comp name key)) (filter #(clojure.string/starts-with? % \"{prefix}\")) sort)"
                )
            },
        )
        .await?;

        let candidates: Vec<String> = reply
            .raw
            .iter()
            .find_map(|m| m.get("completions"))
            .map(extract_candidates)
            .unwrap_or_default();

        let text = if candidates.is_empty() {
            reply.value.clone().unwrap_or_else(|| format!("no completions for '{prefix}'"))
        } else {
            candidates.join("\n")
        };

        Ok(CallToolResult::ok_text(text))
    }
}

fn extract_candidates(value: &RpValue) -> Vec<String> {
    match value {
        RpValue::List(items) => items
            .iter()
            .filter_map(|item| match item {
                RpValue::Dict(m) => m.get("candidate").and_then(RpValue::as_str).map(str::to_string),
                RpValue::Str(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
