//! `source` -- fetch a symbol's source form.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::mcp::CallToolResult;
use crate::rp::RpValue;
use crate::state::StateCore;
use crate::tools::{native_or_eval, optional_str, required_str, resolve_session, ToolExecutor};

pub struct SourceTool;

#[async_trait]
impl ToolExecutor for SourceTool {
    fn name(&self) -> &'static str {
        "source"
    }

    fn description(&self) -> &'static str {
        "Fetch the source form for a symbol."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {"type": "string"},
                "ns": {"type": "string", "description": "Namespace to resolve the symbol in"},
            },
            "required": ["symbol"],
        })
    }

    async fn call(&self, state: &StateCore, arguments: Value) -> Result<CallToolResult> {
        let symbol = required_str(&arguments, "symbol")?;
        let ns = optional_str(&arguments, "ns");
        let session = resolve_session(state, &arguments).await;

        let mut native_fields = vec![("sym", RpValue::Str(symbol.clone()))];
        if let Some(ns) = &ns {
            native_fields.push(("ns", RpValue::Str(ns.clone())));
        }
        let eval_ns = ns.clone();
        let reply = native_or_eval(state, session.as_deref(), "info", &native_fields, || match &eval_ns {
            Some(ns) => format!("(binding [*ns* (the-ns '{ns})] (clojure.repl/source {symbol}))"),
            None => format!("(clojure.repl/source {symbol})"),
        })
        .await?;

        let text = reply
            .last_field("source")
            .or_else(|| (!reply.out.is_empty()).then(|| reply.out.clone()))
            .unwrap_or_else(|| format!("no source found for {symbol}"));

        Ok(CallToolResult::ok_text(text))
    }
}
