//! `doc` -- fetch a symbol's docstring, via the `info` middleware op when
//! present, else by synthesizing a call to `clojure.repl/doc` through `eval`.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::mcp::CallToolResult;
use crate::rp::RpValue;
use crate::state::StateCore;
use crate::tools::{native_or_eval, optional_str, required_str, resolve_session, ToolExecutor};

pub struct DocTool;

#[async_trait]
impl ToolExecutor for DocTool {
    fn name(&self) -> &'static str {
        "doc"
    }

    fn description(&self) -> &'static str {
        "Fetch the docstring for a symbol."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {"type": "string", "description": "Fully or partially qualified symbol name"},
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
            Some(ns) => format!("(binding [*ns* (the-ns '{ns})] (clojure.repl/doc {symbol}))"),
            None => format!("(clojure.repl/doc {symbol})"),
        })
        .await?;

        let text = reply
            .last_field("doc")
            .unwrap_or_else(|| if reply.out.is_empty() { format!("no doc found for {symbol}") } else { reply.out.clone() });

        Ok(CallToolResult::ok_text(text))
    }
}
