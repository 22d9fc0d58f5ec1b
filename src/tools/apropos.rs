//! `apropos` -- search for symbols matching a substring or pattern.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::mcp::CallToolResult;
use crate::rp::RpValue;
use crate::state::StateCore;
use crate::tools::{native_or_eval, optional_str, required_str, resolve_session, ToolExecutor};

pub struct AproposTool;

#[async_trait]
impl ToolExecutor for AproposTool {
    fn name(&self) -> &'static str {
        "apropos"
    }

    fn description(&self) -> &'static str {
        "Search loaded namespaces for symbols matching a substring."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "search-ns": {"type": "string", "description": "Restrict the search to a single namespace"},
            },
            "required": ["query"],
        })
    }

    async fn call(&self, state: &StateCore, arguments: Value) -> Result<CallToolResult> {
        let query = required_str(&arguments, "query")?;
        let search_ns = optional_str(&arguments, "search-ns");
        let session = resolve_session(state, &arguments).await;

        let mut native_fields = vec![("query", RpValue::Str(query.clone()))];
        if let Some(ns) = &search_ns {
            native_fields.push(("ns", RpValue::Str(ns.clone())));
        }
        let reply = native_or_eval(state, session.as_deref(), "apropos", &native_fields, || match &search_ns {
            Some(ns) => format!(
                "(->> (ns-publics '{ns}) keys (map name) (filter #(clojure.string/includes? % \"{}\")) sort)",
                query.replace('"', "\\\"")
            ),
            None => format!("(clojure.repl/apropos \"{}\")", query.replace('"', "\\\"")),
        })
        .await?;

        let matches: Vec<String> = reply
            .last_field("apropos-matches")
            .map(|s| vec![s])
            .unwrap_or_default();

        let text = if matches.is_empty() {
            if reply.value.is_some() {
                reply.value.clone().unwrap_or_default()
            } else {
                format!("no matches for '{query}'")
            }
        } else {
            matches.join("\n")
        };

        Ok(CallToolResult::ok_text(text))
    }
}
