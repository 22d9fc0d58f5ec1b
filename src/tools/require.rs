//! `require` -- load a namespace into the session.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{BridgeError, Result};
use crate::mcp::CallToolResult;
use crate::rp::RpValue;
use crate::state::StateCore;
use crate::tools::{optional_str, required_str, resolve_session, ToolExecutor};

pub struct RequireTool;

#[async_trait]
impl ToolExecutor for RequireTool {
    fn name(&self) -> &'static str {
        "require"
    }

    fn description(&self) -> &'static str {
        "Require a namespace into the evaluation session, with optional :as/:refer/:reload modifiers."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "namespace": {"type": "string"},
                "as": {"type": "string", "description": "Alias to bind the namespace to"},
                "refer": {"type": "string", "description": "Symbols to refer, e.g. \"[foo bar]\" or \"all\""},
                "reload": {"type": "boolean", "description": "Force a reload even if already loaded"},
            },
            "required": ["namespace"],
        })
    }

    async fn call(&self, state: &StateCore, arguments: Value) -> Result<CallToolResult> {
        let namespace = required_str(&arguments, "namespace")?;
        let alias = optional_str(&arguments, "as");
        let refer = optional_str(&arguments, "refer");
        let reload = arguments.get("reload").and_then(Value::as_bool).unwrap_or(false);
        let session = resolve_session(state, &arguments).await;

        let mut spec = format!("'{namespace}");
        if let Some(alias) = &alias {
            spec.push_str(&format!(" :as {alias}"));
        }
        if let Some(refer) = &refer {
            spec.push_str(&format!(" :refer {refer}"));
        }
        if reload {
            spec.push_str(" :reload");
        }

        let mut fields = vec![("code", RpValue::Str(format!("(require {spec})")))];
        if let Some(session) = &session {
            fields.push(("session", RpValue::Str(session.clone())));
        }

        let reply = state.rp.send("eval", &fields).await?;
        if let Some(ex) = &reply.ex {
            return Err(BridgeError::EvalError {
                ex: ex.clone(),
                root_ex: reply.root_ex.clone(),
            });
        }

        Ok(CallToolResult::ok_text(format!("required {namespace}")))
    }
}
