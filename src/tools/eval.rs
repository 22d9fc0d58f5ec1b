//! `eval` -- evaluate code in a session, merging the backend's message
//! sequence into one reply (spec.md §3).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{BridgeError, Result};
use crate::mcp::CallToolResult;
use crate::rp::RpValue;
use crate::state::StateCore;
use crate::tools::{optional_str, required_str, resolve_session, ToolExecutor};

pub struct EvalTool;

#[async_trait]
impl ToolExecutor for EvalTool {
    fn name(&self) -> &'static str {
        "eval"
    }

    fn description(&self) -> &'static str {
        "Evaluate code in the backend, in a given or the default session."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {"type": "string", "description": "Code to evaluate"},
                "session": {"type": "string", "description": "Session id; defaults to the bridge's default session"},
                "ns": {"type": "string", "description": "Namespace to bind *ns* to before evaluating"},
            },
            "required": ["code"],
        })
    }

    async fn call(&self, state: &StateCore, arguments: Value) -> Result<CallToolResult> {
        let code = required_str(&arguments, "code")?;
        let session = resolve_session(state, &arguments).await;
        let ns = optional_str(&arguments, "ns");

        let mut fields = vec![("code", RpValue::Str(code))];
        if let Some(session) = &session {
            fields.push(("session", RpValue::Str(session.clone())));
        }
        if let Some(ns) = &ns {
            fields.push(("ns", RpValue::Str(ns.clone())));
        }

        let reply = state.rp.send("eval", &fields).await?;

        if let Some(session) = &session {
            state.touch_session(session, reply.ns.clone()).await;
        }

        if let Some(ex) = &reply.ex {
            return Err(BridgeError::EvalError {
                ex: ex.clone(),
                root_ex: reply.root_ex.clone(),
            });
        }

        let mut text = String::new();
        if !reply.out.is_empty() {
            text.push_str(&reply.out);
        }
        if !reply.err.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&reply.err);
        }
        if let Some(value) = &reply.value {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(value);
        }

        Ok(CallToolResult::ok_text(text).with_eval_meta(reply.session.clone().or(session), reply.ns.clone()))
    }
}
