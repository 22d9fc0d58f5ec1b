//! The fixed tool catalog (spec.md §4.5) and the registry that serves it.
//!
//! Each tool is a small struct implementing [`ToolExecutor`], grouped one
//! per file below. `build_registry` wires up the closed set the dispatcher
//! serves from `tools/list`; there is no dynamic registration surface.

mod apropos;
mod complete;
mod connect;
mod describe;
mod doc;
mod eval;
mod health_check;
mod interrupt;
mod load_file;
mod new_session;
mod raw;
mod require;
mod source;
mod stacktrace;
mod status;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::mcp::{CallToolResult, ToolDescriptorWire};
use crate::rp::{MergedReply, RpValue};
use crate::state::StateCore;

/// A single tool in the catalog: its descriptor and its handler.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// The tool's unique name, as advertised in `tools/list`.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// JSON schema for the tool's `arguments` object.
    fn input_schema(&self) -> Value;

    /// Run the tool against `state` with the caller-supplied `arguments`.
    async fn call(&self, state: &StateCore, arguments: Value) -> Result<CallToolResult>;

    /// Project this tool's descriptor for `tools/list`.
    fn descriptor(&self) -> ToolDescriptorWire {
        ToolDescriptorWire {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// The closed set of tools this bridge serves, keyed by name.
pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn ToolExecutor>>,
    order: Vec<&'static str>,
}

impl ToolRegistry {
    fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn register(&mut self, tool: Arc<dyn ToolExecutor>) {
        let name = tool.name();
        self.order.push(name);
        self.tools.insert(name, tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.get(name).cloned()
    }

    /// The catalog in registration order, for `tools/list`.
    pub fn descriptors(&self) -> Vec<ToolDescriptorWire> {
        self.order
            .iter()
            .map(|name| self.tools[name].descriptor())
            .collect()
    }
}

/// Build the fixed tool catalog.
pub fn build_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(connect::ConnectTool));
    registry.register(Arc::new(eval::EvalTool));
    registry.register(Arc::new(status::StatusTool));
    registry.register(Arc::new(new_session::NewSessionTool));
    registry.register(Arc::new(describe::DescribeTool));
    registry.register(Arc::new(doc::DocTool));
    registry.register(Arc::new(source::SourceTool));
    registry.register(Arc::new(apropos::AproposTool));
    registry.register(Arc::new(complete::CompleteTool));
    registry.register(Arc::new(require::RequireTool));
    registry.register(Arc::new(load_file::LoadFileTool));
    registry.register(Arc::new(interrupt::InterruptTool));
    registry.register(Arc::new(stacktrace::StacktraceTool));
    registry.register(Arc::new(health_check::HealthCheckTool));
    registry.register(Arc::new(raw::RawTool));
    registry
}

/// Pull a required string field out of a JSON `arguments` object.
pub(crate) fn required_str(args: &Value, key: &str) -> Result<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| crate::error::BridgeError::Schema(format!("missing required argument '{key}'")))
}

/// Pull an optional string field out of a JSON `arguments` object.
pub(crate) fn optional_str(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Resolve the RP session a tool call should run in: explicit `session`
/// argument, else the bridge's default session.
pub(crate) async fn resolve_session(state: &StateCore, args: &Value) -> Option<String> {
    state.resolve_session(optional_str(args, "session").as_deref()).await
}

/// Many tools (`doc`, `source`, `apropos`, `complete`, `require`) prefer a
/// native nREPL middleware op when the backend supports it, falling back to
/// synthesizing the equivalent behavior through a plain `eval` when the
/// backend reports the op is unsupported (nREPL's `"unknown-op"` status).
///
/// This is spec.md §4.5's "native-op-with-eval-fallback" rule: never fail a
/// tool just because an optional middleware isn't loaded. The support
/// decision is cached per op on the `RpClient` (cleared on reconnect), so a
/// backend that doesn't load a given middleware only pays for one wasted
/// native round-trip per connection, not one per call.
pub(crate) async fn native_or_eval(
    state: &StateCore,
    session: Option<&str>,
    native_op: &str,
    native_fields: &[(&str, RpValue)],
    eval_code: impl FnOnce() -> String,
) -> Result<MergedReply> {
    let mut fields: Vec<(&str, RpValue)> = native_fields.to_vec();
    if let Some(session) = session {
        fields.push(("session", RpValue::Str(session.to_string())));
    }

    if state.rp.native_supported(native_op).await != Some(false) {
        let native = state.rp.send(native_op, &fields).await?;
        let supported = !native.status.iter().any(|s| s == "unknown-op");
        state.rp.set_native_supported(native_op, supported).await;
        if supported {
            return Ok(native);
        }
    }

    let mut eval_fields = vec![("code", RpValue::Str(eval_code()))];
    if let Some(session) = session {
        eval_fields.push(("session", RpValue::Str(session.to_string())));
    }
    state.rp.send("eval", &eval_fields).await
}
