//! Routes JSON-RPC 2.0 requests to the fixed TP surface: `initialize`,
//! `tools/list`, `tools/call`, `resources/list`, `resources/read`.
//!
//! Tool-handler failures (a bad symbol, a backend exception) are reported
//! inside a successful JSON-RPC response via `CallToolResult.isError` --
//! only malformed requests (unknown method, missing required params,
//! unknown tool name) become JSON-RPC-level errors.

use serde_json::Value;

use crate::error::BridgeError;
use crate::mcp::types::*;
use crate::state::StateCore;
use crate::tools::ToolRegistry;

/// Routes TP requests against a fixed tool/resource catalog and the shared
/// bridge state.
pub struct Dispatcher {
    registry: ToolRegistry,
    state: StateCore,
    server_info: Implementation,
}

impl Dispatcher {
    /// Build a dispatcher serving `registry` against `state`.
    pub fn new(registry: ToolRegistry, state: StateCore) -> Self {
        Self {
            registry,
            state,
            server_info: Implementation {
                name: "replbridge".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// `true` if the backend connection is currently live. Used by transport
    /// health probes that need this without routing a TP request through.
    pub async fn is_connected(&self) -> bool {
        self.state.rp.is_connected().await
    }

    /// Handle one JSON-RPC request, returning `None` for notifications
    /// (requests with no `id`) per the JSON-RPC 2.0 spec.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone()?;
        let outcome = self.route(&request.method, request.params).await;
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    async fn route(&self, method: &str, params: Option<Value>) -> Result<Value, JsonRpcError> {
        match method {
            METHOD_INITIALIZE => Ok(serde_json::to_value(self.handle_initialize()).unwrap()),
            METHOD_TOOLS_LIST => Ok(serde_json::to_value(self.handle_tools_list()).unwrap()),
            METHOD_TOOLS_CALL => self
                .handle_tools_call(params)
                .await
                .map(|r| serde_json::to_value(r).unwrap()),
            METHOD_RESOURCES_LIST => Ok(serde_json::to_value(self.handle_resources_list().await).unwrap()),
            METHOD_RESOURCES_READ => self
                .handle_resources_read(params)
                .await
                .map(|r| serde_json::to_value(r).unwrap()),
            other => Err(JsonRpcError {
                code: METHOD_NOT_FOUND,
                message: format!("unknown method '{other}'"),
                data: None,
            }),
        }
    }

    fn handle_initialize(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: serde_json::json!({}),
                resources: serde_json::json!({}),
            },
            server_info: self.server_info.clone(),
        }
    }

    fn handle_tools_list(&self) -> ToolsListResult {
        ToolsListResult {
            tools: self.registry.descriptors(),
        }
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> Result<CallToolResult, JsonRpcError> {
        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| invalid_params(format!("malformed tools/call params: {e}")))?;

        let Some(tool) = self.registry.get(&params.name) else {
            let summary = summarize_arguments(&params.arguments);
            self.state.record_command(&params.name, summary, true).await;
            let err = BridgeError::ToolNotFound(params.name.clone());
            return Ok(CallToolResult::error_text(format!("{}: {err}", err.kind())));
        };

        validate_against_schema(&tool.input_schema(), &params.arguments)
            .map_err(|e| invalid_params(e.to_string()))?;

        let outcome = tool.call(&self.state, params.arguments.clone()).await;
        let summary = summarize_arguments(&params.arguments);
        let is_error = outcome.is_err();
        self.state.record_command(&params.name, summary, is_error).await;

        Ok(match outcome {
            Ok(result) => result,
            Err(e) => CallToolResult::error_text(format!("{}: {e}", e.kind())),
        })
    }

    async fn handle_resources_list(&self) -> ResourcesListResult {
        let history = self.state.history_snapshot().await;
        ResourcesListResult {
            resources: history
                .iter()
                .map(|r| ResourceDescriptorWire {
                    uri: format!("history://{}", r.seq),
                    name: format!("{} #{}", r.tool, r.seq),
                    mime_type: "text/plain".to_string(),
                })
                .collect(),
        }
    }

    async fn handle_resources_read(&self, params: Option<Value>) -> Result<ReadResourceResult, JsonRpcError> {
        let params: ReadResourceParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| invalid_params(format!("malformed resources/read params: {e}")))?;

        let seq: u64 = params
            .uri
            .strip_prefix("history://")
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| invalid_params(format!("unrecognized resource uri '{}'", params.uri)))?;

        let history = self.state.history_snapshot().await;
        let record = history
            .iter()
            .find(|r| r.seq == seq)
            .ok_or_else(|| invalid_params(format!("no history entry for '{}'", params.uri)))?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContent {
                uri: params.uri.clone(),
                mime_type: "text/plain".to_string(),
                text: format!(
                    "{} ({})\n{}",
                    record.tool,
                    if record.is_error { "error" } else { "ok" },
                    record.summary
                ),
            }],
        })
    }
}

fn invalid_params(message: impl Into<String>) -> JsonRpcError {
    JsonRpcError {
        code: INVALID_PARAMS,
        message: message.into(),
        data: None,
    }
}

fn summarize_arguments(arguments: &Value) -> String {
    let rendered = arguments.to_string();
    if rendered.len() > 200 {
        format!("{}...", &rendered[..200])
    } else {
        rendered
    }
}

/// Check that every field named in `schema.required` is present in `args`.
/// This bridge's schemas never nest `required` beyond the top level, so a
/// single presence pass is sufficient (spec.md §6).
fn validate_against_schema(schema: &Value, args: &Value) -> Result<(), BridgeError> {
    let Some(required) = schema.get("required").and_then(Value::as_array) else {
        return Ok(());
    };
    for field in required {
        let Some(field_name) = field.as_str() else {
            continue;
        };
        if args.get(field_name).is_none() {
            return Err(BridgeError::Schema(format!(
                "missing required argument '{field_name}'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_against_schema_catches_missing_field() {
        let schema = serde_json::json!({"required": ["code"]});
        let args = serde_json::json!({});
        assert!(validate_against_schema(&schema, &args).is_err());
    }

    #[test]
    fn validate_against_schema_passes_when_present() {
        let schema = serde_json::json!({"required": ["code"]});
        let args = serde_json::json!({"code": "(+ 1 1)"});
        assert!(validate_against_schema(&schema, &args).is_ok());
    }

    #[test]
    fn summarize_arguments_truncates_long_payloads() {
        let args = serde_json::json!({"code": "x".repeat(500)});
        let summary = summarize_arguments(&args);
        assert!(summary.len() <= 203);
    }
}
