//! Tool Protocol (TP) wire types: JSON-RPC 2.0 primitives plus the MCP-style
//! lifecycle, tool, and resource payloads this bridge serves.
//!
//! All types derive `Debug`, `Clone`, `Serialize`, `Deserialize` unless noted.
//! Struct fields are `camelCase` on the wire via `#[serde(rename_all = "camelCase")]`
//! unless already camelCase. `Option<>` fields omit their key when `None`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The protocol revision this bridge advertises during `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// `initialize` -- opens a session and negotiates capabilities.
pub const METHOD_INITIALIZE: &str = "initialize";
/// `tools/list` -- returns the fixed tool catalog.
pub const METHOD_TOOLS_LIST: &str = "tools/list";
/// `tools/call` -- invokes a named tool.
pub const METHOD_TOOLS_CALL: &str = "tools/call";
/// `resources/list` -- lists readable resources (the recent-command buffer).
pub const METHOD_RESOURCES_LIST: &str = "resources/list";
/// `resources/read` -- reads a resource by URI.
pub const METHOD_RESOURCES_READ: &str = "resources/read";

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 wire types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request or notification.
///
/// `id` is `None` for notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Correlation id; absent for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// The method name to invoke.
    pub method: String,
    /// Optional method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// A JSON-RPC 2.0 response. Exactly one of `result`/`error` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Echoes the request's `id`; `null` when the request was unparseable.
    pub id: serde_json::Value,
    /// Successful result value; mutually exclusive with `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error object; mutually exclusive with `result`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Build a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Build an error response.
    pub fn failure(id: serde_json::Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code, standard JSON-RPC ranges where applicable.
    pub code: i64,
    /// Human-readable error description.
    pub message: String,
    /// Optional structured error context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// JSON-RPC `-32700 Parse error`.
pub const PARSE_ERROR: i64 = -32700;
/// JSON-RPC `-32601 Method not found`.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC `-32602 Invalid params`.
pub const INVALID_PARAMS: i64 = -32602;
/// JSON-RPC `-32603 Internal error`.
pub const INTERNAL_ERROR: i64 = -32603;

// ---------------------------------------------------------------------------
// Lifecycle types
// ---------------------------------------------------------------------------

/// Identifies this bridge by name and version in the `initialize` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Implementation {
    /// Short name of the implementation.
    pub name: String,
    /// Semantic version string.
    pub version: String,
}

/// Capabilities this bridge advertises. Only the surfaces it actually
/// serves are present; the caller-facing catalog is closed (spec.md §4.5's
/// "dispatcher extensibility" note).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    /// Server exposes tools via `tools/list` and `tools/call`.
    pub tools: serde_json::Value,
    /// Server exposes resources (the recent-command buffer) read-only.
    pub resources: serde_json::Value,
}

/// Result of a successful `initialize` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// The protocol version this bridge negotiated.
    pub protocol_version: String,
    /// The capabilities advertised for this session.
    pub capabilities: ServerCapabilities,
    /// Identity of this implementation.
    pub server_info: Implementation,
}

// ---------------------------------------------------------------------------
// Tool catalog types
// ---------------------------------------------------------------------------

/// Wire representation of a single tool entry in `tools/list`'s result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptorWire {
    /// The tool's unique name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema for the tool's `arguments` object.
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Result of `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsListResult {
    /// The fixed tool catalog.
    pub tools: Vec<ToolDescriptorWire>,
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolParams {
    /// The tool name to invoke.
    pub name: String,
    /// Tool-specific arguments object.
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// A single content block in a tool result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// A plain-text content block.
    Text {
        /// The text payload.
        text: String,
    },
}

impl ContentBlock {
    /// Build a text content block.
    pub fn text(s: impl Into<String>) -> Self {
        ContentBlock::Text { text: s.into() }
    }
}

/// Result of `tools/call`, per spec.md §6's tool result envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Ordered content blocks.
    pub content: Vec<ContentBlock>,
    /// `true` when the tool handler failed; the error kind and cause are
    /// carried as text in `content`.
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    /// Present for eval-like results: the session the code ran in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    /// Present for eval-like results: the namespace active after evaluation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl CallToolResult {
    /// Build a successful, single-text-block result.
    pub fn ok_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: false,
            session: None,
            namespace: None,
        }
    }

    /// Build a failed, single-text-block result.
    pub fn error_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: true,
            session: None,
            namespace: None,
        }
    }

    /// Attach the session/namespace fields that accompany eval-like results.
    pub fn with_eval_meta(mut self, session: Option<String>, namespace: Option<String>) -> Self {
        self.session = session;
        self.namespace = namespace;
        self
    }
}

// ---------------------------------------------------------------------------
// Resource types (read-only view onto the recent-command buffer)
// ---------------------------------------------------------------------------

/// Wire representation of a single resource entry in `resources/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDescriptorWire {
    /// A stable URI identifying this resource.
    pub uri: String,
    /// Human-readable name.
    pub name: String,
    /// MIME type of the resource body.
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// Result of `resources/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesListResult {
    /// Resources currently available.
    pub resources: Vec<ResourceDescriptorWire>,
}

/// Parameters for `resources/read`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadResourceParams {
    /// The resource URI to read.
    pub uri: String,
}

/// A single resource content entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceContent {
    /// The resource URI this content belongs to.
    pub uri: String,
    /// MIME type of `text`.
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// The resource body, rendered as text.
    pub text: String,
}

/// Result of `resources/read`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadResourceResult {
    /// The content entries for the requested resource.
    pub contents: Vec<ResourceContent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_rpc_error_display() {
        let e = JsonRpcError {
            code: -32600,
            message: "Invalid Request".to_string(),
            data: None,
        };
        assert_eq!(e.to_string(), "JSON-RPC error -32600: Invalid Request");
    }

    #[test]
    fn call_tool_result_ok_has_no_error_flag_serialized() {
        let r = CallToolResult::ok_text("hello");
        let v = serde_json::to_value(&r).unwrap();
        assert!(v.get("isError").is_none());
    }

    #[test]
    fn call_tool_result_error_serializes_flag() {
        let r = CallToolResult::error_text("boom");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["isError"], true);
    }

    #[test]
    fn response_success_omits_error() {
        let r = JsonRpcResponse::success(serde_json::json!(1), serde_json::json!({"ok": true}));
        let v = serde_json::to_value(&r).unwrap();
        assert!(v.get("error").is_none());
    }
}
