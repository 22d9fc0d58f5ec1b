//! End-to-end bridge scenarios against the `fake_repl_backend` subprocess.
//!
//! Each test spawns a fresh backend in its own temp workspace, drives the
//! `Dispatcher` the way a TP transport would, and tears the backend down at
//! the end. The backend binary is located via the Cargo-injected
//! `CARGO_BIN_EXE_fake_repl_backend` environment variable, the same pattern
//! the `mcp_stdio_test` integration tests use for `mcp_test_server`.

use std::path::PathBuf;
use std::process::{Child, Command};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::TempDir;

use replbridge::mcp::dispatcher::Dispatcher;
use replbridge::mcp::types::{JsonRpcRequest, JsonRpcResponse};
use replbridge::rp::discovery;
use replbridge::rp::RpClient;
use replbridge::state::StateCore;
use replbridge::tools::build_registry;

fn backend_exe() -> PathBuf {
    if let Ok(p) = std::env::var("CARGO_BIN_EXE_fake_repl_backend") {
        return PathBuf::from(p);
    }
    if let Ok(manifest) = std::env::var("CARGO_MANIFEST_DIR") {
        let debug = PathBuf::from(manifest).join("target").join("debug").join("fake_repl_backend");
        if debug.exists() {
            return debug;
        }
    }
    PathBuf::from("fake_repl_backend")
}

struct Backend {
    child: Child,
    workspace: TempDir,
}

impl Drop for Backend {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

async fn spawn_backend() -> Backend {
    let workspace = tempfile::tempdir().expect("tempdir");
    let child = Command::new(backend_exe())
        .arg(workspace.path())
        .spawn()
        .expect("failed to spawn fake_repl_backend -- was it built with `cargo build`?");
    Backend { child, workspace }
}

async fn dispatcher_against(backend: &Backend) -> Dispatcher {
    let rp = Arc::new(RpClient::new(Duration::from_secs(5)));
    let state = StateCore::new(rp.clone(), 10, backend.workspace.path().to_path_buf(), Duration::from_secs(5));

    let port = discovery::discover(backend.workspace.path(), discovery::DEFAULT_SENTINEL_NAME, Duration::from_secs(5))
        .await
        .expect("sentinel never appeared");
    rp.connect("127.0.0.1", port).await.expect("connect");
    state.set_peer("127.0.0.1".to_string(), port).await;

    let clone_reply = rp.send("clone", &[]).await.expect("clone");
    let session = clone_reply.last_field("new-session").expect("new-session field");
    state.register_session(session).await;

    Dispatcher::new(build_registry(), state)
}

fn call_tool(name: &str, arguments: Value) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        id: Some(json!(1)),
        method: "tools/call".to_string(),
        params: Some(json!({"name": name, "arguments": arguments})),
    }
}

fn result_text(response: &JsonRpcResponse) -> String {
    response
        .result
        .as_ref()
        .and_then(|r| r.get("content"))
        .and_then(Value::as_array)
        .and_then(|blocks| blocks.first())
        .and_then(|b| b.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn trivial_arithmetic_evaluates_and_returns_value() {
    let backend = spawn_backend().await;
    let dispatcher = dispatcher_against(&backend).await;

    let response = dispatcher
        .handle(call_tool("eval", json!({"code": "(+ 1 2 3)"})))
        .await
        .unwrap();

    assert_eq!(result_text(&response), "6");
    assert!(response.result.unwrap().get("isError").is_none());
}

#[tokio::test]
async fn streaming_output_is_concatenated_in_arrival_order() {
    let backend = spawn_backend().await;
    let dispatcher = dispatcher_against(&backend).await;

    let response = dispatcher
        .handle(call_tool("eval", json!({"code": "(do (println \"a\") (println \"b\"))"})))
        .await
        .unwrap();

    let text = result_text(&response);
    assert!(text.starts_with("a\nb\n"));
    assert!(text.ends_with(":ok"));
}

#[tokio::test]
async fn error_surfaces_as_tool_level_failure_not_rpc_error() {
    let backend = spawn_backend().await;
    let dispatcher = dispatcher_against(&backend).await;

    let response = dispatcher.handle(call_tool("eval", json!({"code": "(/ 1 0)"}))).await.unwrap();

    assert!(response.error.is_none(), "a backend exception must not become a JSON-RPC error");
    let result = response.result.unwrap();
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"].as_str().unwrap().contains("ArithmeticException"));
}

#[tokio::test]
async fn sessions_isolate_bindings() {
    let backend = spawn_backend().await;
    let dispatcher = dispatcher_against(&backend).await;

    let new_session_reply = dispatcher.handle(call_tool("new-session", json!({}))).await.unwrap();
    let other_session = new_session_reply.result.unwrap()["session"].as_str().unwrap().to_string();

    dispatcher.handle(call_tool("eval", json!({"code": "(def x 1)"}))).await.unwrap();
    dispatcher
        .handle(call_tool("eval", json!({"code": "(def x 2)", "session": other_session})))
        .await
        .unwrap();

    let default_read = dispatcher.handle(call_tool("eval", json!({"code": "x"}))).await.unwrap();
    let other_read = dispatcher
        .handle(call_tool("eval", json!({"code": "x", "session": other_session})))
        .await
        .unwrap();

    assert_eq!(result_text(&default_read), "1");
    assert_eq!(result_text(&other_read), "2");
}

#[tokio::test]
async fn unknown_tool_name_is_a_tool_level_error_not_a_json_rpc_error() {
    let backend = spawn_backend().await;
    let dispatcher = dispatcher_against(&backend).await;

    let response = dispatcher.handle(call_tool("no-such-tool", json!({}))).await.unwrap();

    assert!(response.error.is_none(), "unknown tool name must not become a JSON-RPC error");
    let result = response.result.unwrap();
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"].as_str().unwrap().contains("tool-not-found"));
}

#[tokio::test]
async fn reconnect_after_backend_drop_via_connect_tool() {
    let backend = spawn_backend().await;
    let dispatcher = dispatcher_against(&backend).await;

    dispatcher.handle(call_tool("eval", json!({"code": "(+ 1 1)"}))).await.unwrap();

    let second_backend = spawn_backend().await;
    let port = discovery::discover(
        second_backend.workspace.path(),
        discovery::DEFAULT_SENTINEL_NAME,
        Duration::from_secs(5),
    )
    .await
    .expect("second sentinel never appeared");

    let response = dispatcher
        .handle(call_tool("connect", json!({"host": "127.0.0.1", "port": port})))
        .await
        .unwrap();
    assert!(response.result.unwrap().get("isError").is_none());

    let eval_response = dispatcher.handle(call_tool("eval", json!({"code": "(+ 1 1)"}))).await.unwrap();
    assert_eq!(result_text(&eval_response), "2");
}
