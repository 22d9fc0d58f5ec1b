//! The stdio transport: one JSON-RPC message per line on stdin, one per
//! line on stdout. All diagnostic output goes to stderr so stdout stays a
//! clean message stream for the caller.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, warn};

use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::types::{JsonRpcError, JsonRpcResponse, PARSE_ERROR};

/// Run the stdio loop until stdin closes.
pub async fn run(dispatcher: Arc<Dispatcher>) {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "stdio transport: read error");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str(&line) {
            Ok(request) => dispatcher.handle(request).await,
            Err(e) => {
                warn!(error = %e, "stdio transport: malformed request line");
                Some(JsonRpcResponse::failure(
                    serde_json::Value::Null,
                    JsonRpcError {
                        code: PARSE_ERROR,
                        message: format!("parse error: {e}"),
                        data: None,
                    },
                ))
            }
        };

        let Some(response) = response else {
            continue;
        };

        match serde_json::to_string(&response) {
            Ok(mut rendered) => {
                rendered.push('\n');
                if let Err(e) = stdout.write_all(rendered.as_bytes()).await {
                    error!(error = %e, "stdio transport: write error");
                    break;
                }
                if let Err(e) = stdout.flush().await {
                    error!(error = %e, "stdio transport: flush error");
                    break;
                }
            }
            Err(e) => error!(error = %e, "stdio transport: failed to serialize response"),
        }
    }
}
