//! The two adapters that carry TP requests to the [`crate::mcp::dispatcher::Dispatcher`]:
//! newline-delimited JSON over stdio (the default, for direct-spawn tool
//! hosts) and a small Axum HTTP server (for hosts that prefer to reach the
//! bridge over a socket).

pub mod http;
pub mod stdio;
