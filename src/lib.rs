//! A bridge between a JSON-RPC tool protocol (TP) and a length-prefixed
//! dictionary-encoded REPL protocol (RP) spoken by a backend over TCP.
//!
//! # Architecture
//!
//! - `mcp`: TP wire types and the dispatcher that routes requests to tools
//! - `rp`: the RP codec, single-flight client, message merge, and discovery
//! - `tools`: the fixed tool catalog bridging TP calls onto RP ops
//! - `transport`: the stdio and HTTP adapters that carry TP traffic
//! - `state`: shared session/history state read and written by tools
//! - `heartbeat`: background connection-health monitoring
//! - `config`: environment/CLI configuration resolution
//! - `error`: the bridge's error taxonomy
//! - `cli`: command-line interface definition

pub mod cli;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod mcp;
pub mod rp;
pub mod state;
pub mod tools;
pub mod transport;

pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use state::StateCore;
