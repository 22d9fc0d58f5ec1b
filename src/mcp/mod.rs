//! Tool Protocol (TP) support: JSON-RPC 2.0 server-side wire types and the
//! dispatcher that routes `tools/call` and friends to the tool registry.
//!
//! # Module Layout
//!
//! - `types`      -- JSON-RPC 2.0 primitives plus the lifecycle/tool/resource payloads
//! - `dispatcher` -- Request routing, tool catalog projection, error taxonomy projection

pub mod dispatcher;
pub mod types;

pub use types::*;
