//! REPL Protocol (RP) support: the framed codec, the single-flight client
//! that owns a backend connection, multi-message merge, and discovery.
//!
//! # Module Layout
//!
//! - `codec`       -- the length-prefixed dictionary wire encoding
//! - `message`     -- `RpValue`, `RpMessage`, and the merge rule (spec.md §3)
//! - `connection`  -- the owned TCP connection
//! - `client`      -- the single-flight send/connect/close client
//! - `discovery`   -- sentinel-file port discovery

pub mod client;
pub mod codec;
pub mod connection;
pub mod discovery;
pub mod message;

pub use client::RpClient;
pub use message::{MergedReply, RpMessage, RpValue};
