//! Error types for the bridge
//!
//! Defines the error taxonomy from spec.md §7, using `thiserror` for
//! ergonomic error handling. `BridgeError::kind()` returns the taxonomy tag
//! that gets surfaced in TP error text payloads.

use thiserror::Error;

/// Error taxonomy for bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Malformed TP envelope or tool arguments.
    #[error("schema error: {0}")]
    Schema(String),

    /// TP method or tool name not registered.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Tool requires a live connection and none exists.
    #[error("not connected to a backend")]
    NotConnected,

    /// Discovery sentinel file missing after the configured deadline.
    #[error("discovery timed out waiting for {path}")]
    DiscoveryTimeout {
        /// The sentinel file path that was polled.
        path: String,
    },

    /// Discovery sentinel file could not be parsed as a port number.
    #[error("discovery sentinel at {path} could not be parsed: {reason}")]
    DiscoveryParse {
        /// The sentinel file path.
        path: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The inner RP stream failed or was closed mid-exchange.
    #[error("transport closed: {0}")]
    TransportClosed(String),

    /// Framed-encoding decode failure.
    #[error("codec error: {0}")]
    Codec(String),

    /// Backend did not emit a terminal status within the deadline.
    #[error("eval timed out after {0:?}")]
    EvalTimeout(std::time::Duration),

    /// Backend reported an evaluation exception.
    #[error("eval error: {ex}")]
    EvalError {
        /// The exception class/message the backend reported.
        ex: String,
        /// The root cause exception, if the backend distinguished one.
        root_ex: Option<String>,
    },

    /// Failure reading a local file for the `load-file` tool.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal invariant violation; never expected in normal operation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// The taxonomy tag used in TP error text payloads (spec.md §7).
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::Schema(_) => "schema",
            BridgeError::ToolNotFound(_) => "tool-not-found",
            BridgeError::NotConnected => "not-connected",
            BridgeError::DiscoveryTimeout { .. } => "discovery-timeout",
            BridgeError::DiscoveryParse { .. } => "discovery-parse",
            BridgeError::TransportClosed(_) => "transport-closed",
            BridgeError::Codec(_) => "codec",
            BridgeError::EvalTimeout(_) => "eval-timeout",
            BridgeError::EvalError { .. } => "eval-error",
            BridgeError::Io(_) => "io",
            BridgeError::Serialization(_) => "schema",
            BridgeError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_connected_kind() {
        let e = BridgeError::NotConnected;
        assert_eq!(e.kind(), "not-connected");
        assert_eq!(e.to_string(), "not connected to a backend");
    }

    #[test]
    fn eval_error_display_contains_ex() {
        let e = BridgeError::EvalError {
            ex: "java.lang.ArithmeticException: Divide by zero".to_string(),
            root_ex: None,
        };
        assert!(e.to_string().contains("Divide by zero"));
        assert_eq!(e.kind(), "eval-error");
    }

    #[test]
    fn discovery_timeout_kind() {
        let e = BridgeError::DiscoveryTimeout {
            path: "/tmp/ws/.nrepl-port".to_string(),
        };
        assert_eq!(e.kind(), "discovery-timeout");
    }

    #[test]
    fn io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: BridgeError = io_error.into();
        assert!(matches!(error, BridgeError::Io(_)));
        assert_eq!(error.kind(), "io");
    }

    #[test]
    fn json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad json}").unwrap_err();
        let error: BridgeError = json_err.into();
        assert!(matches!(error, BridgeError::Serialization(_)));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BridgeError>();
    }
}
