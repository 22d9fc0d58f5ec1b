//! Configuration for the bridge.
//!
//! Config is resolved from environment variables with CLI overrides taking
//! priority (`BridgeConfig::resolve`), rather than a config file -- this
//! process has no long-lived settings worth persisting to disk.

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Workspace directory to poll for the discovery sentinel file.
    pub workspace: PathBuf,
    /// Backend port, if already known (skips discovery).
    pub port: Option<u16>,
    /// HTTP port to bind; `None` means serve over stdio instead.
    pub http_port: Option<u16>,
    /// Deadline for sentinel-file discovery.
    pub discovery_deadline: Duration,
    /// Per-op timeout before an `eval`-family send gives up.
    pub eval_timeout: Duration,
    /// Interval between heartbeat probes.
    pub heartbeat_interval: Duration,
    /// Timeout for a single heartbeat probe.
    pub heartbeat_probe_timeout: Duration,
    /// Capacity of the recent-command ring buffer.
    pub history_cap: usize,
    /// Verbose (debug-level) logging.
    pub debug: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("."),
            port: None,
            http_port: None,
            discovery_deadline: Duration::from_secs(30),
            eval_timeout: Duration::from_secs(30),
            heartbeat_interval: Duration::from_secs(45),
            heartbeat_probe_timeout: Duration::from_secs(5),
            history_cap: 10,
            debug: false,
        }
    }
}

impl BridgeConfig {
    /// Resolve config from environment variables, then apply CLI overrides.
    ///
    /// Env vars: `WORKSPACE`, `PORT`, `HTTP_PORT`, `DEBUG`.
    pub fn resolve(cli: &Cli) -> Self {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }
        if let Ok(port) = std::env::var("PORT") {
            config.port = port.parse().ok();
        }
        if let Ok(http_port) = std::env::var("HTTP_PORT") {
            config.http_port = http_port.parse().ok();
        }
        if std::env::var("DEBUG").map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false) {
            config.debug = true;
        }

        if let Some(workspace) = &cli.workspace {
            config.workspace = workspace.clone();
        }
        if let Some(port) = cli.port {
            config.port = Some(port);
        }
        if let Some(http_port) = cli.http_port {
            config.http_port = Some(http_port);
        }
        if cli.debug {
            config.debug = true;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_stdio_transport() {
        let config = BridgeConfig::default();
        assert!(config.http_port.is_none());
    }

    #[test]
    fn cli_overrides_take_priority_over_defaults() {
        let cli = Cli {
            workspace: Some(PathBuf::from("/tmp/ws")),
            port: Some(7777),
            http_port: Some(8080),
            debug: true,
        };
        let config = BridgeConfig::resolve(&cli);
        assert_eq!(config.workspace, PathBuf::from("/tmp/ws"));
        assert_eq!(config.port, Some(7777));
        assert_eq!(config.http_port, Some(8080));
        assert!(config.debug);
    }
}
