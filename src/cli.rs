//! Command-line interface definition for the bridge.

use std::path::PathBuf;

use clap::Parser;

/// REPL Protocol Bridge -- translates between a JSON-RPC tool protocol and
/// a length-prefixed REPL protocol spoken by a backend over TCP.
#[derive(Parser, Debug, Clone)]
#[command(name = "replbridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Workspace directory to poll for the discovery sentinel file.
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,

    /// Backend port; if set, discovery is skipped.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Port to serve the HTTP transport on; omit to serve over stdio.
    #[arg(long)]
    pub http_port: Option<u16>,

    /// Enable debug-level logging.
    #[arg(long)]
    pub debug: bool,
}
