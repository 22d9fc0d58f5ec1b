//! Sentinel-file backend discovery.
//!
//! Many RP backends announce their listening port by writing a small file
//! (e.g. `.nrepl-port`) into the workspace directory once they're ready to
//! accept connections. Discovery polls for that file until it appears and
//! parses cleanly, or until a deadline passes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// Default sentinel file name, relative to the workspace root.
pub const DEFAULT_SENTINEL_NAME: &str = ".nrepl-port";

/// Poll interval between sentinel-file reads.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll `workspace/sentinel_name` until it contains a valid port number or
/// `deadline` elapses.
///
/// A missing file is not itself an error -- it's the expected state before
/// the backend starts. A file that exists but fails to parse as a port
/// number is a hard [`BridgeError::DiscoveryParse`] immediately, since a
/// well-behaved backend never writes a partial sentinel file (rename-into-
/// place is the usual convention).
pub async fn discover(workspace: &Path, sentinel_name: &str, deadline: Duration) -> Result<u16> {
    let path = workspace.join(sentinel_name);
    let started = tokio::time::Instant::now();
    loop {
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => return parse_port(&path, &contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if started.elapsed() >= deadline {
                    return Err(BridgeError::DiscoveryTimeout {
                        path: path.display().to_string(),
                    });
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            Err(e) => {
                return Err(BridgeError::DiscoveryParse {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

fn parse_port(path: &Path, contents: &str) -> Result<u16> {
    contents
        .trim()
        .parse::<u16>()
        .map_err(|e| BridgeError::DiscoveryParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

/// Resolve the sentinel path discovery would poll, without reading it.
pub fn sentinel_path(workspace: &Path, sentinel_name: &str) -> PathBuf {
    workspace.join(sentinel_name)
}
