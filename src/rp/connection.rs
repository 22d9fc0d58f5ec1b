//! The owned TCP connection to an RP backend.

use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;

use crate::error::{BridgeError, Result};
use crate::rp::codec::PushbackReader;

/// An established connection to an RP backend.
///
/// Owns the split halves of the socket: a pushback-wrapped reader for
/// framed decoding, and a plain writer for framed encoding. Dropping a
/// `Connection` closes the socket.
pub struct Connection {
    pub(crate) reader: PushbackReader<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    pub(crate) writer: OwnedWriteHalf,
    /// The host this connection was made to.
    pub host: String,
    /// The port this connection was made to.
    pub port: u16,
    /// When this connection was established.
    pub connected_at: std::time::Instant,
}

impl Connection {
    /// Open a TCP connection to `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| BridgeError::TransportClosed(format!("connect to {host}:{port}: {e}")))?;
        stream
            .set_nodelay(true)
            .map_err(|e| BridgeError::TransportClosed(e.to_string()))?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: PushbackReader::new(BufReader::new(read_half)),
            writer: write_half,
            host: host.to_string(),
            port,
            connected_at: std::time::Instant::now(),
        })
    }

    /// How long this connection has been open.
    pub fn age(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}
