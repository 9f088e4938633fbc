//! TCP transport client owning a single outbound connection

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Manages at most one outbound TCP session at a time.
///
/// All operations take `&mut self`; callers that need to share the client
/// across tasks serialize through a mutex (the connection monitor does this).
pub struct TcpClient {
    session: Option<TcpStream>,
}

impl TcpClient {
    /// Create a client with no active session.
    pub fn new() -> Self {
        Self { session: None }
    }

    /// Connect to `host:port`, bounded by `connect_timeout`.
    ///
    /// Any existing session is closed first, so a successful call always
    /// replaces the current session. On failure (refused, timed out,
    /// unreachable, DNS error) no session is left open.
    pub async fn connect(&mut self, host: &str, port: u16, connect_timeout: Duration) -> Result<()> {
        self.close().await;

        let stream = timeout(connect_timeout, TcpStream::connect((host, port)))
            .await
            .with_context(|| format!("connect to {host}:{port} timed out"))?
            .with_context(|| format!("connect to {host}:{port} failed"))?;

        debug!("session established with {host}:{port}");
        self.session = Some(stream);
        Ok(())
    }

    /// Write one newline-terminated message and flush immediately.
    ///
    /// On failure the session is left in place; deciding whether a failed
    /// write means the connection is dead belongs to the monitor, not here.
    pub async fn send(&mut self, message: &str) -> Result<()> {
        let stream = self.session.as_mut().context("no active session")?;
        stream.write_all(message.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.flush().await?;
        Ok(())
    }

    /// Best-effort local check of session health. Performs no network I/O,
    /// so it can report `true` after the peer has silently gone away; the
    /// monitor's heartbeat exists to catch exactly that case.
    pub fn is_connected(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.peer_addr().is_ok())
            .unwrap_or(false)
    }

    /// Close the current session if one exists. Idempotent; shutdown errors
    /// are swallowed.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.session.take() {
            let _ = stream.shutdown().await;
        }
    }
}

impl Default for TcpClient {
    fn default() -> Self {
        Self::new()
    }
}
