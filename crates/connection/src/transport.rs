//! The transport collaborator seam.
//!
//! The controller only ever asks the transport to connect or to move to
//! a different URL; everything else about the connection (wire
//! protocol, teardown of the previous socket, keepalive) is the
//! transport's own business.

/// Errors surfaced by transport requests.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport's background task is gone.
    #[error("transport is closed")]
    Closed,
}

/// Capabilities the retarget controller needs from a live connection.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Establishes the initial connection. Idempotent; called once at
    /// startup after bootstrap has resolved the target.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Retargets the live connection to `url`, tearing down any
    /// existing connection. Returns once the new attempt has started,
    /// not when the handshake completes.
    async fn update_url(&self, url: &str) -> Result<(), TransportError>;

    /// Waits until the current connection attempt has completed its
    /// handshake. Transports without that notion report readiness
    /// immediately.
    async fn wait_connected(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
