//! Live connection retargeting.
//!
//! Reacts to a user picking a backend from the registry: records the
//! new selection first, then moves the transport, so persisted state
//! and concurrent reads reflect the new target before any socket work
//! happens.

use std::sync::Arc;

use tracing::{debug, info};

use bridgelink_registry::BackendRegistry;

use crate::transport::{Transport, TransportError};

/// Controller state. `Retargeting` only spans the handoff to the
/// transport; re-selecting immediately afterwards is legal and simply
/// repeats the sequence with the latest URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetargetState {
    Idle,
    Retargeting,
}

/// When the controller reports Idle again after a retarget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetargetPolicy {
    /// As soon as the transport has been told to move; the connection
    /// attempt proceeds in the background.
    Optimistic,
    /// Only after the transport reports the new handshake completed.
    AwaitHandshake,
}

/// Outcome of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The transport was moved to this URL.
    Retargeted { url: String },
    /// The selection already was the active target; nothing was done.
    AlreadyCurrent,
    /// The URL matches no known endpoint; nothing was done. New
    /// endpoints are introduced through the registry first.
    UnknownEndpoint,
}

/// Moves the live connection between known backends.
///
/// The transport's connection is exclusively owned by this controller;
/// no other component requests reconnects. Closing the previous
/// connection is the transport's job, implied by the retarget.
pub struct RetargetController<T: Transport> {
    registry: Arc<BackendRegistry>,
    transport: T,
    policy: RetargetPolicy,
    state: RetargetState,
}

impl<T: Transport> RetargetController<T> {
    pub fn new(registry: Arc<BackendRegistry>, transport: T, policy: RetargetPolicy) -> Self {
        Self {
            registry,
            transport,
            policy,
            state: RetargetState::Idle,
        }
    }

    pub fn state(&self) -> RetargetState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handles a user selecting the endpoint with the given connection
    /// URL. Selecting the already-current endpoint or an unknown URL is
    /// a silent no-op.
    pub async fn select(&mut self, url: &str) -> Result<Selection, TransportError> {
        if self.registry.current().as_deref() == Some(url) {
            debug!(url, "selection already current");
            return Ok(Selection::AlreadyCurrent);
        }
        let Some(endpoint) = self.registry.find(url) else {
            debug!(url, "ignoring selection of unknown endpoint");
            return Ok(Selection::UnknownEndpoint);
        };

        // Registry first: reads made while the socket moves already see
        // the new target.
        self.registry.set_current(endpoint.url());

        self.state = RetargetState::Retargeting;
        let moved = self.transport.update_url(endpoint.url()).await;
        let settled = match (moved, self.policy) {
            (Ok(()), RetargetPolicy::AwaitHandshake) => self.transport.wait_connected().await,
            (outcome, _) => outcome,
        };
        self.state = RetargetState::Idle;
        settled?;

        info!(url = %endpoint.url(), "retargeted connection");
        Ok(Selection::Retargeted {
            url: endpoint.url().to_string(),
        })
    }
}
