//! WebSocket transport and live connection retargeting.
//!
//! The transport owns the single persistent bridge connection; the
//! [`RetargetController`] moves it to a newly selected backend without
//! an application reload. Bootstrap must have populated the registry
//! before the transport's initial [`Transport::connect`] call; that
//! ordering is a hard requirement owned by the embedding app.

pub mod controller;
pub mod transport;
pub mod ws;

pub use controller::{RetargetController, RetargetPolicy, RetargetState, Selection};
pub use transport::{Transport, TransportError};
pub use ws::{TransportEvent, WsTransport};
