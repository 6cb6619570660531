//! Backend endpoint model and connection URL normalization.
//!
//! Converts user- or config-supplied backend addresses into WebSocket
//! connection URLs and compact display labels. All normalization is
//! total: input that cannot be understood is passed through verbatim so
//! it stays visible to the user instead of being silently dropped.

pub mod normalize;
pub mod types;

pub use normalize::{to_connection_url, to_display_label};
pub use types::{Endpoint, Origin};
