//! Endpoint and origin types.

use serde::{Deserialize, Serialize};

use crate::normalize::{to_connection_url, to_display_label};

/// A validated backend connection target.
///
/// Immutable once constructed; a changed input produces a new
/// `Endpoint` via [`Endpoint::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    raw_input: String,
    url: String,
    display_label: String,
    secure: bool,
}

impl Endpoint {
    /// Builds an endpoint from a raw address.
    ///
    /// When the input carries an explicit `ws`/`wss` (or `http`/`https`)
    /// scheme, the security flag is derived from it; otherwise
    /// `default_secure` applies.
    pub fn new(raw_input: impl Into<String>, default_secure: bool) -> Self {
        let raw_input = raw_input.into();
        let secure = explicit_security(&raw_input).unwrap_or(default_secure);
        let url = to_connection_url(&raw_input, secure);
        let display_label = to_display_label(&url);
        Self {
            raw_input,
            url,
            display_label,
            secure,
        }
    }

    /// The address as entered or fetched.
    pub fn raw_input(&self) -> &str {
        &self.raw_input
    }

    /// The normalized connection URL the transport dials.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Shortened `host[:port]` form for rendering.
    pub fn display_label(&self) -> &str {
        &self.display_label
    }

    /// Whether the encrypted protocol variant is used.
    pub fn secure(&self) -> bool {
        self.secure
    }
}

/// The client's own origin: the host it was served from and whether
/// that page was delivered over an encrypted channel.
///
/// Supplied by the embedding app; the same-origin default endpoint and
/// the default security of scheme-less inputs derive from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub host: String,
    pub secure: bool,
}

impl Origin {
    pub fn new(host: impl Into<String>, secure: bool) -> Self {
        Self {
            host: host.into(),
            secure,
        }
    }

    /// The implicit backend endpoint derived from the origin itself.
    pub fn default_endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.secure)
    }
}

fn explicit_security(input: &str) -> Option<bool> {
    if input.starts_with("wss://") || input.starts_with("https://") {
        Some(true)
    } else if input.starts_with("ws://") || input.starts_with("http://") {
        Some(false)
    } else {
        None
    }
}
