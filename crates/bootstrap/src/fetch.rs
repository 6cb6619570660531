//! Retrieval of the optional backend configuration document.
//!
//! The document is a small JSON file served next to the client:
//! `{ "backends": [ { "url": "...", "secure": true }, ... ] }`.
//! A not-found response is a normal outcome meaning "no additional
//! backends"; every other failure is reported so the resolver can fall
//! through the chain.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use bridgelink_endpoint::to_connection_url;

/// Errors from the configuration fetch. None of these are fatal to
/// startup; the resolver logs them and falls through.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("config endpoint returned status {0}")]
    Status(StatusCode),

    #[error("config fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// One backend entry in the fetched document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteBackend {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
}

impl RemoteBackend {
    /// The raw registry input for this entry.
    ///
    /// An explicit `secure` flag is baked into a qualified URL so it
    /// survives registry normalization; without one the entry passes
    /// through untouched and the registry default applies.
    pub fn raw_input(&self) -> String {
        match self.secure {
            Some(secure) => to_connection_url(&self.url, secure),
            None => self.url.clone(),
        }
    }
}

/// The fetched document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendDocument {
    #[serde(default)]
    pub backends: Vec<RemoteBackend>,
}

/// Fetches the backend document, bounded by `timeout`.
///
/// A hung fetch must not block startup indefinitely, so the whole
/// request is wrapped in a timeout and a timeout is just another
/// fall-through outcome. One attempt per session, no retry.
pub async fn fetch_backends(
    config_url: &str,
    timeout: Duration,
) -> Result<Vec<RemoteBackend>, FetchError> {
    let request = async {
        let resp = reqwest::get(config_url).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            // Absent document: no additional backends.
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }
        let doc: BackendDocument = resp.json().await?;
        Ok(doc.backends)
    };

    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_parses_with_and_without_secure() {
        let doc: BackendDocument = serde_json::from_str(
            r#"{"backends":[{"url":"h1"},{"url":"h2","secure":true}]}"#,
        )
        .unwrap();
        assert_eq!(doc.backends.len(), 2);
        assert_eq!(doc.backends[0].secure, None);
        assert_eq!(doc.backends[1].secure, Some(true));
    }

    #[test]
    fn empty_document_parses() {
        let doc: BackendDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.backends.is_empty());
    }

    #[test]
    fn raw_input_bakes_explicit_secure_flag() {
        let backend = RemoteBackend {
            url: "h2".into(),
            secure: Some(true),
        };
        assert_eq!(backend.raw_input(), "wss://h2/api");

        let backend = RemoteBackend {
            url: "h1".into(),
            secure: None,
        };
        assert_eq!(backend.raw_input(), "h1");
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        // Port 1 on loopback: connection refused, surfaces as Http.
        let result = fetch_backends("http://127.0.0.1:1/backends.json", Duration::from_secs(5)).await;
        assert!(matches!(result, Err(FetchError::Http(_))));
    }
}
