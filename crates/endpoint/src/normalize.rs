//! Connection URL normalization.
//!
//! A backend address may arrive as a bare host, a `host:port` pair, a
//! pasted `http(s)://` origin, or an already-qualified `ws(s)://` URL.
//! [`to_connection_url`] folds all of these into the WebSocket URL the
//! transport dials; [`to_display_label`] reduces a URL back to
//! `host[:port]` for compact rendering.

/// Path of the bridge WebSocket API, appended when the input has none.
pub const API_PATH: &str = "/api";

/// Builds a fully qualified WebSocket connection URL from a backend
/// address.
///
/// Idempotent: an already-qualified `ws://` or `wss://` URL is returned
/// unchanged. `http://`/`https://` inputs keep their host and path with
/// the scheme mapped to the WebSocket equivalent. Bare hosts get the
/// `secure` scheme and the bridge API path. Input that cannot be
/// understood (empty, embedded whitespace, an unrelated scheme) is
/// returned verbatim.
pub fn to_connection_url(host_or_url: &str, secure: bool) -> String {
    if host_or_url.is_empty() || host_or_url.contains(char::is_whitespace) {
        return host_or_url.to_string();
    }
    if host_or_url.starts_with("ws://") || host_or_url.starts_with("wss://") {
        return host_or_url.to_string();
    }
    if let Some(rest) = host_or_url.strip_prefix("http://") {
        return with_api_path("ws", rest);
    }
    if let Some(rest) = host_or_url.strip_prefix("https://") {
        return with_api_path("wss", rest);
    }
    if host_or_url.contains("://") {
        // Unrelated scheme. Surfaces as-is in the endpoint list.
        return host_or_url.to_string();
    }
    with_api_path(if secure { "wss" } else { "ws" }, host_or_url)
}

/// Reduces a connection URL to `host[:port]` for display.
///
/// Strips the scheme and anything after the authority. Input without a
/// scheme is returned unchanged. Total: never fails.
pub fn to_display_label(url: &str) -> String {
    let Some((_, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.split_once('/') {
        Some((host, _)) => host.to_string(),
        None => rest.to_string(),
    }
}

fn with_api_path(scheme: &str, host_and_path: &str) -> String {
    if host_and_path.contains('/') {
        format!("{scheme}://{host_and_path}")
    } else {
        format!("{scheme}://{host_and_path}{API_PATH}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_scheme_and_api_path() {
        assert_eq!(to_connection_url("bridge.local", false), "ws://bridge.local/api");
        assert_eq!(to_connection_url("bridge.local", true), "wss://bridge.local/api");
    }

    #[test]
    fn host_port_preserved() {
        assert_eq!(
            to_connection_url("192.168.1.10:8080", false),
            "ws://192.168.1.10:8080/api"
        );
    }

    #[test]
    fn qualified_ws_url_unchanged() {
        assert_eq!(
            to_connection_url("ws://bridge.local/api", false),
            "ws://bridge.local/api"
        );
        assert_eq!(
            to_connection_url("wss://bridge.local:8443/api", false),
            "wss://bridge.local:8443/api"
        );
    }

    #[test]
    fn http_scheme_mapped_to_ws() {
        assert_eq!(to_connection_url("http://bridge.local", false), "ws://bridge.local/api");
        assert_eq!(to_connection_url("https://bridge.local", false), "wss://bridge.local/api");
    }

    #[test]
    fn http_with_path_keeps_path() {
        assert_eq!(
            to_connection_url("http://bridge.local/z2m/api", false),
            "ws://bridge.local/z2m/api"
        );
    }

    #[test]
    fn idempotent_on_own_output() {
        let inputs = ["bridge.local", "host:1234", "https://a/b", "", "mqtt://x", "a b"];
        for input in inputs {
            let once = to_connection_url(input, true);
            let twice = to_connection_url(&once, true);
            assert_eq!(once, twice, "input {input:?}");
        }
    }

    #[test]
    fn malformed_input_passes_through() {
        assert_eq!(to_connection_url("", false), "");
        assert_eq!(to_connection_url("not a host", false), "not a host");
        assert_eq!(to_connection_url("mqtt://broker", false), "mqtt://broker");
    }

    #[test]
    fn label_strips_scheme_and_path() {
        assert_eq!(to_display_label("ws://bridge.local/api"), "bridge.local");
        assert_eq!(to_display_label("wss://bridge.local:8443/api"), "bridge.local:8443");
    }

    #[test]
    fn label_without_scheme_unchanged() {
        assert_eq!(to_display_label("bridge.local"), "bridge.local");
        assert_eq!(to_display_label("not a url"), "not a url");
    }

    #[test]
    fn label_of_connection_url_is_stable() {
        for input in ["bridge.local", "host:8080", "https://a.example/x", "bad input"] {
            let label = to_display_label(&to_connection_url(input, false));
            assert_eq!(to_display_label(&label), label, "input {input:?}");
        }
    }
}
