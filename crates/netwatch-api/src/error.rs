use thiserror::Error;

/// Top-level error type for the `netwatch-api` crate.
///
/// Covers every failure mode of the monitor server surfaces: HTTP
/// transport, non-success responses, malformed bodies, and the live
/// update socket. `netwatch-core` folds these into a `FetchError`.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP ────────────────────────────────────────────────────────
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Live channel ────────────────────────────────────────────────
    /// WebSocket connection failed or broke mid-stream.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// The server sent a close frame with a status code.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_carries_code_and_reason() {
        let err = Error::WebSocketClosed {
            code: 1001,
            reason: "going away".into(),
        };
        assert_eq!(err.to_string(), "WebSocket closed (code 1001): going away");
    }

    #[test]
    fn http_error_display() {
        let err = Error::Http {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503: unavailable");
    }

    #[test]
    fn deserialization_display_omits_body() {
        let err = Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        };
        assert_eq!(err.to_string(), "Deserialization error: expected value");
    }
}
