// ── Core error types ──
//
// User-facing errors for the dashboard. Transport-level failures from
// netwatch-api are folded into a small, cloneable `FetchError` so they
// can live inside observable status values.

use netwatch_api::Error as ApiError;
use thiserror::Error;

/// Broad failure category of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum FetchErrorKind {
    /// The server could not be reached (refused, timeout, DNS, TLS).
    #[strum(to_string = "network")]
    Network,
    /// The server answered with a non-success status.
    #[strum(to_string = "http")]
    Http,
    /// The body was not the expected shape.
    #[strum(to_string = "parse")]
    Parse,
}

/// A failed fetch, as surfaced to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {detail}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub detail: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Network, detail)
    }

    pub fn http(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Http, detail)
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Parse, detail)
    }
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Http { status, message } => Self::http(format!("HTTP {status}: {message}")),
            ApiError::Deserialization { message, .. } => Self::parse(message),
            ApiError::Transport(ref e) if e.is_decode() => Self::parse(e.to_string()),
            ApiError::Transport(ref e) if e.is_status() => Self::http(e.to_string()),
            other @ (ApiError::Transport(_)
            | ApiError::InvalidUrl(_)
            | ApiError::Tls(_)
            | ApiError::WebSocketConnect(_)
            | ApiError::WebSocketClosed { .. }) => Self::network(other.to_string()),
        }
    }
}
