use thiserror::Error;

/// Top-level error type for the `unipulse-api` crate.
///
/// Covers every failure mode across the request path and the push channel.
/// Credential rejections are handled inside the executor (one
/// re-authenticate-and-replay); everything here propagates to the caller
/// untouched.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected, login transport failed, or the session was
    /// rejected while another login attempt was already in flight.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// The server certificate was rejected during the TLS handshake.
    /// Fatal: no retry or re-authentication can resolve it.
    #[error("server certificate rejected: {0}")]
    Certificate(String),

    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Controller ──────────────────────────────────────────────────
    /// Non-auth HTTP failure, or an envelope-level rejection
    /// (`meta.rc != "ok"`). Status and body are preserved unchanged.
    #[error("controller error (HTTP {status}): {body}")]
    Upstream { status: u16, body: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Push channel ────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("event stream connection failed: {0}")]
    WebSocketConnect(String),

    // ── Input ───────────────────────────────────────────────────────
    /// A parameter was rejected before any network call was made.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

impl Error {
    /// Returns `true` if this error indicates the session is no longer
    /// valid and a fresh login might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transient error worth retrying
    /// at the caller's discretion.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::WebSocketConnect(_) => true,
            _ => false,
        }
    }

    /// Classify a transport failure, routing certificate rejections to
    /// the fatal [`Certificate`](Self::Certificate) variant.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if let Some(message) = certificate_fault(&err) {
            return Self::Certificate(message);
        }
        Self::Transport(err)
    }
}

/// Walk an error's source chain looking for a certificate rejection.
///
/// rustls surfaces these as `InvalidCertificate`/`UnknownIssuer` several
/// layers down; reqwest's own Display only says "error sending request".
pub(crate) fn certificate_fault(err: &(dyn std::error::Error + 'static)) -> Option<String> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(source) = current {
        let text = source.to_string();
        let lowered = text.to_lowercase();
        if lowered.contains("certificate") || lowered.contains("unknownissuer") {
            return Some(text);
        }
        current = source.source();
    }
    None
}
