//! Client error types.

use tc3_auth::AuthError;
use tc3_core::Tc3Error;

/// Errors returned by [`AiArtClient`](crate::AiArtClient).
#[derive(Debug, thiserror::Error)]
pub enum AiArtError {
    /// The client configuration is unusable.
    #[error(transparent)]
    Config(#[from] Tc3Error),

    /// Signing failed; the request was never sent.
    #[error("request could not be authenticated: {0}")]
    Signing(#[from] AuthError),

    /// Transport failure (connect, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request failed local validation and was not sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request could not be assembled.
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// The endpoint answered with a non-success status.
    #[error("HTTP status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The API reported an error inside a successful response.
    #[error("API error {code}: {message}")]
    Api {
        /// Error code, e.g. `AuthFailure.SignatureFailure`.
        code: String,
        /// Human-readable message.
        message: String,
        /// Request id assigned by the service, if any.
        request_id: Option<String>,
    },

    /// The body could not be serialized or the response parsed.
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The response carried no image.
    #[error("no image found in response")]
    MissingImage,
}

impl AiArtError {
    /// Whether a fresh attempt (re-signed, new timestamp and nonce) may succeed.
    ///
    /// True for rate limiting (429), unavailability (503), timeouts and
    /// connection failures. This client never retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status == 503,
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Api { code, .. } => code.starts_with("RequestLimitExceeded"),
            _ => false,
        }
    }
}
