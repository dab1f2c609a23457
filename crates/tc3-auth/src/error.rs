//! Error types for TC3 signing and verification.
//!
//! Every failure of the signing pipeline or of server-side verification is
//! represented by [`AuthError`]. Signing never returns a partial result: a call
//! either yields a complete signature or one of these variants.

/// Errors that can occur while signing or verifying a TC3-HMAC-SHA256 request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The query string could not be decoded into UTF-8 key/value pairs.
    #[error("Invalid query string: {0}")]
    InvalidQueryString(String),

    /// A header listed as signed is not present on the request.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// A header value is not visible ASCII or cannot be placed on a request.
    #[error("Invalid header value for {0}")]
    InvalidHeaderValue(String),

    /// The unix timestamp cannot be represented as a UTC calendar date.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// The HMAC primitive rejected its input.
    #[error("Cryptographic failure: {0}")]
    Crypto(String),

    /// A required environment variable is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// The `Authorization` header is missing from the request.
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    /// The `Authorization` header could not be parsed.
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// The signing algorithm is not supported (only TC3-HMAC-SHA256 is).
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The `Credential` component does not match
    /// `secretId/date/service/tc3_request`.
    #[error("Invalid credential format")]
    InvalidCredential,

    /// The credential date does not match the date of `X-TC-Timestamp`.
    #[error("Credential date {credential} does not match timestamp date {timestamp}")]
    DateMismatch {
        /// Date carried by the credential scope.
        credential: String,
        /// Date derived from the request timestamp.
        timestamp: String,
    },

    /// The secret id was not found in the credential store.
    #[error("Secret id not found: {0}")]
    SecretIdNotFound(String),

    /// The computed signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,
}
