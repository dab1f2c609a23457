//! TC3-HMAC-SHA256 request signing.
//!
//! Signing is a single linear transform:
//!
//! 1. Build the canonical request from the method, path, query, signed headers
//!    and body hash.
//! 2. Wrap its hash in the string to sign together with the timestamp and the
//!    credential scope (`date/service/tc3_request`).
//! 3. Derive the signing key from the secret key with three chained
//!    HMAC-SHA256 operations.
//! 4. HMAC the string to sign with the derived key and format the
//!    `Authorization` header.
//!
//! The date is always derived from the timestamp through [`SigningContext`],
//! so the two can never drift apart. The main entry point is [`Tc3Signer`].

use chrono::DateTime;
use hmac::{Hmac, KeyInit, Mac};
use http::HeaderValue;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use sha2::Sha256;
use tracing::debug;

use crate::canonical::{CanonicalRequestInput, hash_payload};
use crate::credentials::Credentials;
use crate::error::AuthError;
use crate::headers::X_TC_TIMESTAMP;

/// The signing algorithm identifier.
pub const ALGORITHM: &str = "TC3-HMAC-SHA256";

/// Fixed terminator of the credential scope and last key-derivation message.
pub const SCOPE_TERMINATOR: &str = "tc3_request";

/// Prefix concatenated with the secret key to form the root HMAC key.
const KEY_PREFIX: &str = "TC3";

/// Headers signed by [`Tc3Signer::sign_request`].
const DEFAULT_SIGNED_HEADERS: [&str; 2] = ["content-type", "host"];

type HmacSha256 = Hmac<Sha256>;

/// Timestamp, service and the UTC date derived from the timestamp.
///
/// There is no way to build a context from an explicit date: the date used for
/// key derivation and the credential scope always comes from the same
/// timestamp that goes into the string to sign and `X-TC-Timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    timestamp: i64,
    date: String,
    service: String,
}

impl SigningContext {
    /// Create a context for the given unix timestamp (seconds) and service.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidTimestamp`] if the timestamp has no UTC date.
    ///
    /// # Examples
    ///
    /// ```
    /// use tc3_auth::signer::SigningContext;
    ///
    /// let ctx = SigningContext::new(1_704_067_200, "aiart").unwrap();
    /// assert_eq!(ctx.date(), "2024-01-01");
    /// assert_eq!(ctx.credential_scope(), "2024-01-01/aiart/tc3_request");
    /// ```
    pub fn new(timestamp: i64, service: impl Into<String>) -> Result<Self, AuthError> {
        Ok(Self {
            timestamp,
            date: date_from_timestamp(timestamp)?,
            service: service.into(),
        })
    }

    /// Unix timestamp in seconds.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// UTC date of the timestamp, `YYYY-MM-DD`.
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Service name, e.g. `aiart`.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// `<date>/<service>/tc3_request`.
    #[must_use]
    pub fn credential_scope(&self) -> String {
        format!("{}/{}/{SCOPE_TERMINATOR}", self.date, self.service)
    }
}

/// Everything produced by one signing call.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// Complete `Authorization` header value.
    pub authorization: String,
    /// Hex-encoded signature (64 lower-case characters).
    pub signature: String,
    /// `<date>/<service>/tc3_request`.
    pub credential_scope: String,
    /// `;`-joined signed header names.
    pub signed_headers: String,
    /// The canonical request that was hashed.
    pub canonical_request: String,
    /// The string that was HMACed.
    pub string_to_sign: String,
    /// Timestamp the signature is bound to.
    pub timestamp: i64,
}

/// Signs requests for one service with borrowed credentials.
///
/// Holds no mutable state; one signer can be shared across threads and
/// every call recomputes the signing key.
#[derive(Debug, Clone, Copy)]
pub struct Tc3Signer<'a> {
    credentials: &'a Credentials,
    service: &'a str,
}

impl<'a> Tc3Signer<'a> {
    /// Create a signer for `service` using `credentials`.
    #[must_use]
    pub fn new(credentials: &'a Credentials, service: &'a str) -> Self {
        Self {
            credentials,
            service,
        }
    }

    /// Sign a request description at the given unix timestamp.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] if the request cannot be canonicalized, the
    /// timestamp is out of range, or the HMAC primitive fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use tc3_auth::{CanonicalRequestInput, Credentials, Tc3Signer};
    ///
    /// let creds = Credentials::new("AKID123", "testkey");
    /// let signer = Tc3Signer::new(&creds, "aiart");
    /// let input = CanonicalRequestInput {
    ///     method: "POST",
    ///     uri: "/",
    ///     query: "",
    ///     headers: &[("content-type", "application/json"), ("host", "aiart.tencentcloudapi.com")],
    ///     signed_headers: &["content-type", "host"],
    ///     payload: b"{}",
    /// };
    ///
    /// let signed = signer.sign(&input, 1_704_067_200).unwrap();
    /// assert!(signed.authorization.starts_with("TC3-HMAC-SHA256 Credential=AKID123/2024-01-01/aiart/tc3_request, "));
    /// ```
    pub fn sign(
        &self,
        input: &CanonicalRequestInput<'_>,
        timestamp: i64,
    ) -> Result<SignedRequest, AuthError> {
        let context = SigningContext::new(timestamp, self.service)?;
        let canonical_request = input.canonicalize()?;
        let signed_headers = input.signed_headers_string();

        debug!(canonical_request, "Built canonical request");

        let string_to_sign = build_string_to_sign(&context, &canonical_request);

        debug!(string_to_sign, "Built string to sign");

        let signing_key = derive_signing_key(self.credentials.expose_secret(), &context)?;
        let signature = compute_signature(&signing_key, &string_to_sign)?;
        let credential_scope = context.credential_scope();
        let authorization = format_authorization(
            self.credentials.secret_id(),
            &credential_scope,
            &signed_headers,
            &signature,
        );

        debug!(
            secret_id = %self.credentials.secret_id(),
            credential_scope = %credential_scope,
            signed_headers = %signed_headers,
            "Signed request"
        );

        Ok(SignedRequest {
            authorization,
            signature,
            credential_scope,
            signed_headers,
            canonical_request,
            string_to_sign,
            timestamp,
        })
    }

    /// Sign an outgoing request in place.
    ///
    /// Signs `content-type` and `host`. The host comes from the `Host` header,
    /// or from the URI authority including any port (in which case `Host` is
    /// inserted). `parts` is only modified once signing has succeeded; then
    /// `Authorization` and `X-TC-Timestamp` are set from the same timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingHeader`] if `Content-Type` is absent or no
    /// host can be determined, plus any error from [`Tc3Signer::sign`].
    pub fn sign_request(
        &self,
        parts: &mut http::request::Parts,
        body: &[u8],
        timestamp: i64,
    ) -> Result<SignedRequest, AuthError> {
        let (host, host_missing) = match parts.headers.get(HOST) {
            Some(value) => (header_str(value, "host")?.to_owned(), false),
            None => {
                let authority = parts
                    .uri
                    .authority()
                    .ok_or_else(|| AuthError::MissingHeader("host".to_owned()))?;
                (authority.as_str().to_owned(), true)
            }
        };
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .ok_or_else(|| AuthError::MissingHeader("content-type".to_owned()))
            .and_then(|v| header_str(v, "content-type"))?
            .to_owned();

        let headers = [("content-type", content_type.as_str()), ("host", host.as_str())];
        let input = CanonicalRequestInput {
            method: parts.method.as_str(),
            uri: parts.uri.path(),
            query: parts.uri.query().unwrap_or(""),
            headers: &headers,
            signed_headers: &DEFAULT_SIGNED_HEADERS,
            payload: body,
        };

        let signed = self.sign(&input, timestamp)?;

        let authorization = header_value("authorization", &signed.authorization)?;
        let timestamp_value = header_value(X_TC_TIMESTAMP.as_str(), &timestamp.to_string())?;
        let host_value = if host_missing {
            Some(header_value("host", &host)?)
        } else {
            None
        };

        if let Some(host_value) = host_value {
            parts.headers.insert(HOST, host_value);
        }
        parts.headers.insert(AUTHORIZATION, authorization);
        parts.headers.insert(X_TC_TIMESTAMP, timestamp_value);

        Ok(signed)
    }
}

/// Format a unix timestamp as its UTC date, `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns [`AuthError::InvalidTimestamp`] if the timestamp is out of range.
///
/// # Examples
///
/// ```
/// use tc3_auth::signer::date_from_timestamp;
///
/// assert_eq!(date_from_timestamp(1_704_153_599).unwrap(), "2024-01-01");
/// assert_eq!(date_from_timestamp(1_704_153_600).unwrap(), "2024-01-02");
/// ```
pub fn date_from_timestamp(timestamp: i64) -> Result<String, AuthError> {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .ok_or(AuthError::InvalidTimestamp(timestamp))
}

/// Build the TC3 string to sign.
///
/// Format:
/// ```text
/// TC3-HMAC-SHA256\n
/// <timestamp>\n
/// <date>/<service>/tc3_request\n
/// <hex(SHA256(canonical_request))>
/// ```
#[must_use]
pub fn build_string_to_sign(context: &SigningContext, canonical_request: &str) -> String {
    format!(
        "{ALGORITHM}\n{}\n{}\n{}",
        context.timestamp(),
        context.credential_scope(),
        hash_payload(canonical_request.as_bytes())
    )
}

/// Derive the TC3 signing key.
///
/// ```text
/// kDate    = HMAC-SHA256("TC3" + secret_key, date)
/// kService = HMAC-SHA256(kDate, service)
/// kSigning = HMAC-SHA256(kService, "tc3_request")
/// ```
///
/// # Errors
///
/// Returns [`AuthError::Crypto`] if the HMAC primitive rejects a key.
///
/// # Examples
///
/// ```
/// use tc3_auth::signer::{SigningContext, derive_signing_key};
///
/// let ctx = SigningContext::new(1_704_067_200, "aiart").unwrap();
/// let key = derive_signing_key("testkey", &ctx).unwrap();
/// assert_eq!(
///     hex::encode(key),
///     "55588918cb93ddab8763f5076c0e00b405febe60d7d29f23a465e0d570aecf79"
/// );
/// ```
pub fn derive_signing_key(secret_key: &str, context: &SigningContext) -> Result<[u8; 32], AuthError> {
    let date_key = hmac_sha256(
        format!("{KEY_PREFIX}{secret_key}").as_bytes(),
        context.date().as_bytes(),
    )?;
    let service_key = hmac_sha256(&date_key, context.service().as_bytes())?;
    hmac_sha256(&service_key, SCOPE_TERMINATOR.as_bytes())
}

/// Compute the hex-encoded HMAC-SHA256 of `data` under `signing_key`.
///
/// # Errors
///
/// Returns [`AuthError::Crypto`] if the HMAC primitive rejects the key.
pub fn compute_signature(signing_key: &[u8], data: &str) -> Result<String, AuthError> {
    hmac_sha256(signing_key, data.as_bytes()).map(hex::encode)
}

/// Format the `Authorization` header value.
///
/// # Examples
///
/// ```
/// use tc3_auth::signer::format_authorization;
///
/// let header = format_authorization(
///     "AKID123",
///     "2024-01-01/aiart/tc3_request",
///     "content-type;host",
///     "abc",
/// );
/// assert_eq!(
///     header,
///     "TC3-HMAC-SHA256 Credential=AKID123/2024-01-01/aiart/tc3_request, \
///      SignedHeaders=content-type;host, Signature=abc"
/// );
/// ```
#[must_use]
pub fn format_authorization(
    secret_id: &str,
    credential_scope: &str,
    signed_headers: &str,
    signature: &str,
) -> String {
    format!(
        "{ALGORITHM} Credential={secret_id}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}"
    )
}

/// Compute HMAC-SHA256 and return the raw bytes.
fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; 32], AuthError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| AuthError::Crypto(e.to_string()))?;
    mac.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

fn header_str<'h>(value: &'h HeaderValue, name: &str) -> Result<&'h str, AuthError> {
    value
        .to_str()
        .map_err(|_| AuthError::InvalidHeaderValue(name.to_owned()))
}

pub(crate) fn header_value(name: &str, value: &str) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(value).map_err(|_| AuthError::InvalidHeaderValue(name.to_owned()))
}
