//! Server-side TC3-HMAC-SHA256 verification.
//!
//! The verifier recomputes the signature the way the remote service does:
//!
//! 1. Parse the `Authorization` header into credential scope, signed headers
//!    and signature.
//! 2. Derive the date from `X-TC-Timestamp` and reject a credential scope
//!    carrying a different date.
//! 3. Resolve the secret key for the secret id.
//! 4. Rebuild the canonical request from the declared signed headers and the
//!    received body, sign it, and compare in constant time.
//!
//! The main entry point is [`verify_tc3`].

use subtle::ConstantTimeEq;
use tracing::debug;

use crate::canonical::CanonicalRequestInput;
use crate::credentials::CredentialProvider;
use crate::error::AuthError;
use crate::headers::X_TC_TIMESTAMP;
use crate::signer::{
    ALGORITHM, SCOPE_TERMINATOR, SigningContext, build_string_to_sign, compute_signature,
    derive_signing_key,
};

/// The result of a successful verification.
#[derive(Debug, Clone)]
pub struct VerifiedRequest {
    /// The secret id that signed the request.
    pub secret_id: String,
    /// The service from the credential scope.
    pub service: String,
    /// The signed timestamp.
    pub timestamp: i64,
    /// The headers covered by the signature.
    pub signed_headers: Vec<String>,
}

/// Parsed components of a TC3 `Authorization` header.
///
/// Format:
/// ```text
/// TC3-HMAC-SHA256 Credential=AKID/2024-01-01/aiart/tc3_request,
///   SignedHeaders=content-type;host, Signature=<hex-signature>
/// ```
#[derive(Debug, Clone)]
pub struct ParsedAuthorization {
    /// The signing algorithm (must be `TC3-HMAC-SHA256`).
    pub algorithm: String,
    /// The secret id.
    pub secret_id: String,
    /// The date component of the credential scope (`YYYY-MM-DD`).
    pub date: String,
    /// The service component of the credential scope.
    pub service: String,
    /// The signed header names.
    pub signed_headers: Vec<String>,
    /// The hex-encoded signature.
    pub signature: String,
}

/// Parse a TC3 `Authorization` header value.
///
/// # Errors
///
/// Returns [`AuthError::InvalidAuthHeader`] if a component is missing,
/// [`AuthError::UnsupportedAlgorithm`] for any algorithm other than
/// `TC3-HMAC-SHA256`, or [`AuthError::InvalidCredential`] if the credential is
/// not `secretId/date/service/tc3_request`.
///
/// # Examples
///
/// ```
/// use tc3_auth::verify::parse_authorization_header;
///
/// let parsed = parse_authorization_header(
///     "TC3-HMAC-SHA256 Credential=AKID123/2024-01-01/aiart/tc3_request, \
///      SignedHeaders=content-type;host, Signature=abc",
/// )
/// .unwrap();
/// assert_eq!(parsed.secret_id, "AKID123");
/// assert_eq!(parsed.service, "aiart");
/// ```
pub fn parse_authorization_header(header: &str) -> Result<ParsedAuthorization, AuthError> {
    let Some((algorithm, fields)) = header.split_once(' ') else {
        return Err(AuthError::InvalidAuthHeader);
    };
    if algorithm != ALGORITHM {
        return Err(AuthError::UnsupportedAlgorithm(algorithm.to_owned()));
    }

    // Fields are `Key=value`, comma separated, in any order.
    let field = |key: &str| {
        fields
            .split(',')
            .map(str::trim)
            .find_map(|f| f.strip_prefix(key)?.strip_prefix('='))
            .ok_or(AuthError::InvalidAuthHeader)
    };
    let credential = field("Credential")?;
    let signed_headers = field("SignedHeaders")?;
    let signature = field("Signature")?;

    let mut scope = credential.split('/');
    let (Some(secret_id), Some(date), Some(service), Some(SCOPE_TERMINATOR), None) = (
        scope.next(),
        scope.next(),
        scope.next(),
        scope.next(),
        scope.next(),
    ) else {
        return Err(AuthError::InvalidCredential);
    };
    if [secret_id, date, service].iter().any(|part| part.is_empty()) {
        return Err(AuthError::InvalidCredential);
    }

    Ok(ParsedAuthorization {
        algorithm: algorithm.to_owned(),
        secret_id: secret_id.to_owned(),
        date: date.to_owned(),
        service: service.to_owned(),
        signed_headers: signed_headers.split(';').map(ToOwned::to_owned).collect(),
        signature: signature.to_owned(),
    })
}

/// Verify a TC3-signed HTTP request.
///
/// Only the headers listed in `SignedHeaders` take part; the companion
/// `X-TC-*` headers other than the timestamp are not covered.
///
/// # Errors
///
/// Returns an [`AuthError`] if:
/// - `Authorization` or `X-TC-Timestamp` is missing or malformed
/// - The credential date disagrees with the timestamp
/// - The secret id is unknown
/// - A signed header is missing
/// - The signature does not match
pub fn verify_tc3(
    parts: &http::request::Parts,
    body: &[u8],
    credential_provider: &dyn CredentialProvider,
) -> Result<VerifiedRequest, AuthError> {
    let authorization = match parts.headers.get(http::header::AUTHORIZATION) {
        Some(value) => value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?,
        None => return Err(AuthError::MissingAuthHeader),
    };
    let parsed = parse_authorization_header(authorization)?;
    let context = signing_context(parts, &parsed)?;
    let secret_key = credential_provider.get_secret_key(&parsed.secret_id)?;

    let expected = expected_signature(parts, body, &parsed, &context, &secret_key)?;
    let matches: bool = parsed.signature.as_bytes().ct_eq(expected.as_bytes()).into();
    if !matches {
        debug!(
            secret_id = %parsed.secret_id,
            scope = %context.credential_scope(),
            "Rejected request with a non-matching signature"
        );
        return Err(AuthError::SignatureDoesNotMatch);
    }

    debug!(secret_id = %parsed.secret_id, service = %parsed.service, "Accepted signed request");

    Ok(VerifiedRequest {
        secret_id: parsed.secret_id,
        service: parsed.service,
        timestamp: context.timestamp(),
        signed_headers: parsed.signed_headers,
    })
}

/// Rebuild the signing context from `X-TC-Timestamp`, rejecting a scope date
/// that belongs to another day.
fn signing_context(
    parts: &http::request::Parts,
    parsed: &ParsedAuthorization,
) -> Result<SigningContext, AuthError> {
    let raw = header_text(parts, X_TC_TIMESTAMP.as_str())?;
    let timestamp = raw
        .parse::<i64>()
        .map_err(|_| AuthError::InvalidHeaderValue(X_TC_TIMESTAMP.as_str().to_owned()))?;

    let context = SigningContext::new(timestamp, parsed.service.as_str())?;
    if context.date() == parsed.date {
        Ok(context)
    } else {
        Err(AuthError::DateMismatch {
            credential: parsed.date.clone(),
            timestamp: context.date().to_owned(),
        })
    }
}

/// The signature the request should carry if it was signed with `secret_key`.
fn expected_signature(
    parts: &http::request::Parts,
    body: &[u8],
    parsed: &ParsedAuthorization,
    context: &SigningContext,
    secret_key: &str,
) -> Result<String, AuthError> {
    let names: Vec<&str> = parsed.signed_headers.iter().map(String::as_str).collect();
    let mut pairs = Vec::with_capacity(names.len());
    for &name in &names {
        pairs.push((name, header_text(parts, name)?));
    }

    let canonical_request = CanonicalRequestInput {
        method: parts.method.as_str(),
        uri: parts.uri.path(),
        query: parts.uri.query().unwrap_or(""),
        headers: &pairs,
        signed_headers: &names,
        payload: body,
    }
    .canonicalize()?;

    let string_to_sign = build_string_to_sign(context, &canonical_request);
    let signing_key = derive_signing_key(secret_key, context)?;
    compute_signature(&signing_key, &string_to_sign)
}

fn header_text<'a>(parts: &'a http::request::Parts, name: &str) -> Result<&'a str, AuthError> {
    let value = parts
        .headers
        .get(name)
        .ok_or_else(|| AuthError::MissingHeader(name.to_owned()))?;
    value
        .to_str()
        .map_err(|_| AuthError::InvalidHeaderValue(name.to_owned()))
}
