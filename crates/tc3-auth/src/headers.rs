//! Companion headers sent alongside `Authorization`.
//!
//! The remote endpoint routes a call by `X-TC-Action`, `X-TC-Region` and
//! `X-TC-Version`, and expects `X-TC-Timestamp` and `X-TC-Nonce` on every
//! request. None of these are covered by the signature; `X-TC-Timestamp` is
//! written by [`Tc3Signer::sign_request`](crate::Tc3Signer::sign_request) so it
//! always matches the signed timestamp.

use http::HeaderMap;
use http::header::HeaderName;

use crate::error::AuthError;
use crate::signer::header_value;

/// Action name header.
pub const X_TC_ACTION: HeaderName = HeaderName::from_static("x-tc-action");
/// Region header.
pub const X_TC_REGION: HeaderName = HeaderName::from_static("x-tc-region");
/// API version header.
pub const X_TC_VERSION: HeaderName = HeaderName::from_static("x-tc-version");
/// Unix timestamp header, equal to the timestamp in the string to sign.
pub const X_TC_TIMESTAMP: HeaderName = HeaderName::from_static("x-tc-timestamp");
/// Random nonce header.
pub const X_TC_NONCE: HeaderName = HeaderName::from_static("x-tc-nonce");

/// Upper bound (exclusive) for generated nonces.
const NONCE_LIMIT: u32 = 1_000_000;

/// The action/region/version/nonce set for one API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionHeaders {
    /// API action, e.g. `TextToImageLite`.
    pub action: String,
    /// Region, e.g. `ap-guangzhou`.
    pub region: String,
    /// API version, e.g. `2022-12-29`.
    pub version: String,
    /// Per-call random integer.
    pub nonce: u32,
}

impl ActionHeaders {
    /// Create headers with a fresh random nonce.
    pub fn new(
        action: impl Into<String>,
        region: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            region: region.into(),
            version: version.into(),
            nonce: random_nonce(),
        }
    }

    /// Replace the nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }

    /// Insert the four headers into `headers`, replacing existing values.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidHeaderValue`] if a value is not a valid
    /// header value.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), AuthError> {
        headers.insert(X_TC_ACTION, header_value(X_TC_ACTION.as_str(), &self.action)?);
        headers.insert(X_TC_REGION, header_value(X_TC_REGION.as_str(), &self.region)?);
        headers.insert(
            X_TC_VERSION,
            header_value(X_TC_VERSION.as_str(), &self.version)?,
        );
        headers.insert(
            X_TC_NONCE,
            header_value(X_TC_NONCE.as_str(), &self.nonce.to_string())?,
        );
        Ok(())
    }
}

/// A random positive nonce below one million.
#[must_use]
pub fn random_nonce() -> u32 {
    rand::random_range(1..NONCE_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_apply_action_headers() {
        let mut headers = HeaderMap::new();
        ActionHeaders::new("TextToImageLite", "ap-guangzhou", "2022-12-29")
            .with_nonce(42)
            .apply(&mut headers)
            .unwrap();

        assert_eq!(headers[X_TC_ACTION], "TextToImageLite");
        assert_eq!(headers[X_TC_REGION], "ap-guangzhou");
        assert_eq!(headers[X_TC_VERSION], "2022-12-29");
        assert_eq!(headers[X_TC_NONCE], "42");
        assert!(headers.get(X_TC_TIMESTAMP).is_none());
    }

    #[test]
    fn test_should_generate_nonce_in_range() {
        for _ in 0..100 {
            let nonce = random_nonce();
            assert!((1..NONCE_LIMIT).contains(&nonce));
        }
    }

    #[test]
    fn test_should_reject_invalid_header_value() {
        let mut headers = HeaderMap::new();
        let result = ActionHeaders::new("Bad\nAction", "ap-guangzhou", "2022-12-29")
            .apply(&mut headers);
        assert!(matches!(result, Err(AuthError::InvalidHeaderValue(_))));
    }
}
