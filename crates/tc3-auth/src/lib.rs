//! TC3-HMAC-SHA256 request signing and verification.
//!
//! This crate produces the `Authorization` header required by the signed
//! cloud API, and provides the matching server-side verification.
//!
//! # Overview
//!
//! A signature binds a request's method, path, query, selected headers and
//! body hash to a secret key, a service name and a unix timestamp. The secret
//! key never signs directly: a per-day, per-service key is derived from it
//! through a chain of HMAC-SHA256 operations.
//!
//! # Usage
//!
//! ```rust
//! use tc3_auth::{ActionHeaders, Credentials, Tc3Signer};
//!
//! let credentials = Credentials::new("AKID123", "testkey");
//! let body = br#"{"Prompt":"a cat"}"#.to_vec();
//!
//! let mut request = http::Request::builder()
//!     .method("POST")
//!     .uri("https://aiart.tencentcloudapi.com/")
//!     .header("content-type", "application/json")
//!     .body(body)
//!     .unwrap();
//!
//! ActionHeaders::new("TextToImageLite", "ap-guangzhou", "2022-12-29")
//!     .apply(request.headers_mut())
//!     .unwrap();
//!
//! let (mut parts, body) = request.into_parts();
//! Tc3Signer::new(&credentials, "aiart")
//!     .sign_request(&mut parts, &body, 1_704_067_200)
//!     .unwrap();
//! assert!(parts.headers.contains_key("authorization"));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request construction
//! - [`credentials`] - Credentials and secret lookup
//! - [`error`] - Error types
//! - [`headers`] - `X-TC-*` companion headers
//! - [`signer`] - Key derivation, string to sign and signature emission
//! - [`verify`] - Server-side signature verification

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod headers;
pub mod signer;
pub mod verify;

pub use canonical::{CanonicalRequestInput, hash_payload};
pub use credentials::{CredentialProvider, Credentials, StaticCredentialProvider};
pub use error::AuthError;
pub use headers::ActionHeaders;
pub use signer::{SignedRequest, SigningContext, Tc3Signer};
pub use verify::{VerifiedRequest, verify_tc3};
