//! Canonical request construction for TC3-HMAC-SHA256.
//!
//! The canonical request is six parts joined by `\n`:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n
//! SignedHeaders\n
//! HashedRequestPayload
//! ```
//!
//! Every canonical header line ends with `\n`, so the assembled string has an
//! empty line between the last header and the signed headers list.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Characters percent-encoded in URI paths and query components.
///
/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is encoded, which is the
/// `encodeURIComponent` set the remote service canonicalizes with.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A borrowed description of the HTTP request being signed.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalRequestInput<'a> {
    /// HTTP method, any case.
    pub method: &'a str,
    /// Request path, not yet percent-encoded.
    pub uri: &'a str,
    /// Raw query string without the leading `?`, possibly empty.
    pub query: &'a str,
    /// Request headers as (name, value) pairs.
    pub headers: &'a [(&'a str, &'a str)],
    /// Names of the headers covered by the signature.
    pub signed_headers: &'a [&'a str],
    /// Exact body bytes that will be transmitted.
    pub payload: &'a [u8],
}

impl CanonicalRequestInput<'_> {
    /// Build the canonical request string for this input.
    ///
    /// # Errors
    ///
    /// See [`build_canonical_request`].
    pub fn canonicalize(&self) -> Result<String, AuthError> {
        build_canonical_request(
            self.method,
            self.uri,
            self.query,
            self.headers,
            self.signed_headers,
            self.payload,
        )
    }

    /// The `;`-joined signed headers list for this input.
    #[must_use]
    pub fn signed_headers_string(&self) -> String {
        build_signed_headers_string(self.signed_headers)
    }
}

/// Build the full canonical request string.
///
/// The method is upper-cased and the payload is hashed here, so callers pass
/// the exact body bytes that will be transmitted.
///
/// # Errors
///
/// Returns [`AuthError::InvalidQueryString`] if the query cannot be decoded, or
/// [`AuthError::MissingHeader`] if a signed header is absent from `headers`.
///
/// # Examples
///
/// ```
/// use tc3_auth::canonical::build_canonical_request;
///
/// let canonical = build_canonical_request(
///     "post",
///     "/",
///     "",
///     &[("Content-Type", "application/json"), ("Host", "aiart.tencentcloudapi.com")],
///     &["content-type", "host"],
///     b"{}",
/// )
/// .unwrap();
/// assert!(canonical.starts_with("POST\n/\n\ncontent-type:application/json\n"));
/// ```
pub fn build_canonical_request(
    method: &str,
    uri: &str,
    query_string: &str,
    headers: &[(&str, &str)],
    signed_headers: &[&str],
    payload: &[u8],
) -> Result<String, AuthError> {
    let method = method.to_uppercase();
    let canonical_uri = build_canonical_uri(uri);
    let canonical_query = build_canonical_query_string(query_string)?;
    let canonical_headers = build_canonical_headers(headers, signed_headers)?;
    let signed_headers_str = build_signed_headers_string(signed_headers);
    let payload_hash = hash_payload(payload);

    Ok(format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n{signed_headers_str}\n{payload_hash}"
    ))
}

/// Build the canonical URI: percent-encode the path, then restore `/`.
///
/// Empty paths are normalized to `/`.
///
/// # Examples
///
/// ```
/// use tc3_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("/"), "/");
/// assert_eq!(build_canonical_uri(""), "/");
/// assert_eq!(build_canonical_uri("/a b/c"), "/a%20b/c");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_owned();
    }

    utf8_percent_encode(path, COMPONENT_ENCODE_SET)
        .to_string()
        .replace("%2F", "/")
}

/// Build the canonical query string.
///
/// Pairs are decoded (`+` is a space), stable-sorted by key, then re-encoded.
/// Duplicate keys keep their original relative order.
///
/// # Errors
///
/// Returns [`AuthError::InvalidQueryString`] if a decoded key or value is not
/// valid UTF-8.
///
/// # Examples
///
/// ```
/// use tc3_auth::canonical::build_canonical_query_string;
///
/// assert_eq!(build_canonical_query_string("").unwrap(), "");
/// assert_eq!(build_canonical_query_string("b=2&a=1").unwrap(), "a=1&b=2");
/// ```
pub fn build_canonical_query_string(query: &str) -> Result<String, AuthError> {
    if query.is_empty() {
        return Ok(String::new());
    }

    let mut params = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| {
            let (key, value) = param.split_once('=').unwrap_or((param, ""));
            Ok::<_, AuthError>((decode_component(key)?, decode_component(value)?))
        })
        .collect::<Result<Vec<(String, String)>, AuthError>>()?;

    params.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&"))
}

/// Build the canonical headers block.
///
/// Header names are matched case-insensitively and emitted lower-cased in
/// sorted order, one `name:value\n` line per signed header. Values are trimmed
/// and inner whitespace runs collapse to a single space. Repeated headers are
/// joined with commas.
///
/// # Errors
///
/// Returns [`AuthError::MissingHeader`] if a signed header has no value.
///
/// # Examples
///
/// ```
/// use tc3_auth::canonical::build_canonical_headers;
///
/// let result = build_canonical_headers(
///     &[("Host", "h"), ("Content-Type", "application/json")],
///     &["host", "content-type"],
/// )
/// .unwrap();
/// assert_eq!(result, "content-type:application/json\nhost:h\n");
/// ```
pub fn build_canonical_headers(
    headers: &[(&str, &str)],
    signed_headers: &[&str],
) -> Result<String, AuthError> {
    let mut header_map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let lower_name = name.to_lowercase();
        let trimmed_value = collapse_whitespace(value.trim());
        header_map
            .entry(lower_name)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&trimmed_value);
            })
            .or_insert(trimmed_value);
    }

    normalize_signed_headers(signed_headers)
        .into_iter()
        .try_fold(String::new(), |mut out, name| {
            let value = header_map
                .get(&name)
                .ok_or_else(|| AuthError::MissingHeader(name.clone()))?;
            out.push_str(&name);
            out.push(':');
            out.push_str(value);
            out.push('\n');
            Ok::<_, AuthError>(out)
        })
}

/// Build the signed headers list: lower-cased, sorted, `;`-separated.
///
/// # Examples
///
/// ```
/// use tc3_auth::canonical::build_signed_headers_string;
///
/// assert_eq!(build_signed_headers_string(&["Host", "Content-Type"]), "content-type;host");
/// ```
#[must_use]
pub fn build_signed_headers_string(signed_headers: &[&str]) -> String {
    normalize_signed_headers(signed_headers).join(";")
}

/// Compute the lower-case hex SHA-256 of the given payload.
///
/// # Examples
///
/// ```
/// use tc3_auth::canonical::hash_payload;
///
/// assert_eq!(
///     hash_payload(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Lower-case, sort and de-duplicate signed header names.
///
/// Both the canonical headers block and the signed headers list go through
/// this so the two always describe the same set.
fn normalize_signed_headers(signed_headers: &[&str]) -> Vec<String> {
    let mut names: Vec<String> = signed_headers.iter().map(|h| h.to_lowercase()).collect();
    names.sort_unstable();
    names.dedup();
    names
}

fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT_ENCODE_SET).to_string()
}

fn decode_component(input: &str) -> Result<String, AuthError> {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| AuthError::InvalidQueryString(input.to_owned()))
}

/// Collapse consecutive whitespace characters in a string to a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
