//! 2.0 scheme signing and verification.
//!
//! The 2.0 `Authorization` header has the format:
//!
//! ```text
//! acquia-http-hmac id="<id>",nonce="<nonce>",realm="<realm>",signature="<sig>",version="2.0"
//! ```
//!
//! with parameters in lexicographic order, percent-encoded values, and an
//! optional `headers="name1,name2"` parameter listing extra signed headers,
//! emitted only when non-empty. `Signature = Base64(HMAC-SHA256(key, StringToSign))`
//! where the key is the base64-decoded credential secret and:
//!
//! ```text
//! StringToSign = HTTP-Verb + "\n" +
//!                Host + "\n" +
//!                Path + "\n" +
//!                Query + "\n" +
//!                Parameters + "\n" +
//!                Extra-Signed-Headers +
//!                Timestamp
//!                [ + "\n" + Content-Type + "\n" + Content-SHA256 ]
//! ```
//!
//! `Path` has one trailing slash trimmed, `Parameters` is the sorted
//! `k=v&…` rendering of id, nonce, realm, and version, and the trailing
//! content block is present only when the request carries a body. Requests
//! must declare their timestamp in `X-Authorization-Timestamp` and, when a
//! body is present, its digest in `X-Authorization-Content-SHA256`.
//!
//! Responses are signed over `nonce + "\n" + timestamp + "\n" + body` with
//! the same key, carried in `X-Server-Authorization-HMAC-SHA256`, binding
//! the response to the request that elicited it.

use std::collections::BTreeMap;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use digest::KeyInit;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::credentials::CredentialProvider;
use crate::error::AuthError;
use crate::registry::Protocol;
use crate::validate::{check_content_digest, check_timestamp_window};
use crate::verify::AuthResult;

type HmacSha256 = Hmac<Sha256>;

/// The scheme token that opens a 2.0 `Authorization` header.
pub const SCHEME: &str = "acquia-http-hmac";

/// The protocol version carried in the `version` parameter.
pub const VERSION: &str = "2.0";

/// Request header carrying the declared timestamp, seconds since epoch.
pub const TIMESTAMP_HEADER: &str = "x-authorization-timestamp";

/// Request header carrying the base64 SHA-256 digest of the body.
pub const CONTENT_HASH_HEADER: &str = "x-authorization-content-sha256";

/// Response header carrying the server's response signature.
pub const RESPONSE_SIGNATURE_HEADER: &str = "x-server-authorization-hmac-sha256";

/// Characters percent-encoded in parameter values, both on the wire and in
/// the canonical parameters line: everything except RFC 3986 unreserved.
const PARAM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Structured authentication parameters for the 2.0 scheme.
#[derive(Debug, Clone)]
pub struct AuthParams {
    /// The provider realm, e.g. a service name. Optional.
    pub realm: Option<String>,
    /// The key id.
    pub id: String,
    /// The per-request nonce binding the signature to one request instance.
    pub nonce: String,
    /// The protocol version string, normally [`VERSION`].
    pub version: String,
    /// Names of extra request headers folded into the signature, in the
    /// order they appear in the canonical string.
    pub headers: Vec<String>,
}

/// Parsed components of a 2.0 `Authorization` header.
#[derive(Debug, Clone)]
pub struct ParsedAuth {
    /// The structured parameters.
    pub params: AuthParams,
    /// The base64-encoded signature.
    pub signature: String,
}

/// Parse a 2.0 `Authorization` header value into its components.
///
/// Parameter order is not significant on input, values are percent-decoded,
/// and unknown parameter names are ignored. `id`, `nonce`, `signature`, and
/// `version` are required; `realm` and `headers` are optional.
///
/// # Errors
///
/// Returns [`AuthError::InvalidAuthHeader`] if the scheme token does not
/// match, a parameter is not a quoted `name="value"` pair, or a required
/// parameter is absent.
pub fn parse_authorization_header(header: &str) -> Result<ParsedAuth, AuthError> {
    let rest = header
        .strip_prefix(SCHEME)
        .and_then(|r| r.strip_prefix(' '))
        .ok_or(AuthError::InvalidAuthHeader)?;

    let mut values: BTreeMap<&str, String> = BTreeMap::new();
    for part in rest.split(',') {
        let part = part.trim();
        let (name, quoted) = part.split_once('=').ok_or(AuthError::InvalidAuthHeader)?;
        let value = quoted
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .ok_or(AuthError::InvalidAuthHeader)?;
        values.insert(name, percent_decode_str(value).decode_utf8_lossy().into_owned());
    }

    let required = |name: &str| -> Result<String, AuthError> {
        values.get(name).cloned().ok_or(AuthError::InvalidAuthHeader)
    };

    let headers = values
        .get("headers")
        .map(|list| {
            list.split(',')
                .filter(|name| !name.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default();

    Ok(ParsedAuth {
        params: AuthParams {
            realm: values.get("realm").cloned(),
            id: required("id")?,
            nonce: required("nonce")?,
            version: required("version")?,
            headers,
        },
        signature: required("signature")?,
    })
}

/// Render the 2.0 `Authorization` header value for a computed signature.
///
/// Parameters are emitted in lexicographic order by name; the `headers`
/// parameter is omitted entirely when the list is empty.
#[must_use]
pub fn render_authorization_header(params: &AuthParams, signature: &str) -> String {
    let mut values: BTreeMap<&str, String> = BTreeMap::new();
    if !params.headers.is_empty() {
        values.insert("headers", params.headers.join(","));
    }
    values.insert("id", params.id.clone());
    values.insert("nonce", params.nonce.clone());
    if let Some(realm) = &params.realm {
        values.insert("realm", encode_param(realm));
    }
    values.insert("signature", signature.to_owned());
    values.insert("version", params.version.clone());

    let rendered = values
        .iter()
        .map(|(name, value)| format!("{name}=\"{value}\""))
        .collect::<Vec<_>>()
        .join(",");

    format!("{SCHEME} {rendered}")
}

/// Build the 2.0 string to sign from the request parts, body, and claimed
/// parameters.
///
/// # Errors
///
/// Returns [`AuthError::MissingRequiredHeader`] when the host cannot be
/// determined, the timestamp header is absent, a declared signed header is
/// not present on the request, or a body is present without its content
/// digest header. Unlike the legacy scheme, a declared-but-absent signed
/// header is an error, never a silently empty contribution.
pub fn build_string_to_sign(
    parts: &http::request::Parts,
    body: &[u8],
    params: &AuthParams,
) -> Result<String, AuthError> {
    let method = parts.method.as_str();
    let host = host_value(parts)?;
    let path = parts.uri.path();
    let path = path.strip_suffix('/').unwrap_or(path);
    let query = parts.uri.query().unwrap_or("");
    let timestamp = required_header(parts, TIMESTAMP_HEADER)?;

    let mut lines = vec![
        method.to_owned(),
        host,
        path.to_owned(),
        query.to_owned(),
        canonical_parameters(params),
    ];

    for name in &params.headers {
        let value = required_header(parts, name)?;
        lines.push(format!("{}:{value}", name.to_lowercase()));
    }

    lines.push(timestamp);

    if !body.is_empty() {
        let content_type = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        lines.push(content_type);
        lines.push(required_header(parts, CONTENT_HASH_HEADER)?);
    }

    Ok(lines.join("\n"))
}

/// Decode a 2.0 secret from its base64 form into raw HMAC key bytes.
///
/// # Errors
///
/// Returns [`AuthError::OutdatedKeypair`] when the secret is not valid
/// base64, which signals a legacy-issued key used against the 2.0 scheme.
pub fn decode_secret(secret: &str) -> Result<Vec<u8>, AuthError> {
    BASE64.decode(secret).map_err(|_| AuthError::OutdatedKeypair)
}

/// Compute a 2.0 signature: `Base64(HMAC-SHA256(key, data))`.
#[must_use]
pub fn compute_signature(key: &[u8], data: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept any key length");
    mac.update(data);
    BASE64.encode(mac.finalize().into_bytes())
}

/// Compute the `X-Authorization-Content-SHA256` value for a request body.
///
/// # Examples
///
/// ```
/// use http_hmac::v2::hash_body;
///
/// assert_eq!(
///     hash_body(br#"{"method":"hi.bob","params":["5","4","8"]}"#),
///     "6paRNxUA7WawFxJpRp4cEixDjHq3jfIKX072k9slalo="
/// );
/// ```
#[must_use]
pub fn hash_body(body: &[u8]) -> String {
    BASE64.encode(Sha256::digest(body))
}

/// Verify a 2.0-signed HTTP request.
///
/// Checks run in a fixed order so each failure axis surfaces independently:
/// parameter decoding, required header presence, credential resolution and
/// decoding, timestamp window, content digest, and finally the constant-time
/// signature comparison. A signature mismatch is only ever reported after
/// everything else passed.
///
/// # Errors
///
/// Returns the [`AuthError`] variant specific to the first failed check.
pub fn verify(
    parts: &http::request::Parts,
    body: &[u8],
    credential_provider: &dyn CredentialProvider,
    now: i64,
    tolerance: Duration,
    eligible_headers: Option<&[String]>,
) -> Result<AuthResult, AuthError> {
    let auth_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .ok_or(AuthError::InvalidAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let parsed = parse_authorization_header(auth_header)?;

    debug!(id = %parsed.params.id, nonce = %parsed.params.nonce, "Verifying 2.0 signature");

    if let Some(eligible) = eligible_headers {
        for name in &parsed.params.headers {
            if !eligible.iter().any(|e| e.eq_ignore_ascii_case(name)) {
                return Err(AuthError::InvalidAuthHeader);
            }
        }
    }

    let timestamp_raw = required_header(parts, TIMESTAMP_HEADER)?;
    // A body mandates the digest header; a digest declared without a body
    // is still validated (against the empty input) rather than ignored.
    let claimed_digest = if body.is_empty() {
        parts
            .headers
            .get(CONTENT_HASH_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
    } else {
        Some(required_header(parts, CONTENT_HASH_HEADER)?)
    };

    let secret = credential_provider.get_secret_key(&parsed.params.id)?;
    let key = decode_secret(&secret)?;

    let declared: i64 = timestamp_raw
        .parse()
        .map_err(|_| AuthError::InvalidRequiredHeader(TIMESTAMP_HEADER.to_owned()))?;
    check_timestamp_window(declared, now, tolerance)?;

    if let Some(claimed) = &claimed_digest {
        check_content_digest(claimed, body)?;
    }

    let string_to_sign = build_string_to_sign(parts, body, &parsed.params)?;

    debug!(string_to_sign = ?string_to_sign, "Built 2.0 string to sign");

    let expected = compute_signature(&key, string_to_sign.as_bytes());

    if parsed.signature.as_bytes().ct_eq(expected.as_bytes()).into() {
        debug!(id = %parsed.params.id, "2.0 verification succeeded");
        Ok(AuthResult {
            protocol: Protocol::V2,
            id: parsed.params.id,
            signed_headers: parsed.params.headers,
        })
    } else {
        debug!(provided = %parsed.signature, "2.0 signature mismatch");
        Err(AuthError::SignatureDoesNotMatch)
    }
}

/// Build the response string to sign: nonce, timestamp, and the raw
/// response body bytes, newline-separated.
#[must_use]
pub fn response_string_to_sign(nonce: &str, timestamp: &str, response_body: &[u8]) -> Vec<u8> {
    let mut data = format!("{nonce}\n{timestamp}\n").into_bytes();
    data.extend_from_slice(response_body);
    data
}

/// Sign a response to a verified 2.0 request.
///
/// The nonce is taken from the request's `Authorization` header and the
/// timestamp from its [`TIMESTAMP_HEADER`], binding the response signature
/// to the request instance it answers. The result belongs in the
/// [`RESPONSE_SIGNATURE_HEADER`] response header.
///
/// # Errors
///
/// Returns an [`AuthError`] if the request's `Authorization` header is
/// absent or malformed, the timestamp header is absent, or the secret does
/// not decode as base64.
pub fn sign_response(
    request_parts: &http::request::Parts,
    response_body: &[u8],
    secret: &str,
) -> Result<String, AuthError> {
    let auth_header = request_parts
        .headers
        .get(http::header::AUTHORIZATION)
        .ok_or(AuthError::InvalidAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;
    let parsed = parse_authorization_header(auth_header)?;

    let timestamp = required_header(request_parts, TIMESTAMP_HEADER)?;
    let key = decode_secret(secret)?;

    let data = response_string_to_sign(&parsed.params.nonce, &timestamp, response_body);
    Ok(compute_signature(&key, &data))
}

/// Verify a claimed response signature against the original request.
///
/// # Errors
///
/// Returns [`AuthError::SignatureDoesNotMatch`] when the recomputed
/// response signature disagrees with the claimed one, or any error from
/// [`sign_response`] when the inputs are malformed.
pub fn verify_response(
    request_parts: &http::request::Parts,
    response_body: &[u8],
    secret: &str,
    claimed_signature: &str,
) -> Result<(), AuthError> {
    let expected = sign_response(request_parts, response_body, secret)?;

    if claimed_signature.as_bytes().ct_eq(expected.as_bytes()).into() {
        Ok(())
    } else {
        debug!(provided = %claimed_signature, "Response signature mismatch");
        Err(AuthError::SignatureDoesNotMatch)
    }
}

/// Build the canonical parameters line: `k=v` pairs joined by `&`, keys in
/// lexicographic order, values percent-encoded. The `headers` list is not
/// part of this line; its values are folded in as their own lines.
fn canonical_parameters(params: &AuthParams) -> String {
    let mut values: BTreeMap<&str, String> = BTreeMap::new();
    values.insert("id", encode_param(&params.id));
    values.insert("nonce", encode_param(&params.nonce));
    if let Some(realm) = &params.realm {
        values.insert("realm", encode_param(realm));
    }
    values.insert("version", encode_param(&params.version));

    values
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode a parameter value with the RFC 3986 unreserved set.
fn encode_param(value: &str) -> String {
    utf8_percent_encode(value, PARAM_ENCODE_SET).to_string()
}

/// The request host: the `Host` header when present, otherwise the URI
/// authority. Includes the port when one was given.
fn host_value(parts: &http::request::Parts) -> Result<String, AuthError> {
    if let Some(host) = parts.headers.get(http::header::HOST) {
        return host
            .to_str()
            .map(ToOwned::to_owned)
            .map_err(|_| AuthError::MissingRequiredHeader("host".to_owned()));
    }
    parts
        .uri
        .authority()
        .map(|authority| authority.as_str().to_owned())
        .ok_or_else(|| AuthError::MissingRequiredHeader("host".to_owned()))
}

/// Extract a required header value, erroring when absent or not a string.
fn required_header(parts: &http::request::Parts, name: &str) -> Result<String, AuthError> {
    parts
        .headers
        .get(name)
        .ok_or_else(|| AuthError::MissingRequiredHeader(name.to_lowercase()))?
        .to_str()
        .map(ToOwned::to_owned)
        .map_err(|_| AuthError::InvalidRequiredHeader(name.to_lowercase()))
}
