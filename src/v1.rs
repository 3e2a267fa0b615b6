//! Legacy scheme signing and verification.
//!
//! The legacy `Authorization` header has the format:
//!
//! ```text
//! Acquia <id>:<base64-signature>
//! ```
//!
//! Where `Signature = Base64(HMAC(SecretKey, StringToSign))` and:
//!
//! ```text
//! StringToSign = HTTP-Verb + "\n" +
//!                MD5-Hex(Body) + "\n" +
//!                Content-Type + "\n" +
//!                Date + "\n" +
//!                Custom-Headers + "\n" +
//!                Path-And-Query
//! ```
//!
//! The secret is used as opaque bytes; the HMAC digest is selectable via
//! [`LegacyDigest`] (SHA-1 by default). Absent `Content-Type` or `Date`
//! headers contribute empty strings, never omitted lines. `Custom-Headers`
//! is one `lowercase-name: value` line per caller-listed header name, in
//! list order; the wire header does not carry the list, so a verifier must
//! be configured with the same names the signer used.
//!
//! This canonicalization is deliberately independent from the 2.0 one in
//! [`crate::v2`]; the two schemes share no formatting code.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use digest::Digest;
use digest::KeyInit;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::credentials::CredentialProvider;
use crate::error::AuthError;
use crate::registry::Protocol;
use crate::verify::AuthResult;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// The scheme token that opens a legacy `Authorization` header.
pub const SCHEME: &str = "Acquia";

/// The HMAC digest used for legacy signatures.
///
/// The legacy wire format does not name its digest, so deployments agree on
/// one out of band. SHA-1 is the historical default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LegacyDigest {
    /// HMAC-SHA1 (the default).
    #[default]
    Sha1,
    /// HMAC-SHA256.
    Sha256,
}

/// Parsed components of a legacy `Authorization` header.
#[derive(Debug, Clone)]
pub struct ParsedLegacyAuth {
    /// The key id preceding the colon.
    pub id: String,
    /// The base64-encoded signature following the colon.
    pub signature: String,
}

/// Parse a legacy `Authorization` header: `Acquia <id>:<signature>`.
///
/// # Errors
///
/// Returns [`AuthError::InvalidAuthHeader`] if the scheme token does not
/// match or either component is empty.
pub fn parse_authorization_header(header: &str) -> Result<ParsedLegacyAuth, AuthError> {
    let rest = header
        .strip_prefix(SCHEME)
        .and_then(|r| r.strip_prefix(' '))
        .ok_or(AuthError::InvalidAuthHeader)?;

    let (id, signature) = rest.split_once(':').ok_or(AuthError::InvalidAuthHeader)?;

    if id.is_empty() || signature.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(ParsedLegacyAuth {
        id: id.to_owned(),
        signature: signature.to_owned(),
    })
}

/// Render the legacy `Authorization` header value for a computed signature.
#[must_use]
pub fn render_authorization_header(id: &str, signature: &str) -> String {
    format!("{SCHEME} {id}:{signature}")
}

/// Build the legacy string to sign from the request parts and body.
///
/// `signed_headers` lists the additional header names to fold into the
/// canonical string, in the order the caller declared them. A listed header
/// absent from the request contributes an empty value rather than an error;
/// the legacy scheme is lenient where the 2.0 scheme is strict.
#[must_use]
pub fn build_string_to_sign(
    parts: &http::request::Parts,
    body: &[u8],
    signed_headers: &[String],
) -> String {
    let method = parts.method.as_str();
    let body_hash = hex::encode(Md5::digest(body));
    let content_type = header_value(parts, "content-type");
    let date = header_value(parts, "date");
    let custom = build_custom_headers(parts, signed_headers);
    let resource = path_and_query(parts);

    format!("{method}\n{body_hash}\n{content_type}\n{date}\n{custom}\n{resource}")
}

/// Compute a legacy signature: `Base64(HMAC(secret, string_to_sign))`.
#[must_use]
pub fn compute_signature(secret: &str, string_to_sign: &str, digest: LegacyDigest) -> String {
    let raw = match digest {
        LegacyDigest::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
                .expect("HMAC can accept any key length");
            mac.update(string_to_sign.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
        LegacyDigest::Sha256 => {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .expect("HMAC can accept any key length");
            mac.update(string_to_sign.as_bytes());
            mac.finalize().into_bytes().to_vec()
        }
    };
    BASE64.encode(raw)
}

/// Verify a legacy-signed HTTP request.
///
/// The legacy scheme mandates no timestamp or content digest headers, so
/// verification is: parse the header, resolve the secret, rebuild the
/// canonical string, and compare signatures in constant time.
///
/// # Errors
///
/// Returns an [`AuthError`] if the header is malformed, the key id is not
/// found, or the signature does not match.
pub fn verify(
    parts: &http::request::Parts,
    body: &[u8],
    credential_provider: &dyn CredentialProvider,
    digest: LegacyDigest,
    signed_headers: &[String],
) -> Result<AuthResult, AuthError> {
    let auth_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .ok_or(AuthError::InvalidAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let parsed = parse_authorization_header(auth_header)?;

    debug!(id = %parsed.id, "Verifying legacy signature");

    let secret = credential_provider.get_secret_key(&parsed.id)?;

    let string_to_sign = build_string_to_sign(parts, body, signed_headers);

    debug!(string_to_sign = ?string_to_sign, "Built legacy string to sign");

    let expected = compute_signature(&secret, &string_to_sign, digest);

    if parsed.signature.as_bytes().ct_eq(expected.as_bytes()).into() {
        debug!(id = %parsed.id, "Legacy verification succeeded");
        Ok(AuthResult {
            protocol: Protocol::V1,
            id: parsed.id,
            signed_headers: signed_headers.to_vec(),
        })
    } else {
        debug!(provided = %parsed.signature, "Legacy signature mismatch");
        Err(AuthError::SignatureDoesNotMatch)
    }
}

/// Build the custom headers block: one `lowercase-name: value` line per
/// listed name, in list order. Empty list contributes an empty string.
fn build_custom_headers(parts: &http::request::Parts, signed_headers: &[String]) -> String {
    signed_headers
        .iter()
        .map(|name| format!("{}: {}", name.to_lowercase(), header_value(parts, name)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The request path plus `?query` when a query string is present.
fn path_and_query(parts: &http::request::Parts) -> String {
    let path = parts.uri.path();
    match parts.uri.query() {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path.to_owned(),
    }
}

/// Extract a header value as a string, returning empty string if missing.
fn header_value(parts: &http::request::Parts, name: &str) -> String {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredentialProvider;

    const TEST_ID: &str = "efdde334-fe7b-11e4-a322-1697f925ec7b";
    const TEST_SECRET: &str = "secret-key";

    fn test_credential_provider() -> StaticCredentialProvider {
        StaticCredentialProvider::new(vec![(TEST_ID.to_owned(), TEST_SECRET.to_owned())])
    }

    fn get_request() -> http::request::Parts {
        let (parts, ()) = http::Request::builder()
            .method("GET")
            .uri("http://example.com/resource/1?key=value")
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    fn post_request() -> http::request::Parts {
        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("http://example.com/resource/1?key=value")
            .header("Content-Type", "text/plain")
            .header("Date", "Fri, 19 Mar 1982 00:00:04 GMT")
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_should_parse_legacy_header() {
        let parsed = parse_authorization_header("Acquia mykey:bXlzaWc=").unwrap();
        assert_eq!(parsed.id, "mykey");
        assert_eq!(parsed.signature, "bXlzaWc=");
    }

    #[test]
    fn test_should_reject_malformed_legacy_header() {
        assert!(parse_authorization_header("Acquia :sig").is_err());
        assert!(parse_authorization_header("Acquia key:").is_err());
        assert!(parse_authorization_header("Acquia noseparator").is_err());
        assert!(parse_authorization_header("Bearer key:sig").is_err());
    }

    #[test]
    fn test_should_build_string_to_sign_for_bodyless_get() {
        let parts = get_request();
        let result = build_string_to_sign(&parts, b"", &[]);
        // MD5 of the empty input fills the digest slot when there is no body.
        let expected = "GET\n\
                        d41d8cd98f00b204e9800998ecf8427e\n\
                        \n\
                        \n\
                        \n\
                        /resource/1?key=value";
        assert_eq!(result, expected);
    }

    #[test]
    fn test_should_sign_get_request_matching_known_signature() {
        let parts = get_request();
        let string_to_sign = build_string_to_sign(&parts, b"", &[]);
        let signature = compute_signature(TEST_SECRET, &string_to_sign, LegacyDigest::Sha1);
        assert_eq!(signature, "7Tq3+JP3lAu4FoJz81XEx5+qfOc=");
        assert_eq!(
            render_authorization_header(TEST_ID, &signature),
            "Acquia efdde334-fe7b-11e4-a322-1697f925ec7b:7Tq3+JP3lAu4FoJz81XEx5+qfOc="
        );
    }

    #[test]
    fn test_should_sign_post_request_matching_known_signature() {
        let parts = post_request();
        let string_to_sign = build_string_to_sign(&parts, b"test content", &[]);
        let signature = compute_signature(TEST_SECRET, &string_to_sign, LegacyDigest::Sha1);
        assert_eq!(signature, "6DQcBYwaKdhRm/eNBKIN2jM8HF8=");
    }

    #[test]
    fn test_should_fold_custom_headers_in_declared_order() {
        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("http://example.com/resource/1?key=value")
            .header("Content-Type", "text/plain")
            .header("Date", "Fri, 19 Mar 1982 00:00:04 GMT")
            .header("Custom1", "Value1")
            .body(())
            .unwrap()
            .into_parts();

        let string_to_sign =
            build_string_to_sign(&parts, b"test content", &["Custom1".to_owned()]);
        assert!(string_to_sign.contains("\ncustom1: Value1\n"));

        let signature = compute_signature(TEST_SECRET, &string_to_sign, LegacyDigest::Sha1);
        assert_eq!(signature, "QRMtvnGmlP1YbaTwpWyB/6A8dRU=");
    }

    #[test]
    fn test_should_verify_legacy_roundtrip() {
        let provider = test_credential_provider();

        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("http://example.com/resource/1?key=value")
            .header("Content-Type", "text/plain")
            .header("Date", "Fri, 19 Mar 1982 00:00:04 GMT")
            .header(
                http::header::AUTHORIZATION,
                "Acquia efdde334-fe7b-11e4-a322-1697f925ec7b:6DQcBYwaKdhRm/eNBKIN2jM8HF8=",
            )
            .body(())
            .unwrap()
            .into_parts();

        let result = verify(&parts, b"test content", &provider, LegacyDigest::Sha1, &[]);
        assert!(result.is_ok(), "legacy verify failed: {result:?}");
        assert_eq!(result.unwrap().id, TEST_ID);
    }

    #[test]
    fn test_should_reject_tampered_body_as_signature_mismatch() {
        let provider = test_credential_provider();

        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("http://example.com/resource/1?key=value")
            .header("Content-Type", "text/plain")
            .header("Date", "Fri, 19 Mar 1982 00:00:04 GMT")
            .header(
                http::header::AUTHORIZATION,
                "Acquia efdde334-fe7b-11e4-a322-1697f925ec7b:6DQcBYwaKdhRm/eNBKIN2jM8HF8=",
            )
            .body(())
            .unwrap()
            .into_parts();

        let result = verify(&parts, b"tampered body", &provider, LegacyDigest::Sha1, &[]);
        assert!(matches!(result, Err(AuthError::SignatureDoesNotMatch)));
    }

    #[test]
    fn test_should_reject_unknown_id() {
        let provider = StaticCredentialProvider::new(vec![]);
        let mut parts = post_request();
        parts.headers.insert(
            http::header::AUTHORIZATION,
            http::HeaderValue::from_static("Acquia nobody:c2ln"),
        );

        let result = verify(&parts, b"test content", &provider, LegacyDigest::Sha1, &[]);
        assert!(matches!(result, Err(AuthError::KeyNotFound(_))));
    }
}
