//! Outbound request signing.
//!
//! [`Signer`] produces a ready-to-attach `Authorization` header value for a
//! chosen protocol generation: it builds the version's canonical string,
//! computes the keyed hash, and renders the header through the version's
//! codec. The message itself is never mutated; attaching the header (and,
//! for the 2.0 scheme, the timestamp and content digest headers the caller
//! must set before signing) is the caller's job.

use tracing::debug;
use uuid::Uuid;

use crate::credentials::Credential;
use crate::error::AuthError;
use crate::registry::Protocol;
use crate::v1::{self, LegacyDigest};
use crate::v2;

/// A computed request signature and its rendered `Authorization` header.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// The base64-encoded signature.
    pub signature: String,
    /// The full `Authorization` header value carrying the signature.
    pub header: String,
}

/// Caller-chosen signing parameters.
///
/// `realm` and `nonce` apply to the 2.0 scheme only; a missing nonce is
/// generated. `headers` lists the extra header names to fold into the
/// signature for either scheme, in the order they should be canonicalized.
#[derive(Debug, Clone, Default)]
pub struct SignParams {
    /// The provider realm, e.g. a service name.
    pub realm: Option<String>,
    /// The per-request nonce; generated when `None`.
    pub nonce: Option<String>,
    /// Extra header names to fold into the signature.
    pub headers: Vec<String>,
}

/// Signs outbound requests for one protocol generation.
///
/// # Examples
///
/// ```
/// use http_hmac::credentials::Credential;
/// use http_hmac::registry::Protocol;
/// use http_hmac::sign::{SignParams, Signer};
///
/// let credential = Credential::new("efdde334-fe7b-11e4-a322-1697f925ec7b", "secret-key");
///
/// let (parts, ()) = http::Request::builder()
///     .method("GET")
///     .uri("http://example.com/resource/1?key=value")
///     .body(())
///     .unwrap()
///     .into_parts();
///
/// let signed = Signer::new(Protocol::V1)
///     .sign(&parts, b"", &credential, &SignParams::default())
///     .unwrap();
/// assert_eq!(
///     signed.header,
///     "Acquia efdde334-fe7b-11e4-a322-1697f925ec7b:7Tq3+JP3lAu4FoJz81XEx5+qfOc="
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Signer {
    protocol: Protocol,
    legacy_digest: LegacyDigest,
}

impl Signer {
    /// Create a signer for the given protocol generation.
    #[must_use]
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            legacy_digest: LegacyDigest::default(),
        }
    }

    /// Set the HMAC digest used for legacy signatures.
    #[must_use]
    pub fn with_legacy_digest(mut self, digest: LegacyDigest) -> Self {
        self.legacy_digest = digest;
        self
    }

    /// Sign an outbound request and render its `Authorization` header.
    ///
    /// For the 2.0 scheme the request must already carry its timestamp
    /// header and, when a body is present, its content digest header
    /// (see [`v2::hash_body`]); the canonical string folds both in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingRequiredHeader`] when the 2.0 scheme's
    /// mandated headers are absent, or [`AuthError::OutdatedKeypair`] when
    /// the secret is not valid base64 for the 2.0 scheme.
    pub fn sign(
        &self,
        parts: &http::request::Parts,
        body: &[u8],
        credential: &Credential,
        params: &SignParams,
    ) -> Result<SignedRequest, AuthError> {
        match self.protocol {
            Protocol::V1 => {
                let string_to_sign = v1::build_string_to_sign(parts, body, &params.headers);
                debug!(string_to_sign = ?string_to_sign, "Signing legacy request");
                let signature =
                    v1::compute_signature(&credential.secret, &string_to_sign, self.legacy_digest);
                let header = v1::render_authorization_header(&credential.id, &signature);
                Ok(SignedRequest { signature, header })
            }
            Protocol::V2 => {
                let auth_params = v2::AuthParams {
                    realm: params.realm.clone(),
                    id: credential.id.clone(),
                    nonce: params
                        .nonce
                        .clone()
                        .unwrap_or_else(|| Uuid::new_v4().to_string()),
                    version: v2::VERSION.to_owned(),
                    headers: params.headers.clone(),
                };
                let key = v2::decode_secret(&credential.secret)?;
                let string_to_sign = v2::build_string_to_sign(parts, body, &auth_params)?;
                debug!(string_to_sign = ?string_to_sign, "Signing 2.0 request");
                let signature = v2::compute_signature(&key, string_to_sign.as_bytes());
                let header = v2::render_authorization_header(&auth_params, &signature);
                Ok(SignedRequest { signature, header })
            }
        }
    }

    /// Sign a response to a previously signed request.
    ///
    /// Response signing is defined by the 2.0 scheme: the nonce and
    /// timestamp of the original request bind the response to the request
    /// instance it answers. A legacy signer, or a request carrying a legacy
    /// `Authorization` header, fails with [`AuthError::InvalidAuthHeader`].
    ///
    /// # Errors
    ///
    /// See [`v2::sign_response`].
    pub fn sign_response(
        &self,
        request_parts: &http::request::Parts,
        response_body: &[u8],
        secret: &str,
    ) -> Result<String, AuthError> {
        match self.protocol {
            Protocol::V1 => Err(AuthError::InvalidAuthHeader),
            Protocol::V2 => v2::sign_response(request_parts, response_body, secret),
        }
    }
}
