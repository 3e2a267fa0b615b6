//! Inbound request and response verification.
//!
//! [`Verifier`] is the orchestrating entry point for the receiving side: it
//! identifies which protocol generation produced an `Authorization` header
//! via [`Protocol::identify`], then dispatches to that version's
//! verification flow with the configured tolerances. Every call is a pure,
//! single-pass evaluation; no retries happen here.

use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::credentials::CredentialProvider;
use crate::error::AuthError;
use crate::registry::Protocol;
use crate::v1::{self, LegacyDigest};
use crate::v2;

/// The default tolerance for the declared request timestamp.
pub const DEFAULT_TIMESTAMP_TOLERANCE: Duration = Duration::from_secs(900);

/// The result of a successful verification.
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// The protocol generation that verified the request.
    pub protocol: Protocol,
    /// The verified key id.
    pub id: String,
    /// The extra header names that were folded into the signature.
    pub signed_headers: Vec<String>,
}

/// Verifies inbound requests against a credential store.
///
/// Holds only configuration; verification itself is stateless, so a single
/// `Verifier` may be shared freely across threads.
///
/// # Examples
///
/// ```
/// use http_hmac::credentials::StaticCredentialProvider;
/// use http_hmac::verify::Verifier;
///
/// let provider = StaticCredentialProvider::new(vec![(
///     "efdde334-fe7b-11e4-a322-1697f925ec7b".to_owned(),
///     "W5PeGMxSItNerkNFqQMfYiJvH14WzVJMy54CPoTAYoI=".to_owned(),
/// )]);
///
/// let (parts, ()) = http::Request::builder()
///     .method("GET")
///     .uri("https://example.acquiapipet.net/v1.0/task-status/133?limit=10")
///     .header("Host", "example.acquiapipet.net")
///     .header("X-Authorization-Timestamp", "1432075982")
///     .header(
///         http::header::AUTHORIZATION,
///         "acquia-http-hmac id=\"efdde334-fe7b-11e4-a322-1697f925ec7b\",\
///          nonce=\"d1954337-5319-4821-8427-115542e08d10\",\
///          realm=\"Pipet%20service\",\
///          signature=\"MRlPr/Z1WQY2sMthcaEqETRMw4gPYXlPcTpaLWS2gcc=\",\
///          version=\"2.0\"",
///     )
///     .body(())
///     .unwrap()
///     .into_parts();
///
/// let auth = Verifier::new()
///     .verify_at(&parts, b"", &provider, 1_432_075_982)
///     .unwrap();
/// assert_eq!(auth.id, "efdde334-fe7b-11e4-a322-1697f925ec7b");
/// ```
#[derive(Debug, Clone)]
pub struct Verifier {
    tolerance: Duration,
    legacy_digest: LegacyDigest,
    legacy_signed_headers: Vec<String>,
    eligible_headers: Option<Vec<String>>,
}

impl Default for Verifier {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TIMESTAMP_TOLERANCE,
            legacy_digest: LegacyDigest::default(),
            legacy_signed_headers: Vec::new(),
            eligible_headers: None,
        }
    }
}

impl Verifier {
    /// Create a verifier with default configuration: a 900 second timestamp
    /// window, HMAC-SHA1 for the legacy scheme, no legacy signed headers,
    /// and no restriction on 2.0 extra signed header names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timestamp tolerance window.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the HMAC digest used for legacy signatures.
    #[must_use]
    pub fn with_legacy_digest(mut self, digest: LegacyDigest) -> Self {
        self.legacy_digest = digest;
        self
    }

    /// Set the additional header names assumed signed on legacy requests.
    ///
    /// The legacy wire format does not carry the list, so the verifier must
    /// be configured with the same names the signer used.
    #[must_use]
    pub fn with_legacy_signed_headers(mut self, headers: Vec<String>) -> Self {
        self.legacy_signed_headers = headers;
        self
    }

    /// Restrict which header names a 2.0 request may declare as extra
    /// signed headers. `None` (the default) accepts any.
    #[must_use]
    pub fn with_eligible_headers(mut self, headers: Vec<String>) -> Self {
        self.eligible_headers = Some(headers);
        self
    }

    /// Verify an inbound request against the wall clock.
    ///
    /// # Errors
    ///
    /// See [`Verifier::verify_at`].
    pub fn verify(
        &self,
        parts: &http::request::Parts,
        body: &[u8],
        credential_provider: &dyn CredentialProvider,
    ) -> Result<AuthResult, AuthError> {
        self.verify_at(parts, body, credential_provider, Utc::now().timestamp())
    }

    /// Verify an inbound request against an explicit clock value, seconds
    /// since the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidAuthHeader`] when no registered protocol
    /// version recognizes the `Authorization` header, or the identified
    /// version's error for whichever validation axis failed first.
    pub fn verify_at(
        &self,
        parts: &http::request::Parts,
        body: &[u8],
        credential_provider: &dyn CredentialProvider,
        now: i64,
    ) -> Result<AuthResult, AuthError> {
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .ok_or(AuthError::InvalidAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let version = Protocol::identify(auth_header).ok_or(AuthError::InvalidAuthHeader)?;

        debug!(?version, "Identified protocol version");

        match version {
            Protocol::V1 => v1::verify(
                parts,
                body,
                credential_provider,
                self.legacy_digest,
                &self.legacy_signed_headers,
            ),
            Protocol::V2 => v2::verify(
                parts,
                body,
                credential_provider,
                now,
                self.tolerance,
                self.eligible_headers.as_deref(),
            ),
        }
    }

    /// Verify a claimed response signature against the original request.
    ///
    /// Resolves the credential from the request's claimed key id, then
    /// recomputes the response signature over the captured response body.
    /// Response signing is defined by the 2.0 scheme; a request signed with
    /// the legacy scheme fails with [`AuthError::InvalidAuthHeader`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SignatureDoesNotMatch`] when the recomputed
    /// signature disagrees with the claimed one, or the specific error for
    /// malformed inputs.
    pub fn verify_response(
        &self,
        request_parts: &http::request::Parts,
        response_body: &[u8],
        claimed_signature: &str,
        credential_provider: &dyn CredentialProvider,
    ) -> Result<(), AuthError> {
        let auth_header = request_parts
            .headers
            .get(http::header::AUTHORIZATION)
            .ok_or(AuthError::InvalidAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        let parsed = v2::parse_authorization_header(auth_header)?;
        let secret = credential_provider.get_secret_key(&parsed.params.id)?;

        v2::verify_response(request_parts, response_body, &secret, claimed_signature)
    }
}
