//! Error types for HMAC request and response authentication.
//!
//! All failures are represented by [`AuthError`], which provides one variant
//! per distinguishable failure mode so callers can react to each axis
//! independently. A signature mismatch is never reported as any other
//! variant; it only occurs after every structural and temporal check passed.

/// Errors that can occur while signing or verifying an HTTP message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The `Authorization` header is absent, malformed, or uses a scheme
    /// token no registered protocol version recognizes.
    #[error("Authorization header is missing, malformed, or uses an unrecognized scheme")]
    InvalidAuthHeader,

    /// A header the protocol version mandates (timestamp, content digest,
    /// or a declared signed header) is absent from the request.
    #[error("Missing required header: {0}")]
    MissingRequiredHeader(String),

    /// A required header is present but fails content validation, such as
    /// a content digest that does not match the body or an unparseable
    /// timestamp value.
    #[error("Invalid required header: {0}")]
    InvalidRequiredHeader(String),

    /// The declared request timestamp falls outside the verifier's
    /// configured tolerance window.
    #[error("Request timestamp is outside the accepted window")]
    TimestampOutOfRange,

    /// The credential secret does not satisfy the encoding the protocol
    /// version requires (not valid base64 for the 2.0 scheme), which
    /// signals a key issued for the legacy scheme being used against the
    /// current one.
    #[error("Secret key is not valid for this protocol version")]
    OutdatedKeypair,

    /// The claimed key id was not found in the credential store.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// The recomputed signature does not match the claimed signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,
}
