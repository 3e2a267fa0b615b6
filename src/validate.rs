//! Timestamp and content digest validation.
//!
//! The 2.0 scheme binds every signature to a declared request timestamp and,
//! when a body is present, to a SHA-256 digest of the body bytes. These
//! checks run before the signature comparison so each failure axis surfaces
//! as its own [`AuthError`] variant rather than a generic mismatch.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};

use crate::error::AuthError;
use crate::v2::CONTENT_HASH_HEADER;

/// Check a declared request timestamp against a reference clock.
///
/// Both values are seconds since the Unix epoch. Passes iff
/// `|now − declared| ≤ tolerance`.
///
/// An absent timestamp header must be reported by the caller as
/// [`AuthError::MissingRequiredHeader`] before this check runs; this
/// function only judges range.
///
/// # Errors
///
/// Returns [`AuthError::TimestampOutOfRange`] when the declared timestamp
/// falls outside the window on either side.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use http_hmac::validate::check_timestamp_window;
///
/// assert!(check_timestamp_window(1_432_075_982, 1_432_075_982, Duration::from_secs(900)).is_ok());
/// assert!(check_timestamp_window(1_432_075_982, 1_442_075_982, Duration::from_secs(900)).is_err());
/// ```
pub fn check_timestamp_window(declared: i64, now: i64, tolerance: Duration) -> Result<(), AuthError> {
    let skew = now.abs_diff(declared);
    if skew > tolerance.as_secs() {
        return Err(AuthError::TimestampOutOfRange);
    }
    Ok(())
}

/// Check a claimed content digest against the actual body bytes.
///
/// Recomputes `base64(SHA-256(body))` and compares it to the claimed value
/// on the encoded form. The comparison is byte-exact; a claimed digest in a
/// different encoding of the same hash does not pass.
///
/// # Errors
///
/// Returns [`AuthError::InvalidRequiredHeader`] when the recomputed digest
/// differs from the claimed one.
pub fn check_content_digest(claimed: &str, body: &[u8]) -> Result<(), AuthError> {
    let actual = BASE64.encode(Sha256::digest(body));
    if claimed.as_bytes() != actual.as_bytes() {
        return Err(AuthError::InvalidRequiredHeader(
            CONTENT_HASH_HEADER.to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(900);

    #[test]
    fn test_should_accept_timestamp_inside_window() {
        assert!(check_timestamp_window(1000, 1000, WINDOW).is_ok());
        assert!(check_timestamp_window(1000, 1900, WINDOW).is_ok());
        assert!(check_timestamp_window(1900, 1000, WINDOW).is_ok());
    }

    #[test]
    fn test_should_reject_timestamp_in_the_past() {
        let result = check_timestamp_window(1_432_075_982, 1_442_075_982, WINDOW);
        assert!(matches!(result, Err(AuthError::TimestampOutOfRange)));
    }

    #[test]
    fn test_should_reject_timestamp_in_the_future() {
        let result = check_timestamp_window(1_432_075_982, 1_422_075_982, WINDOW);
        assert!(matches!(result, Err(AuthError::TimestampOutOfRange)));
    }

    #[test]
    fn test_should_accept_matching_content_digest() {
        let body = br#"{"method":"hi.bob","params":["5","4","8"]}"#;
        assert!(check_content_digest("6paRNxUA7WawFxJpRp4cEixDjHq3jfIKX072k9slalo=", body).is_ok());
    }

    #[test]
    fn test_should_reject_mismatching_content_digest() {
        let result = check_content_digest("this is not a digest", b"test content");
        assert!(matches!(result, Err(AuthError::InvalidRequiredHeader(_))));
    }

    #[test]
    fn test_should_compare_encoded_form_not_decoded_bytes() {
        // Hex encoding of the correct hash must still fail.
        let body = b"test content";
        let hex_form = hex::encode(Sha256::digest(body));
        let result = check_content_digest(&hex_form, body);
        assert!(matches!(result, Err(AuthError::InvalidRequiredHeader(_))));
    }
}
