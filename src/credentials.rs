//! Credential provider trait and implementations.
//!
//! This module defines the [`CredentialProvider`] trait for resolving secret
//! keys from key ids, along with a [`StaticCredentialProvider`] for testing
//! and development use cases. The engine only ever reads credentials; it
//! never stores them.

use std::collections::HashMap;

use crate::error::AuthError;

/// A key id paired with its shared secret.
///
/// For the 2.0 scheme the secret must be base64-encoded key material; for
/// the legacy scheme the secret is used as opaque bytes.
#[derive(Debug, Clone)]
pub struct Credential {
    /// The opaque key id carried in the `Authorization` header.
    pub id: String,
    /// The shared secret associated with the id.
    pub secret: String,
}

impl Credential {
    /// Create a credential from a key id and its secret.
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }
}

/// Trait for looking up secret keys by key id.
///
/// Implementations may back this with a database, configuration file, or any
/// other credential store. Verification may run from many threads at once,
/// so implementations must tolerate concurrent lookups.
pub trait CredentialProvider: Send + Sync {
    /// Retrieve the secret key for the given key id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyNotFound`] if the key id is not recognized.
    fn get_secret_key(&self, id: &str) -> Result<String, AuthError>;
}

/// A simple in-memory credential provider backed by a `HashMap`.
///
/// Suitable for testing and development environments. For production use,
/// implement [`CredentialProvider`] with a secure credential store.
///
/// # Examples
///
/// ```
/// use http_hmac::credentials::{CredentialProvider, StaticCredentialProvider};
///
/// let provider = StaticCredentialProvider::new(vec![
///     ("efdde334-fe7b-11e4-a322-1697f925ec7b".to_owned(), "secret-key".to_owned()),
/// ]);
///
/// let secret = provider.get_secret_key("efdde334-fe7b-11e4-a322-1697f925ec7b").unwrap();
/// assert_eq!(secret, "secret-key");
/// ```
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: HashMap<String, String>,
}

impl StaticCredentialProvider {
    /// Create a new `StaticCredentialProvider` from an iterable of
    /// (key id, secret) pairs.
    pub fn new(credentials: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            credentials: credentials.into_iter().collect(),
        }
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn get_secret_key(&self, id: &str) -> Result<String, AuthError> {
        self.credentials
            .get(id)
            .cloned()
            .ok_or_else(|| AuthError::KeyNotFound(id.to_owned()))
    }
}
