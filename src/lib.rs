//! HMAC authentication for HTTP requests and responses.
//!
//! This crate implements a versioned shared-secret authentication protocol:
//! a client signs outgoing requests with an HMAC over a canonical rendering
//! of the message, a server verifies them, and the server can sign its
//! response so the client can check response integrity. Two protocol
//! generations are supported side by side and identified automatically from
//! the `Authorization` header:
//!
//! - the legacy scheme (`Acquia <id>:<signature>`, HMAC-SHA1 by default)
//! - the 2.0 scheme (`acquia-http-hmac name="value",…`, HMAC-SHA256 with a
//!   base64-encoded secret)
//!
//! # Usage
//!
//! ```rust
//! use http_hmac::credentials::{Credential, StaticCredentialProvider};
//! use http_hmac::registry::Protocol;
//! use http_hmac::sign::{SignParams, Signer};
//! use http_hmac::verify::Verifier;
//!
//! let credential = Credential::new(
//!     "efdde334-fe7b-11e4-a322-1697f925ec7b",
//!     "W5PeGMxSItNerkNFqQMfYiJvH14WzVJMy54CPoTAYoI=",
//! );
//!
//! // The 2.0 scheme requires a declared timestamp before signing.
//! let (mut parts, ()) = http::Request::builder()
//!     .method("GET")
//!     .uri("https://example.acquiapipet.net/v1.0/task-status/133?limit=10")
//!     .header("Host", "example.acquiapipet.net")
//!     .header("X-Authorization-Timestamp", "1432075982")
//!     .body(())
//!     .unwrap()
//!     .into_parts();
//!
//! let signed = Signer::new(Protocol::V2)
//!     .sign(&parts, b"", &credential, &SignParams::default())
//!     .unwrap();
//! parts.headers.insert(
//!     http::header::AUTHORIZATION,
//!     http::HeaderValue::from_str(&signed.header).unwrap(),
//! );
//!
//! // The verifying side resolves the secret through an injected store.
//! let provider = StaticCredentialProvider::new(vec![(
//!     "efdde334-fe7b-11e4-a322-1697f925ec7b".to_owned(),
//!     "W5PeGMxSItNerkNFqQMfYiJvH14WzVJMy54CPoTAYoI=".to_owned(),
//! )]);
//! let auth = Verifier::new()
//!     .verify_at(&parts, b"", &provider, 1_432_075_982)
//!     .unwrap();
//! assert_eq!(auth.id, "efdde334-fe7b-11e4-a322-1697f925ec7b");
//! ```
//!
//! # Modules
//!
//! - [`credentials`] - Credential provider trait and in-memory implementation
//! - [`error`] - Authentication error types
//! - [`registry`] - Protocol version identification and dispatch
//! - [`sign`] - Outbound request signing
//! - [`v1`] - Legacy scheme canonicalization, codec, and verification
//! - [`v2`] - 2.0 scheme canonicalization, codec, verification, and
//!   response signing
//! - [`validate`] - Timestamp window and content digest checks
//! - [`verify`] - Inbound request and response verification

pub mod credentials;
pub mod error;
pub mod registry;
pub mod sign;
pub mod v1;
pub mod v2;
pub mod validate;
pub mod verify;

pub use credentials::{Credential, CredentialProvider, StaticCredentialProvider};
pub use error::AuthError;
pub use registry::Protocol;
pub use sign::{SignParams, SignedRequest, Signer};
pub use verify::{AuthResult, Verifier};
