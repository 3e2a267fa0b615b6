//! Protocol version registry and identification.
//!
//! Each supported protocol generation is a [`Protocol`] variant; the
//! registered set is a fixed-order list consulted when classifying an
//! inbound `Authorization` header. Adding a generation means adding a
//! variant and a registry entry, never touching the existing ones.

use crate::{v1, v2};

/// A supported protocol generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// The legacy scheme (`Acquia <id>:<signature>`).
    V1,
    /// The 2.0 scheme (`acquia-http-hmac name="value",…`).
    V2,
}

impl Protocol {
    /// Registered versions, in the order identification consults them.
    pub const REGISTERED: [Protocol; 2] = [Protocol::V2, Protocol::V1];

    /// The scheme token this version puts at the front of its
    /// `Authorization` header.
    #[must_use]
    pub fn scheme(self) -> &'static str {
        match self {
            Protocol::V1 => v1::SCHEME,
            Protocol::V2 => v2::SCHEME,
        }
    }

    /// Whether the header plausibly belongs to this version, judged by the
    /// scheme token alone. A full structural check happens later, when the
    /// version's codec decodes the parameters.
    #[must_use]
    pub fn matches(self, auth_header: &str) -> bool {
        auth_header
            .strip_prefix(self.scheme())
            .is_some_and(|rest| rest.starts_with(' '))
    }

    /// Identify which registered version produced the given header, if any.
    ///
    /// Foreign schemes (OAuth, Bearer, …) return `None`; identification
    /// never fails with an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_hmac::registry::Protocol;
    ///
    /// assert_eq!(Protocol::identify("Acquia key:sig"), Some(Protocol::V1));
    /// assert_eq!(
    ///     Protocol::identify("acquia-http-hmac id=\"key\",nonce=\"n\""),
    ///     Some(Protocol::V2)
    /// );
    /// assert_eq!(Protocol::identify("Bearer token"), None);
    /// ```
    #[must_use]
    pub fn identify(auth_header: &str) -> Option<Protocol> {
        Self::REGISTERED
            .into_iter()
            .find(|version| version.matches(auth_header))
    }
}
