//! Validated email address.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Reasons an email address is rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailAddressError {
    #[error("email address is empty")]
    Empty,
    #[error("email address exceeds {max} characters")]
    TooLong { max: usize },
    #[error("email address must contain exactly one '@'")]
    BadSeparator,
    #[error("email address is missing the part before '@'")]
    MissingMailbox,
    #[error("email address is missing a domain")]
    MissingDomain,
    #[error("email address contains whitespace")]
    Whitespace,
}

/// An email address that passed structural validation.
///
/// Surrounding whitespace is trimmed and the domain is lower-cased; the
/// mailbox part is kept as written. Deserialization runs the same checks, so
/// API payloads cannot smuggle in malformed addresses.
///
/// ```
/// use round_again_core::EmailAddress;
///
/// let email = EmailAddress::parse("  Ann@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "Ann@example.com");
/// assert!(EmailAddress::parse("no-at-sign").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// RFC 5321 path length limit.
    pub const MAX_LENGTH: usize = 254;

    /// Validate and normalize an address.
    ///
    /// # Errors
    ///
    /// Returns [`EmailAddressError`] describing the first structural problem
    /// found.
    pub fn parse(input: &str) -> Result<Self, EmailAddressError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EmailAddressError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailAddressError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(EmailAddressError::Whitespace);
        }

        let mut parts = trimmed.split('@');
        let (Some(mailbox), Some(domain), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(EmailAddressError::BadSeparator);
        };
        if mailbox.is_empty() {
            return Err(EmailAddressError::MissingMailbox);
        }
        if domain.is_empty() {
            return Err(EmailAddressError::MissingDomain);
        }

        Ok(Self(format!("{mailbox}@{}", domain.to_ascii_lowercase())))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EmailAddress {
    type Err = EmailAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for EmailAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_shapes() {
        for raw in [
            "john.smith@example.com",
            "emily.j+news@example.co.uk",
            "a@b",
        ] {
            assert!(EmailAddress::parse(raw).is_ok(), "{raw} should parse");
        }
    }

    #[test]
    fn test_normalizes_domain_and_whitespace() {
        let email = EmailAddress::parse("\tMChen@Example.com\n").unwrap();
        assert_eq!(email.as_str(), "MChen@example.com");
    }

    #[test]
    fn test_rejections() {
        assert_eq!(EmailAddress::parse("   "), Err(EmailAddressError::Empty));
        assert_eq!(
            EmailAddress::parse("plainaddress"),
            Err(EmailAddressError::BadSeparator)
        );
        assert_eq!(
            EmailAddress::parse("a@b@c"),
            Err(EmailAddressError::BadSeparator)
        );
        assert_eq!(
            EmailAddress::parse("@example.com"),
            Err(EmailAddressError::MissingMailbox)
        );
        assert_eq!(
            EmailAddress::parse("user@"),
            Err(EmailAddressError::MissingDomain)
        );
        assert_eq!(
            EmailAddress::parse("first last@example.com"),
            Err(EmailAddressError::Whitespace)
        );
    }

    #[test]
    fn test_rejects_overlong() {
        let long = format!("{}@example.com", "x".repeat(EmailAddress::MAX_LENGTH));
        assert!(matches!(
            EmailAddress::parse(&long),
            Err(EmailAddressError::TooLong { .. })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: EmailAddress = serde_json::from_str("\"ann@example.com\"").unwrap();
        assert_eq!(ok.to_string(), "ann@example.com");

        let bad = serde_json::from_str::<EmailAddress>("\"not an email\"");
        assert!(bad.is_err());
    }
}
