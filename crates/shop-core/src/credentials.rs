//! # Credentials
//!
//! Shared credential schema for sign-in and account creation.
//! Both surfaces reject the same malformed input identically, before any
//! store or network call.

use crate::error::{FieldError, ShopError, ShopResult};
use serde::{Deserialize, Serialize};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur when parsing an [`Email`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    /// The input does not contain an @ symbol.
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    /// The local part (before @) is empty.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// The domain part (after @) is empty.
    #[error("email domain cannot be empty")]
    EmptyDomain,
}

/// A syntactically valid email address.
///
/// Structural checks only: length within the RFC 5321 limit, exactly one
/// non-terminal @ separating a non-empty local part and domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from a string.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let at_pos = s.find('@').ok_or(EmailError::MissingAtSymbol)?;

        if at_pos == 0 {
            return Err(EmailError::EmptyLocalPart);
        }

        if at_pos == s.len() - 1 {
            return Err(EmailError::EmptyDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transient email/password pair. Validated before being handed to the
/// identity store; never persisted by this layer.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Check both fields against the shared schema.
    ///
    /// Collects every field failure rather than stopping at the first, so
    /// the caller can render per-field messages. Returns the parsed email
    /// for valid input.
    pub fn validate(&self) -> ShopResult<Email> {
        let mut fields = Vec::new();

        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(err) => {
                fields.push(FieldError::new("email", err.to_string()));
                None
            }
        };

        if self.password.len() < MIN_PASSWORD_LENGTH {
            fields.push(FieldError::new(
                "password",
                format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
            ));
        }

        match (email, fields.is_empty()) {
            (Some(email), true) => Ok(email),
            _ => Err(ShopError::Validation { fields }),
        }
    }
}

/// Resolved per-request identity.
///
/// Threaded explicitly as a parameter into every operation that requires
/// authentication; callers reject with `Unauthenticated` when absent.
/// There is no global or thread-local session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub email: Email,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>, email: Email) -> Self {
        Self {
            user_id: user_id.into(),
            email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_parse() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("user.name+tag@domain.co.uk").is_ok());

        assert!(matches!(Email::parse(""), Err(EmailError::Empty)));
        assert!(matches!(
            Email::parse("no-at-symbol"),
            Err(EmailError::MissingAtSymbol)
        ));
        assert!(matches!(
            Email::parse("@domain.com"),
            Err(EmailError::EmptyLocalPart)
        ));
        assert!(matches!(Email::parse("user@"), Err(EmailError::EmptyDomain)));
    }

    #[test]
    fn test_valid_credentials() {
        let creds = Credentials::new("user@example.com", "hunter2hunter2");
        let email = creds.validate().unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn test_both_fields_reported() {
        let creds = Credentials::new("not-an-email", "x");

        let err = creds.validate().unwrap_err();
        let ShopError::Validation { fields } = err else {
            panic!("expected validation error");
        };

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field, "email");
        assert_eq!(fields[1].field, "password");
        assert!(fields[1].message.contains("at least 8"));
    }

    #[test]
    fn test_short_password_only() {
        let creds = Credentials::new("user@example.com", "short");

        let err = creds.validate().unwrap_err();
        let ShopError::Validation { fields } = err else {
            panic!("expected validation error");
        };

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field, "password");
    }
}
