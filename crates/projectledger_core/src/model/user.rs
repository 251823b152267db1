//! User record and the request-scoped principal.
//!
//! # Invariants
//! - Emails are stored trimmed and lowercased; uniqueness is case-insensitive.
//! - Only password hashes are stored. Hashing happens outside this crate.
//! - The authenticated user travels as an explicit [`Principal`] value; there
//!   is no process-wide "current user".

use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: i64,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: normalize_email(&email.into()),
            password_hash: password_hash.into(),
            created_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::BlankName("username"));
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        if self.password_hash.is_empty() {
            return Err(ValidationError::MissingPasswordHash);
        }
        Ok(())
    }
}

/// Canonical storage form of an email address.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Authenticated caller of one request.
///
/// Built by the transport layer after token verification and passed into
/// every tenant-scoped service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal {
    user_id: UserId,
}

impl Principal {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, User};
    use crate::model::ValidationError;

    #[test]
    fn new_user_normalizes_email() {
        let user = User::new("ana", "  Ana@Example.COM ", "hash");
        assert_eq!(user.email, "ana@example.com");
        assert!(user.validate().is_ok());
    }

    #[test]
    fn validate_rejects_malformed_email_and_empty_hash() {
        let user = User::new("ana", "not-an-email", "hash");
        assert!(matches!(
            user.validate(),
            Err(ValidationError::InvalidEmail(_))
        ));

        let user = User::new("ana", "ana@example.com", "");
        assert_eq!(user.validate(), Err(ValidationError::MissingPasswordHash));
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" X@Y.Io "), "x@y.io");
    }
}
