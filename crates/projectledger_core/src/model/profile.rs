//! Public user profile: bio, role and social handles.
//!
//! One row per user, keyed by the user id. A user without a stored row has
//! the empty profile.

use super::user::UserId;
use super::ValidationError;
use serde::{Deserialize, Serialize};

pub const MAX_BIO_CHARS: usize = 500;
pub const MAX_PROFILE_FIELD_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub bio: String,
    pub role: String,
    pub facebook: String,
    pub instagram: String,
    pub linkedin: String,
    pub twitter: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Profile {
    /// Profile with every text field blank.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            bio: String::new(),
            role: String::new(),
            facebook: String::new(),
            instagram: String::new(),
            linkedin: String::new(),
            twitter: String::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_len("bio", &self.bio, MAX_BIO_CHARS)?;
        for (field, value) in [
            ("role", &self.role),
            ("facebook", &self.facebook),
            ("instagram", &self.instagram),
            ("linkedin", &self.linkedin),
            ("twitter", &self.twitter),
        ] {
            check_len(field, value, MAX_PROFILE_FIELD_CHARS)?;
        }
        Ok(())
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TextTooLong { field, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Profile, MAX_BIO_CHARS, MAX_PROFILE_FIELD_CHARS};
    use crate::model::ValidationError;
    use uuid::Uuid;

    #[test]
    fn empty_profile_is_valid() {
        assert!(Profile::empty(Uuid::new_v4()).validate().is_ok());
    }

    #[test]
    fn oversized_fields_are_rejected() {
        let mut profile = Profile::empty(Uuid::new_v4());
        profile.bio = "b".repeat(MAX_BIO_CHARS);
        assert!(profile.validate().is_ok());

        profile.bio.push('!');
        assert_eq!(
            profile.validate(),
            Err(ValidationError::TextTooLong {
                field: "bio",
                max: MAX_BIO_CHARS
            })
        );

        profile.bio.clear();
        profile.twitter = "t".repeat(MAX_PROFILE_FIELD_CHARS + 1);
        assert!(matches!(
            profile.validate(),
            Err(ValidationError::TextTooLong {
                field: "twitter",
                ..
            })
        ));
    }
}
