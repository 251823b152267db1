//! User registration, principal resolution and profiles.
//!
//! # Invariants
//! - Emails are compared in normalized form.
//! - A [`Principal`] is only issued for a user that exists.
//! - A principal can only write its own profile.

use crate::model::profile::Profile;
use crate::model::user::{Principal, User, UserId};
use crate::repo::user_repo::UserRepository;
use crate::repo::{EntityRef, RepoError, RepoResult};
use serde::Deserialize;

/// Registration input. The password arrives already hashed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Replacement profile fields. Omitted fields are cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProfileChanges {
    pub bio: String,
    pub role: String,
    pub facebook: String,
    pub instagram: String,
    pub linkedin: String,
    pub twitter: String,
}

pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a user, rejecting a duplicate email with `EmailTaken`.
    pub fn register(&self, request: NewUser) -> RepoResult<User> {
        let user = User::new(
            request.username.trim(),
            request.email,
            request.password_hash,
        );
        if self.repo.find_by_email(&user.email)?.is_some() {
            return Err(RepoError::EmailTaken(user.email));
        }
        self.repo.register_user(&user)
    }

    pub fn get(&self, id: UserId) -> RepoResult<User> {
        self.repo
            .get_user(id)?
            .ok_or(RepoError::NotFound(EntityRef::User(id)))
    }

    pub fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.repo.find_by_email(email)
    }

    /// Turns a verified token subject into a request principal.
    pub fn resolve_principal(&self, user_id: UserId) -> RepoResult<Principal> {
        self.get(user_id).map(|user| Principal::new(user.id))
    }

    /// Profile of any known user; blank until the user first saves one.
    pub fn get_profile(&self, user_id: UserId) -> RepoResult<Profile> {
        if let Some(profile) = self.repo.get_profile(user_id)? {
            return Ok(profile);
        }
        self.get(user_id).map(|user| Profile::empty(user.id))
    }

    /// Replaces the principal's own profile.
    pub fn update_profile(
        &self,
        principal: &Principal,
        changes: ProfileChanges,
    ) -> RepoResult<Profile> {
        let profile = Profile {
            bio: changes.bio.trim().to_string(),
            role: changes.role.trim().to_string(),
            facebook: changes.facebook.trim().to_string(),
            instagram: changes.instagram.trim().to_string(),
            linkedin: changes.linkedin.trim().to_string(),
            twitter: changes.twitter.trim().to_string(),
            ..Profile::empty(principal.user_id())
        };
        self.repo.upsert_profile(&profile)
    }
}
