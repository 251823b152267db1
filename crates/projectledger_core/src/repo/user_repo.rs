//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `users.email` is unique and stored normalized; lookups normalize too.
//! - Password hashes are stored as given and never returned in logs.
//! - A profile row exists at most once per user and only for a known user.

use crate::model::profile::Profile;
use crate::model::user::{normalize_email, User, UserId};
use crate::repo::{parse_uuid, EntityRef, RepoError, RepoResult, NOW_MS};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    password_hash,
    created_at
FROM users";

const PROFILE_SELECT_SQL: &str = "SELECT
    user_id,
    bio,
    role,
    facebook,
    instagram,
    linkedin,
    twitter,
    created_at,
    updated_at
FROM user_profiles";

/// Repository interface for user registration and lookup.
pub trait UserRepository {
    /// Inserts a user. Fails with `EmailTaken` for a duplicate email.
    fn register_user(&self, user: &User) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;

    /// Stored profile of `user_id`, if one was ever written.
    fn get_profile(&self, user_id: UserId) -> RepoResult<Option<Profile>>;
    /// Inserts or replaces the profile row of `profile.user_id`.
    /// Fails with `NotFound(User)` for an unknown user.
    fn upsert_profile(&self, profile: &Profile) -> RepoResult<Profile>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn find_one(&self, column: &'static str, value: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE {column} = ?1 LIMIT 1;"))?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn register_user(&self, user: &User) -> RepoResult<User> {
        let mut user = user.clone();
        user.email = normalize_email(&user.email);
        user.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO users (id, username, email, password_hash)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                user.email.as_str(),
                user.password_hash.as_str(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_email_violation(&err) => {
                return Err(RepoError::EmailTaken(user.email));
            }
            Err(err) => return Err(err.into()),
        }

        self.get_user(user.id)?
            .ok_or(RepoError::NotFound(EntityRef::User(user.id)))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.find_one("id", &id.to_string())
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.find_one("email", &normalize_email(email))
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.find_one("username", username.trim())
    }

    fn get_profile(&self, user_id: UserId) -> RepoResult<Option<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} WHERE user_id = ?1;"))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_profile_row(row)?));
        }
        Ok(None)
    }

    fn upsert_profile(&self, profile: &Profile) -> RepoResult<Profile> {
        profile.validate()?;

        let user_exists = self
            .conn
            .query_row(
                "SELECT 1 FROM users WHERE id = ?1;",
                [profile.user_id.to_string()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if !user_exists {
            return Err(RepoError::NotFound(EntityRef::User(profile.user_id)));
        }

        self.conn.execute(
            &format!(
                "INSERT INTO user_profiles (
                    user_id,
                    bio,
                    role,
                    facebook,
                    instagram,
                    linkedin,
                    twitter
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT (user_id) DO UPDATE SET
                    bio = excluded.bio,
                    role = excluded.role,
                    facebook = excluded.facebook,
                    instagram = excluded.instagram,
                    linkedin = excluded.linkedin,
                    twitter = excluded.twitter,
                    updated_at = {NOW_MS};"
            ),
            params![
                profile.user_id.to_string(),
                profile.bio.as_str(),
                profile.role.as_str(),
                profile.facebook.as_str(),
                profile.instagram.as_str(),
                profile.linkedin.as_str(),
                profile.twitter.as_str(),
            ],
        )?;

        self.get_profile(profile.user_id)?
            .ok_or(RepoError::NotFound(EntityRef::User(profile.user_id)))
    }
}

fn is_unique_email_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, Some(message)) => {
            failure.code == ErrorCode::ConstraintViolation && message.contains("users.email")
        }
        _ => false,
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    Ok(User {
        id: parse_uuid(&id_text, "users.id").map_err(RepoError::InvalidData)?,
        username: row.get("username")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let user_id_text: String = row.get("user_id")?;
    Ok(Profile {
        user_id: parse_uuid(&user_id_text, "user_profiles.user_id")
            .map_err(RepoError::InvalidData)?,
        bio: row.get("bio")?,
        role: row.get("role")?,
        facebook: row.get("facebook")?,
        instagram: row.get("instagram")?,
        linkedin: row.get("linkedin")?,
        twitter: row.get("twitter")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
