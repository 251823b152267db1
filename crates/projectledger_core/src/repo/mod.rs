//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Keep SQL details out of the service layer.
//!
//! # Invariants
//! - Repository writes call the record's `validate()` before SQL mutations.
//! - Repository APIs return semantic errors (`NotFound`, `InsufficientBudget`,
//!   `EmailTaken`) in addition to DB transport errors.
//! - Soft-deleted rows are invisible unless a call asks for them explicitly.

use crate::db::DbError;
use crate::model::category::CategoryId;
use crate::model::project::{ItemId, ProjectId};
use crate::model::user::UserId;
use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod category_repo;
pub mod project_repo;
pub mod user_repo;

/// SQL expression for "now" in epoch milliseconds.
pub(crate) const NOW_MS: &str = "(strftime('%s', 'now') * 1000)";

/// Identifies the record a `NotFound` error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Project(ProjectId),
    Item(ItemId),
    Category(CategoryId),
    User(UserId),
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project(id) => write!(f, "project {id}"),
            Self::Item(id) => write!(f, "project item {id}"),
            Self::Category(id) => write!(f, "category {id}"),
            Self::User(id) => write!(f, "user {id}"),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for the category and user repositories.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound(EntityRef),
    /// Another user already registered this (normalized) email.
    EmailTaken(String),
    InvalidData(String),
}

impl RepoError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Db(_) => "db_error",
            Self::NotFound(_) => "not_found",
            Self::EmailTaken(_) => "email_taken",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::EmailTaken(email) => write!(f, "email already registered: {email}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::EmailTaken(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Parses a UUID column, naming the column in the error message.
pub(crate) fn parse_uuid(value: &str, column: &'static str) -> Result<Uuid, String> {
    Uuid::parse_str(value).map_err(|_| format!("invalid uuid `{value}` in {column}"))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

pub(crate) fn int_to_bool(value: i64, column: &'static str) -> Result<bool, String> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(format!("invalid boolean value `{other}` in {column}")),
    }
}
