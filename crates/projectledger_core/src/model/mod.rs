//! Domain model for the project ledger.
//!
//! # Responsibility
//! - Define the records stored by the ledger and the directory tables.
//! - Validate records before any repository write.
//!
//! # Invariants
//! - Every record is identified by a stable UUID v4.
//! - Deletion is a `deleted_at` tombstone, never a hard delete.
//! - Money is an integer amount in the smallest currency unit.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category;
pub mod profile;
pub mod project;
pub mod user;

/// Longest accepted project or category name, in characters.
pub const MAX_NAME_CHARS: usize = 100;

/// Field-level validation failure raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required name field is empty after trimming.
    BlankName(&'static str),
    /// A name field exceeds [`MAX_NAME_CHARS`].
    NameTooLong { field: &'static str, max: usize },
    /// Project budgets cannot be negative.
    NegativeBudget(i64),
    /// Item allocations cannot be negative.
    NegativeBudgetItem(i64),
    /// A free-text field exceeds its length limit.
    TextTooLong { field: &'static str, max: usize },
    /// Email does not look like `local@domain.tld`.
    InvalidEmail(String),
    /// Password hash is empty.
    MissingPasswordHash,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName(field) => write!(f, "{field} must not be blank"),
            Self::NameTooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::NegativeBudget(value) => write!(f, "budget must not be negative, got {value}"),
            Self::NegativeBudgetItem(value) => {
                write!(f, "budget_item must not be negative, got {value}")
            }
            Self::TextTooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::MissingPasswordHash => write!(f, "password hash must not be empty"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn validate_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankName(field));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::NameTooLong {
            field,
            max: MAX_NAME_CHARS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_name, ValidationError, MAX_NAME_CHARS};

    #[test]
    fn validate_name_rejects_blank_and_oversized_values() {
        assert_eq!(
            validate_name("name", "   "),
            Err(ValidationError::BlankName("name"))
        );
        let long = "x".repeat(MAX_NAME_CHARS + 1);
        assert!(matches!(
            validate_name("name", &long),
            Err(ValidationError::NameTooLong { .. })
        ));
        assert!(validate_name("name", &"x".repeat(MAX_NAME_CHARS)).is_ok());
    }
}
