//! Category record. Projects reference categories by id only.

use super::{validate_name, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CategoryId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name("category name", &self.name)
    }
}
