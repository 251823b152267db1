//! Project and project item records.
//!
//! # Invariants
//! - `Project::budget` is the unallocated remainder, not the gross envelope.
//!   At rest it equals gross minus the sum of active item allocations.
//! - An item belongs to exactly one project for its whole active life, unless
//!   explicitly moved through the ledger.

use super::{validate_name, ValidationError};
use crate::model::category::CategoryId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProjectId = Uuid;
pub type ItemId = Uuid;

/// Project row with its ledger balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub category_id: CategoryId,
    /// Owning user. Never changes after creation.
    pub user_id: UserId,
    pub name: String,
    pub description: String,
    /// Remaining, unallocated budget.
    pub budget: i64,
    /// Epoch ms, assigned by storage.
    pub created_at: i64,
    /// Epoch ms, assigned by storage.
    pub updated_at: i64,
    /// Epoch ms tombstone. `None` while active.
    pub deleted_at: Option<i64>,
}

impl Project {
    /// Creates an unsaved project whose `budget` is the initial gross amount.
    pub fn new(
        category_id: CategoryId,
        user_id: UserId,
        name: impl Into<String>,
        description: impl Into<String>,
        budget: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category_id,
            user_id,
            name: name.into(),
            description: description.into(),
            budget,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name("project name", &self.name)?;
        if self.budget < 0 {
            return Err(ValidationError::NegativeBudget(self.budget));
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// One budget line of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectItem {
    pub id: ItemId,
    pub project_id: ProjectId,
    pub name: String,
    /// Amount of the parent budget this line consumes.
    pub budget_item: i64,
    /// `true` once the line is completed.
    pub status: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl ProjectItem {
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        budget_item: i64,
        status: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            name: name.into(),
            budget_item,
            status,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name("item name", &self.name)?;
        if self.budget_item < 0 {
            return Err(ValidationError::NegativeBudgetItem(self.budget_item));
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Ledger view of one project: remainder plus what is allocated to items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetBalance {
    pub project_id: ProjectId,
    pub remaining: i64,
    pub allocated: i64,
}

impl BudgetBalance {
    /// Gross envelope implied by the remainder and the allocations.
    pub fn gross(&self) -> i64 {
        self.remaining + self.allocated
    }

    /// Allocations exceed the gross envelope, which only a rebalance to a
    /// smaller gross can cause.
    pub fn is_overdrawn(&self) -> bool {
        self.remaining < 0
    }
}
