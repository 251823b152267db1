//! Tenant-scoped project and budget-item use cases.
//!
//! # Responsibility
//! - Apply the caller's [`Principal`] to every project and item operation.
//! - Normalize request fields before handing records to the ledger.
//!
//! # Invariants
//! - A project owned by another user is reported as `NotFound`, never as a
//!   distinct "forbidden" outcome.
//! - The owner of a project is fixed at creation.
//! - Budget arithmetic happens only inside the repository transaction; this
//!   layer never computes a new `budget` from values it has read.

use crate::model::category::CategoryId;
use crate::model::project::{BudgetBalance, ItemId, Project, ProjectId, ProjectItem};
use crate::model::user::Principal;
use crate::pagination::{Page, PageRequest, SortDirection};
use crate::repo::project_repo::{
    ItemListQuery, LedgerError, LedgerResult, ProjectListQuery, ProjectRepository,
};
use crate::repo::EntityRef;
use serde::{Deserialize, Serialize};

/// Fields for a new project. `budget` is the gross envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    pub category_id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub budget: i64,
}

/// Replacement fields for an existing project.
///
/// A `budget` different from the stored remainder is treated as a new gross
/// envelope and rebalanced against the project's live items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectChanges {
    pub category_id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub budget: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub project_id: ProjectId,
    pub name: String,
    pub budget_item: i64,
    #[serde(default)]
    pub status: bool,
}

/// Replacement fields for an item. A different `project_id` moves the item
/// and its allocation to that project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChanges {
    pub project_id: ProjectId,
    pub name: String,
    pub budget_item: i64,
    pub status: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFilter {
    pub name: Option<String>,
    pub category_name: Option<String>,
    pub sort: SortDirection,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemFilter {
    pub name: Option<String>,
    pub sort: SortDirection,
    pub page: PageRequest,
}

/// One project with its ledger balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub balance: BudgetBalance,
}

/// Project ledger service facade.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a project owned by the principal.
    pub fn create_project(
        &self,
        principal: &Principal,
        request: NewProject,
    ) -> LedgerResult<Project> {
        let project = Project::new(
            request.category_id,
            principal.user_id(),
            request.name.trim(),
            request.description.trim(),
            request.budget,
        );
        self.repo.create_project(&project)
    }

    pub fn update_project(
        &self,
        principal: &Principal,
        id: ProjectId,
        changes: ProjectChanges,
    ) -> LedgerResult<Project> {
        let mut project = self.owned_project(principal, id)?;
        project.category_id = changes.category_id;
        project.name = changes.name.trim().to_string();
        project.description = changes.description.trim().to_string();
        project.budget = changes.budget;
        self.repo.update_project(&project)
    }

    pub fn delete_project(&self, principal: &Principal, id: ProjectId) -> LedgerResult<()> {
        self.owned_project(principal, id)?;
        self.repo.delete_project(id)
    }

    pub fn get_project(&self, principal: &Principal, id: ProjectId) -> LedgerResult<ProjectDetail> {
        let project = self.owned_project(principal, id)?;
        let balance = self.repo.balance(id)?;
        Ok(ProjectDetail { project, balance })
    }

    pub fn list_projects(
        &self,
        principal: &Principal,
        filter: ProjectFilter,
    ) -> LedgerResult<Page<Project>> {
        self.repo.list_projects(&ProjectListQuery {
            owner: principal.user_id(),
            name: filter.name,
            category_name: filter.category_name,
            sort: filter.sort,
            page: filter.page,
        })
    }

    pub fn create_item(&self, principal: &Principal, request: NewItem) -> LedgerResult<ProjectItem> {
        self.owned_project(principal, request.project_id)?;
        let item = ProjectItem::new(
            request.project_id,
            request.name.trim(),
            request.budget_item,
            request.status,
        );
        self.repo.create_item(&item)
    }

    pub fn update_item(
        &self,
        principal: &Principal,
        id: ItemId,
        changes: ItemChanges,
    ) -> LedgerResult<ProjectItem> {
        let mut item = self.owned_item(principal, id)?;
        if changes.project_id != item.project_id {
            self.owned_project(principal, changes.project_id)?;
        }
        item.project_id = changes.project_id;
        item.name = changes.name.trim().to_string();
        item.budget_item = changes.budget_item;
        item.status = changes.status;
        self.repo.update_item(&item)
    }

    pub fn delete_item(&self, principal: &Principal, id: ItemId) -> LedgerResult<()> {
        self.owned_item(principal, id)?;
        self.repo.delete_item(id)
    }

    pub fn list_items(
        &self,
        principal: &Principal,
        project_id: ProjectId,
        filter: ItemFilter,
    ) -> LedgerResult<Page<ProjectItem>> {
        self.owned_project(principal, project_id)?;
        self.repo.list_items(&ItemListQuery {
            project_id,
            name: filter.name,
            sort: filter.sort,
            page: filter.page,
        })
    }

    fn owned_project(&self, principal: &Principal, id: ProjectId) -> LedgerResult<Project> {
        match self.repo.get_project(id, false)? {
            Some(project) if project.user_id == principal.user_id() => Ok(project),
            _ => Err(LedgerError::NotFound(EntityRef::Project(id))),
        }
    }

    fn owned_item(&self, principal: &Principal, id: ItemId) -> LedgerResult<ProjectItem> {
        let item = self
            .repo
            .get_item(id, false)?
            .ok_or(LedgerError::NotFound(EntityRef::Item(id)))?;
        match self.owned_project(principal, item.project_id) {
            Ok(_) => Ok(item),
            Err(LedgerError::NotFound(_)) => Err(LedgerError::NotFound(EntityRef::Item(id))),
            Err(other) => Err(other),
        }
    }
}
