//! Core of the project ledger.
//! This crate owns the budget invariants: a project's stored `budget` is its
//! gross envelope minus the allocations of its active items, and every write
//! that touches either side is a single transaction.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod pagination;
pub mod repo;
pub mod service;

pub use config::{ConfigError, LedgerConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::category::{Category, CategoryId};
pub use model::profile::Profile;
pub use model::project::{BudgetBalance, ItemId, Project, ProjectId, ProjectItem};
pub use model::user::{Principal, User, UserId};
pub use model::ValidationError;
pub use pagination::{Page, PageRequest, SortDirection};
pub use repo::category_repo::{CategoryListQuery, CategoryRepository, SqliteCategoryRepository};
pub use repo::project_repo::{
    ItemListQuery, LedgerError, LedgerResult, ProjectListQuery, ProjectRepository,
    SqliteProjectRepository,
};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{EntityRef, RepoError, RepoResult};
pub use service::category_service::CategoryService;
pub use service::project_service::{
    ItemChanges, ItemFilter, NewItem, NewProject, ProjectChanges, ProjectDetail, ProjectFilter,
    ProjectService,
};
pub use service::response::{ApiResponse, HttpStatus};
pub use service::user_service::{NewUser, ProfileChanges, UserService};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
