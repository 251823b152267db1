//! Project ledger repository: projects, their items, and the budget balance.
//!
//! # Responsibility
//! - Persist projects and project items.
//! - Keep `projects.budget` reconciled with item allocations on every
//!   mutation path.
//!
//! # Invariants
//! - At rest, `projects.budget = gross - SUM(active project_items.budget_item)`.
//! - Every mutation runs inside one `BEGIN IMMEDIATE` transaction. The
//!   transaction guard rolls back on drop, so any early return or panic
//!   leaves both tables untouched.
//! - `projects.budget` is only written as `budget = budget +/- ?` (or a
//!   rebalance computed in SQL), never from a value read earlier in Rust.
//! - Decrements use `WHERE budget >= ?`; zero changed rows means the project
//!   cannot cover the allocation.
//! - Only a rebalance can leave the remainder negative (new gross below the
//!   live allocations). Such a project accepts refunds but no new charges.

use crate::db::DbError;
use crate::model::category::CategoryId;
use crate::model::project::{BudgetBalance, ItemId, Project, ProjectId, ProjectItem};
use crate::model::user::UserId;
use crate::model::ValidationError;
use crate::pagination::{contains_pattern, non_blank, Page, PageRequest, SortDirection};
use crate::repo::{bool_to_int, int_to_bool, parse_uuid, EntityRef, NOW_MS};
use log::{debug, error, info, warn};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

const PROJECT_COLUMNS: &str = "p.id AS id,
    p.category_id AS category_id,
    p.user_id AS user_id,
    p.name AS name,
    p.description AS description,
    p.budget AS budget,
    p.created_at AS created_at,
    p.updated_at AS updated_at,
    p.deleted_at AS deleted_at";

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    name,
    budget_item,
    status,
    created_at,
    updated_at,
    deleted_at
FROM project_items";

/// Sum of active allocations for the project bound to `?1`.
const ALLOCATED_SUBQUERY: &str = "SELECT COALESCE(SUM(budget_item), 0)
    FROM project_items
    WHERE project_id = ?1
      AND deleted_at IS NULL";

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors from ledger operations.
#[derive(Debug)]
pub enum LedgerError {
    /// Record failed validation before any SQL ran.
    Validation(ValidationError),
    /// Referenced record does not exist or is soft-deleted.
    NotFound(EntityRef),
    /// The project remainder cannot cover the requested allocation.
    InsufficientBudget {
        project_id: ProjectId,
        requested: i64,
        available: i64,
    },
    /// Underlying SQLite failure; the transaction was rolled back.
    Db(DbError),
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl LedgerError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::NotFound(_) => "not_found",
            Self::InsufficientBudget { .. } => "insufficient_budget",
            Self::Db(_) => "db_error",
            Self::InvalidData(_) => "invalid_data",
        }
    }

    /// Whether the failure came from storage rather than from the request.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Db(_) | Self::InvalidData(_))
    }
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::InsufficientBudget {
                project_id,
                requested,
                available,
            } => write!(
                f,
                "insufficient budget on project {project_id}: requested {requested}, available {available}"
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted ledger data: {message}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InsufficientBudget { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for LedgerError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for LedgerError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filters for listing one owner's projects.
#[derive(Debug, Clone)]
pub struct ProjectListQuery {
    pub owner: UserId,
    /// Substring match on the project name.
    pub name: Option<String>,
    /// Substring match on the name of the project's category. Projects whose
    /// category is soft-deleted never match; without this filter they are
    /// listed as usual.
    pub category_name: Option<String>,
    /// Order by remaining budget; ties break on id.
    pub sort: SortDirection,
    pub page: PageRequest,
}

impl ProjectListQuery {
    pub fn for_owner(owner: UserId) -> Self {
        Self {
            owner,
            name: None,
            category_name: None,
            sort: SortDirection::default(),
            page: PageRequest::default(),
        }
    }
}

/// Filters for listing the active items of one project.
#[derive(Debug, Clone)]
pub struct ItemListQuery {
    pub project_id: ProjectId,
    /// Substring match on the item name.
    pub name: Option<String>,
    /// Order by `budget_item`; ties break on id.
    pub sort: SortDirection,
    pub page: PageRequest,
}

impl ItemListQuery {
    pub fn for_project(project_id: ProjectId) -> Self {
        Self {
            project_id,
            name: None,
            sort: SortDirection::default(),
            page: PageRequest::default(),
        }
    }
}

/// Repository interface for projects, items and their shared budget.
pub trait ProjectRepository {
    /// Inserts a project whose `budget` is the initial gross amount.
    fn create_project(&self, project: &Project) -> LedgerResult<Project>;
    /// Updates fields and, when `budget` changed, rebalances it as a new gross.
    ///
    /// A gross below the live allocations is stored as a negative remainder.
    /// The category is only checked when it changes.
    fn update_project(&self, project: &Project) -> LedgerResult<Project>;
    /// Tombstones the project and all of its active items.
    fn delete_project(&self, id: ProjectId) -> LedgerResult<()>;
    fn get_project(&self, id: ProjectId, include_deleted: bool) -> LedgerResult<Option<Project>>;
    fn list_projects(&self, query: &ProjectListQuery) -> LedgerResult<Page<Project>>;

    /// Inserts an item and charges its allocation to the parent project.
    fn create_item(&self, item: &ProjectItem) -> LedgerResult<ProjectItem>;
    /// Updates an item and moves the allocation difference through the ledger.
    fn update_item(&self, item: &ProjectItem) -> LedgerResult<ProjectItem>;
    /// Tombstones an item and refunds its allocation.
    fn delete_item(&self, id: ItemId) -> LedgerResult<()>;
    fn get_item(&self, id: ItemId, include_deleted: bool) -> LedgerResult<Option<ProjectItem>>;
    fn list_items(&self, query: &ItemListQuery) -> LedgerResult<Page<ProjectItem>>;

    /// Remainder and allocated total for one active project.
    fn balance(&self, project_id: ProjectId) -> LedgerResult<BudgetBalance>;
    /// Balances of every active project, ordered by project id.
    fn balances(&self) -> LedgerResult<Vec<BudgetBalance>>;
}

/// SQLite-backed project ledger.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates a repository over a migrated connection.
    ///
    /// The connection must not already be inside a transaction; every
    /// mutation opens its own.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &Project) -> LedgerResult<Project> {
        let started_at = Instant::now();
        let result = create_project_tx(self.conn, project);
        log_outcome("project_create", project.id, started_at, &result);
        result
    }

    fn update_project(&self, project: &Project) -> LedgerResult<Project> {
        let started_at = Instant::now();
        let result = update_project_tx(self.conn, project);
        log_outcome("project_update", project.id, started_at, &result);
        result
    }

    fn delete_project(&self, id: ProjectId) -> LedgerResult<()> {
        let started_at = Instant::now();
        let result = delete_project_tx(self.conn, id);
        log_outcome("project_delete", id, started_at, &result);
        result
    }

    fn get_project(&self, id: ProjectId, include_deleted: bool) -> LedgerResult<Option<Project>> {
        load_project(self.conn, id, include_deleted)
    }

    fn list_projects(&self, query: &ProjectListQuery) -> LedgerResult<Page<Project>> {
        let mut filter = String::from(
            " FROM projects p
             LEFT JOIN categories c
               ON c.id = p.category_id
              AND c.deleted_at IS NULL
             WHERE p.user_id = ?
               AND p.deleted_at IS NULL",
        );
        let mut bind_values = vec![Value::Text(query.owner.to_string())];

        if let Some(name) = non_blank(query.name.as_deref()) {
            filter.push_str(" AND p.name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(contains_pattern(name)));
        }
        if let Some(category_name) = non_blank(query.category_name.as_deref()) {
            filter.push_str(" AND c.name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(contains_pattern(category_name)));
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*){filter};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {PROJECT_COLUMNS}{filter}
             ORDER BY p.budget {}, p.id ASC
             LIMIT ? OFFSET ?;",
            query.sort.as_sql()
        );
        bind_values.push(Value::Integer(query.page.limit()));
        bind_values.push(Value::Integer(query.page.offset()));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values.iter()))?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }

        Ok(Page::new(projects, query.page, count_to_u64(total)))
    }

    fn create_item(&self, item: &ProjectItem) -> LedgerResult<ProjectItem> {
        let started_at = Instant::now();
        let result = create_item_tx(self.conn, item);
        log_outcome("item_create", item.project_id, started_at, &result);
        result
    }

    fn update_item(&self, item: &ProjectItem) -> LedgerResult<ProjectItem> {
        let started_at = Instant::now();
        let result = update_item_tx(self.conn, item);
        log_outcome("item_update", item.project_id, started_at, &result);
        result
    }

    fn delete_item(&self, id: ItemId) -> LedgerResult<()> {
        let started_at = Instant::now();
        let result = delete_item_tx(self.conn, id);
        log_outcome("item_delete", id, started_at, &result);
        result.map(|_| ())
    }

    fn get_item(&self, id: ItemId, include_deleted: bool) -> LedgerResult<Option<ProjectItem>> {
        load_item(self.conn, id, include_deleted)
    }

    fn list_items(&self, query: &ItemListQuery) -> LedgerResult<Page<ProjectItem>> {
        let mut filter = String::from(" WHERE project_id = ? AND deleted_at IS NULL");
        let mut bind_values = vec![Value::Text(query.project_id.to_string())];

        if let Some(name) = non_blank(query.name.as_deref()) {
            filter.push_str(" AND name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(contains_pattern(name)));
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM project_items{filter};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "{ITEM_SELECT_SQL}{filter}
             ORDER BY budget_item {}, id ASC
             LIMIT ? OFFSET ?;",
            query.sort.as_sql()
        );
        bind_values.push(Value::Integer(query.page.limit()));
        bind_values.push(Value::Integer(query.page.offset()));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values.iter()))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }

        Ok(Page::new(items, query.page, count_to_u64(total)))
    }

    fn balance(&self, project_id: ProjectId) -> LedgerResult<BudgetBalance> {
        let remaining = active_budget(self.conn, project_id)?
            .ok_or(LedgerError::NotFound(EntityRef::Project(project_id)))?;
        Ok(BudgetBalance {
            project_id,
            remaining,
            allocated: allocated_total(self.conn, project_id)?,
        })
    }

    fn balances(&self) -> LedgerResult<Vec<BudgetBalance>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                p.id,
                p.budget,
                (
                    SELECT COALESCE(SUM(i.budget_item), 0)
                    FROM project_items i
                    WHERE i.project_id = p.id
                      AND i.deleted_at IS NULL
                )
             FROM projects p
             WHERE p.deleted_at IS NULL
             ORDER BY p.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut balances = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get(0)?;
            balances.push(BudgetBalance {
                project_id: parse_uuid(&id_text, "projects.id")
                    .map_err(LedgerError::InvalidData)?,
                remaining: row.get(1)?,
                allocated: row.get(2)?,
            });
        }
        Ok(balances)
    }
}

fn begin(conn: &Connection) -> LedgerResult<Transaction<'_>> {
    Ok(Transaction::new_unchecked(
        conn,
        TransactionBehavior::Immediate,
    )?)
}

fn create_project_tx(conn: &Connection, project: &Project) -> LedgerResult<Project> {
    project.validate()?;

    let tx = begin(conn)?;
    ensure_active_category(&tx, project.category_id)?;
    ensure_user(&tx, project.user_id)?;

    tx.execute(
        "INSERT INTO projects (
            id,
            category_id,
            user_id,
            name,
            description,
            budget
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            project.id.to_string(),
            project.category_id.to_string(),
            project.user_id.to_string(),
            project.name.as_str(),
            project.description.as_str(),
            project.budget,
        ],
    )?;

    let created = load_required_project(&tx, project.id)?;
    tx.commit()?;
    Ok(created)
}

fn update_project_tx(conn: &Connection, project: &Project) -> LedgerResult<Project> {
    project.validate()?;

    let tx = begin(conn)?;
    let stored = load_required_project(&tx, project.id)?;
    if project.category_id != stored.category_id {
        ensure_active_category(&tx, project.category_id)?;
    }

    if project.budget == stored.budget {
        tx.execute(
            &format!(
                "UPDATE projects
                 SET category_id = ?2,
                     name = ?3,
                     description = ?4,
                     updated_at = {NOW_MS}
                 WHERE id = ?1
                   AND deleted_at IS NULL;"
            ),
            params![
                project.id.to_string(),
                project.category_id.to_string(),
                project.name.as_str(),
                project.description.as_str(),
            ],
        )?;
    } else {
        // New gross envelope: remainder is re-derived from live allocations.
        tx.execute(
            &format!(
                "UPDATE projects
                 SET category_id = ?2,
                     name = ?3,
                     description = ?4,
                     budget = ?5 - ({ALLOCATED_SUBQUERY}),
                     updated_at = {NOW_MS}
                 WHERE id = ?1
                   AND deleted_at IS NULL;"
            ),
            params![
                project.id.to_string(),
                project.category_id.to_string(),
                project.name.as_str(),
                project.description.as_str(),
                project.budget,
            ],
        )?;
        let allocated = allocated_total(&tx, project.id)?;
        if allocated > project.budget {
            warn!(
                "event=project_rebalance module=ledger status=overdrawn project_id={} gross={} allocated={allocated}",
                project.id, project.budget
            );
        } else {
            debug!(
                "event=project_rebalance module=ledger status=ok project_id={} gross={} allocated={allocated}",
                project.id, project.budget
            );
        }
    }

    let updated = load_required_project(&tx, project.id)?;
    tx.commit()?;
    Ok(updated)
}

fn delete_project_tx(conn: &Connection, id: ProjectId) -> LedgerResult<()> {
    let tx = begin(conn)?;
    if active_budget(&tx, id)?.is_none() {
        return Err(LedgerError::NotFound(EntityRef::Project(id)));
    }

    let items = tx.execute(
        &format!(
            "UPDATE project_items
             SET deleted_at = {NOW_MS},
                 updated_at = {NOW_MS}
             WHERE project_id = ?1
               AND deleted_at IS NULL;"
        ),
        [id.to_string()],
    )?;
    tx.execute(
        &format!(
            "UPDATE projects
             SET deleted_at = {NOW_MS},
                 updated_at = {NOW_MS}
             WHERE id = ?1
               AND deleted_at IS NULL;"
        ),
        [id.to_string()],
    )?;

    tx.commit()?;
    debug!("event=project_delete module=ledger project_id={id} items_tombstoned={items}");
    Ok(())
}

fn create_item_tx(conn: &Connection, item: &ProjectItem) -> LedgerResult<ProjectItem> {
    item.validate()?;

    let tx = begin(conn)?;
    if active_budget(&tx, item.project_id)?.is_none() {
        return Err(LedgerError::NotFound(EntityRef::Project(item.project_id)));
    }

    tx.execute(
        "INSERT INTO project_items (
            id,
            project_id,
            name,
            budget_item,
            status
        ) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            item.id.to_string(),
            item.project_id.to_string(),
            item.name.as_str(),
            item.budget_item,
            bool_to_int(item.status),
        ],
    )?;
    charge(&tx, item.project_id, item.budget_item)?;

    let created = load_required_item(&tx, item.id)?;
    tx.commit()?;
    Ok(created)
}

fn update_item_tx(conn: &Connection, item: &ProjectItem) -> LedgerResult<ProjectItem> {
    item.validate()?;

    let tx = begin(conn)?;
    let stored = load_required_item(&tx, item.id)?;
    let moved = stored.project_id != item.project_id;
    if moved && active_budget(&tx, item.project_id)?.is_none() {
        return Err(LedgerError::NotFound(EntityRef::Project(item.project_id)));
    }

    tx.execute(
        &format!(
            "UPDATE project_items
             SET project_id = ?2,
                 name = ?3,
                 budget_item = ?4,
                 status = ?5,
                 updated_at = {NOW_MS}
             WHERE id = ?1
               AND deleted_at IS NULL;"
        ),
        params![
            item.id.to_string(),
            item.project_id.to_string(),
            item.name.as_str(),
            item.budget_item,
            bool_to_int(item.status),
        ],
    )?;

    if moved {
        refund(&tx, stored.project_id, stored.budget_item)?;
        charge(&tx, item.project_id, item.budget_item)?;
    } else {
        let delta = item.budget_item - stored.budget_item;
        match delta.cmp(&0) {
            Ordering::Greater => charge(&tx, item.project_id, delta)?,
            Ordering::Less => refund(&tx, item.project_id, -delta)?,
            Ordering::Equal => {}
        }
    }

    let updated = load_required_item(&tx, item.id)?;
    tx.commit()?;
    Ok(updated)
}

fn delete_item_tx(conn: &Connection, id: ItemId) -> LedgerResult<ProjectItem> {
    let tx = begin(conn)?;
    let stored = load_required_item(&tx, id)?;

    refund(&tx, stored.project_id, stored.budget_item)?;
    tx.execute(
        &format!(
            "UPDATE project_items
             SET deleted_at = {NOW_MS},
                 updated_at = {NOW_MS}
             WHERE id = ?1
               AND deleted_at IS NULL;"
        ),
        [id.to_string()],
    )?;

    tx.commit()?;
    Ok(stored)
}

/// Decrements the project remainder by `amount`, guarded by sufficiency.
fn charge(conn: &Connection, project_id: ProjectId, amount: i64) -> LedgerResult<()> {
    let changed = conn.execute(
        &format!(
            "UPDATE projects
             SET budget = budget - ?2,
                 updated_at = {NOW_MS}
             WHERE id = ?1
               AND deleted_at IS NULL
               AND budget >= ?2;"
        ),
        params![project_id.to_string(), amount],
    )?;
    if changed == 1 {
        debug!("event=budget_charge module=ledger project_id={project_id} amount={amount}");
        return Ok(());
    }

    match active_budget(conn, project_id)? {
        None => Err(LedgerError::NotFound(EntityRef::Project(project_id))),
        Some(available) => Err(LedgerError::InsufficientBudget {
            project_id,
            requested: amount,
            available,
        }),
    }
}

/// Returns `amount` to the project remainder. Zero amounts are a no-op.
fn refund(conn: &Connection, project_id: ProjectId, amount: i64) -> LedgerResult<()> {
    if amount == 0 {
        return Ok(());
    }

    let changed = conn.execute(
        &format!(
            "UPDATE projects
             SET budget = budget + ?2,
                 updated_at = {NOW_MS}
             WHERE id = ?1
               AND deleted_at IS NULL;"
        ),
        params![project_id.to_string(), amount],
    )?;
    if changed == 0 {
        return Err(LedgerError::NotFound(EntityRef::Project(project_id)));
    }

    debug!("event=budget_refund module=ledger project_id={project_id} amount={amount}");
    Ok(())
}

fn active_budget(conn: &Connection, project_id: ProjectId) -> LedgerResult<Option<i64>> {
    let budget = conn
        .query_row(
            "SELECT budget
             FROM projects
             WHERE id = ?1
               AND deleted_at IS NULL;",
            [project_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(budget)
}

fn allocated_total(conn: &Connection, project_id: ProjectId) -> LedgerResult<i64> {
    let total = conn.query_row(
        &format!("{ALLOCATED_SUBQUERY};"),
        [project_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(total)
}

fn ensure_active_category(conn: &Connection, category_id: CategoryId) -> LedgerResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM categories
            WHERE id = ?1
              AND deleted_at IS NULL
        );",
        [category_id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(LedgerError::NotFound(EntityRef::Category(category_id)))
    }
}

fn ensure_user(conn: &Connection, user_id: UserId) -> LedgerResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
        [user_id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(LedgerError::NotFound(EntityRef::User(user_id)))
    }
}

fn load_project(
    conn: &Connection,
    id: ProjectId,
    include_deleted: bool,
) -> LedgerResult<Option<Project>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROJECT_COLUMNS}
         FROM projects p
         WHERE p.id = ?1
           AND (?2 = 1 OR p.deleted_at IS NULL);"
    ))?;
    let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_project_row(row)?));
    }
    Ok(None)
}

fn load_required_project(conn: &Connection, id: ProjectId) -> LedgerResult<Project> {
    load_project(conn, id, false)?.ok_or(LedgerError::NotFound(EntityRef::Project(id)))
}

fn load_item(
    conn: &Connection,
    id: ItemId,
    include_deleted: bool,
) -> LedgerResult<Option<ProjectItem>> {
    let mut stmt = conn.prepare(&format!(
        "{ITEM_SELECT_SQL}
         WHERE id = ?1
           AND (?2 = 1 OR deleted_at IS NULL);"
    ))?;
    let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_item_row(row)?));
    }
    Ok(None)
}

fn load_required_item(conn: &Connection, id: ItemId) -> LedgerResult<ProjectItem> {
    load_item(conn, id, false)?.ok_or(LedgerError::NotFound(EntityRef::Item(id)))
}

fn parse_project_row(row: &Row<'_>) -> LedgerResult<Project> {
    Ok(Project {
        id: uuid_column(row, "id", "projects.id")?,
        category_id: uuid_column(row, "category_id", "projects.category_id")?,
        user_id: uuid_column(row, "user_id", "projects.user_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        budget: row.get("budget")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

fn parse_item_row(row: &Row<'_>) -> LedgerResult<ProjectItem> {
    let status = int_to_bool(row.get("status")?, "project_items.status")
        .map_err(LedgerError::InvalidData)?;
    Ok(ProjectItem {
        id: uuid_column(row, "id", "project_items.id")?,
        project_id: uuid_column(row, "project_id", "project_items.project_id")?,
        name: row.get("name")?,
        budget_item: row.get("budget_item")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

fn uuid_column(row: &Row<'_>, name: &str, column: &'static str) -> LedgerResult<Uuid> {
    let text: String = row.get(name)?;
    parse_uuid(&text, column).map_err(LedgerError::InvalidData)
}

fn count_to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn log_outcome<T>(event: &'static str, subject: Uuid, started_at: Instant, result: &LedgerResult<T>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event={event} module=ledger status=ok subject={subject} duration_ms={duration_ms}"
        ),
        Err(err) if err.is_persistence() => error!(
            "event={event} module=ledger status=error subject={subject} duration_ms={duration_ms} error_code={} error={err}",
            err.code()
        ),
        Err(err) => warn!(
            "event={event} module=ledger status=rejected subject={subject} duration_ms={duration_ms} error_code={}",
            err.code()
        ),
    }
}
