//! Category repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Categories are tombstoned, never removed, so projects keep a valid
//!   foreign key after their category is deleted.
//! - Listing is ordered by `name ASC, id ASC`.

use crate::model::category::{Category, CategoryId};
use crate::model::validate_name;
use crate::pagination::{contains_pattern, non_blank, Page, PageRequest};
use crate::repo::{parse_uuid, EntityRef, RepoError, RepoResult, NOW_MS};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const CATEGORY_SELECT_SQL: &str = "SELECT
    id,
    name,
    created_at,
    updated_at,
    deleted_at
FROM categories";

/// Query options for listing categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryListQuery {
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
    pub page: PageRequest,
}

/// Repository interface for category CRUD operations.
pub trait CategoryRepository {
    fn create_category(&self, category: &Category) -> RepoResult<Category>;
    fn rename_category(&self, id: CategoryId, name: &str) -> RepoResult<Category>;
    fn soft_delete_category(&self, id: CategoryId) -> RepoResult<()>;
    fn get_category(&self, id: CategoryId, include_deleted: bool) -> RepoResult<Option<Category>>;
    fn list_categories(&self, query: &CategoryListQuery) -> RepoResult<Page<Category>>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_required(&self, id: CategoryId) -> RepoResult<Category> {
        self.get_category(id, false)?
            .ok_or(RepoError::NotFound(EntityRef::Category(id)))
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn create_category(&self, category: &Category) -> RepoResult<Category> {
        category.validate()?;

        self.conn.execute(
            "INSERT INTO categories (id, name) VALUES (?1, ?2);",
            params![category.id.to_string(), category.name.as_str()],
        )?;

        self.load_required(category.id)
    }

    fn rename_category(&self, id: CategoryId, name: &str) -> RepoResult<Category> {
        validate_name("category name", name)?;

        let changed = self.conn.execute(
            &format!(
                "UPDATE categories
                 SET name = ?2,
                     updated_at = {NOW_MS}
                 WHERE id = ?1
                   AND deleted_at IS NULL;"
            ),
            params![id.to_string(), name],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityRef::Category(id)));
        }

        self.load_required(id)
    }

    fn soft_delete_category(&self, id: CategoryId) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE categories
                 SET deleted_at = {NOW_MS},
                     updated_at = {NOW_MS}
                 WHERE id = ?1
                   AND deleted_at IS NULL;"
            ),
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityRef::Category(id)));
        }
        Ok(())
    }

    fn get_category(&self, id: CategoryId, include_deleted: bool) -> RepoResult<Option<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ))?;
        let mut rows = stmt.query(params![id.to_string(), i64::from(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_category_row(row)?));
        }
        Ok(None)
    }

    fn list_categories(&self, query: &CategoryListQuery) -> RepoResult<Page<Category>> {
        let mut filter = String::from(" WHERE deleted_at IS NULL");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(search) = non_blank(query.search.as_deref()) {
            filter.push_str(" AND name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(contains_pattern(search)));
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM categories{filter};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        bind_values.push(Value::Integer(query.page.limit()));
        bind_values.push(Value::Integer(query.page.offset()));
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL}{filter}
             ORDER BY name ASC, id ASC
             LIMIT ? OFFSET ?;"
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values.iter()))?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }

        Ok(Page::new(
            categories,
            query.page,
            u64::try_from(total).unwrap_or(0),
        ))
    }
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    let id_text: String = row.get("id")?;
    Ok(Category {
        id: parse_uuid(&id_text, "categories.id").map_err(RepoError::InvalidData)?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}
