//! Category use cases. Categories are shared across tenants.

use crate::model::category::{Category, CategoryId};
use crate::pagination::{Page, PageRequest};
use crate::repo::category_repo::{CategoryListQuery, CategoryRepository};
use crate::repo::{EntityRef, RepoError, RepoResult};

pub struct CategoryService<R: CategoryRepository> {
    repo: R,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create(&self, name: &str) -> RepoResult<Category> {
        self.repo.create_category(&Category::new(name.trim()))
    }

    pub fn rename(&self, id: CategoryId, name: &str) -> RepoResult<Category> {
        self.repo.rename_category(id, name.trim())
    }

    /// Tombstones a category. Projects referencing it are left as they are.
    pub fn delete(&self, id: CategoryId) -> RepoResult<()> {
        self.repo.soft_delete_category(id)
    }

    pub fn get(&self, id: CategoryId) -> RepoResult<Category> {
        self.repo
            .get_category(id, false)?
            .ok_or(RepoError::NotFound(EntityRef::Category(id)))
    }

    pub fn list(&self, search: Option<String>, page: PageRequest) -> RepoResult<Page<Category>> {
        self.repo
            .list_categories(&CategoryListQuery { search, page })
    }
}
