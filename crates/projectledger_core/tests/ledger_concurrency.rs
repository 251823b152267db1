use projectledger_core::db::open_db;
use projectledger_core::{
    Category, CategoryRepository, LedgerError, Project, ProjectId, ProjectItem, ProjectRepository,
    SqliteCategoryRepository, SqliteProjectRepository, SqliteUserRepository, User, UserRepository,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;

fn seed_project(path: &Path, budget: i64) -> ProjectId {
    let conn = open_db(path).unwrap();
    let user = SqliteUserRepository::new(&conn)
        .register_user(&User::new("cy", "cy@example.com", "hash"))
        .unwrap();
    let category = SqliteCategoryRepository::new(&conn)
        .create_category(&Category::new("events"))
        .unwrap();
    SqliteProjectRepository::new(&conn)
        .create_project(&Project::new(category.id, user.id, "festival", "", budget))
        .unwrap()
        .id
}

fn race_create_items(
    path: PathBuf,
    project_id: ProjectId,
    amounts: &[i64],
) -> Vec<Result<ProjectItem, LedgerError>> {
    let barrier = Arc::new(Barrier::new(amounts.len()));
    let handles: Vec<_> = amounts
        .iter()
        .enumerate()
        .map(|(index, &amount)| {
            let barrier = Arc::clone(&barrier);
            let path = path.clone();
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let repo = SqliteProjectRepository::new(&conn);
                let item = ProjectItem::new(project_id, format!("stage-{index}"), amount, false);
                barrier.wait();
                repo.create_item(&item)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect()
}

#[test]
fn concurrent_charges_never_overdraw_the_project() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite3");
    let project_id = seed_project(&path, 100);

    let results = race_create_items(path.clone(), project_id, &[60, 60]);

    let succeeded = results.iter().filter(|result| result.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|result| matches!(result, Err(LedgerError::InsufficientBudget { .. })))
        .count();
    assert_eq!(succeeded, 1);
    assert_eq!(rejected, 1);

    let conn = open_db(&path).unwrap();
    let balance = SqliteProjectRepository::new(&conn)
        .balance(project_id)
        .unwrap();
    assert_eq!(balance.remaining, 40);
    assert_eq!(balance.allocated, 60);
}

#[test]
fn concurrent_charges_that_fit_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite3");
    let project_id = seed_project(&path, 100);

    let results = race_create_items(path.clone(), project_id, &[10, 20, 30, 40]);

    assert!(results.iter().all(Result::is_ok));
    let conn = open_db(&path).unwrap();
    let balance = SqliteProjectRepository::new(&conn)
        .balance(project_id)
        .unwrap();
    assert_eq!(balance.remaining, 0);
    assert_eq!(balance.allocated, 100);
}
