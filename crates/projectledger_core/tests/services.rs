use projectledger_core::db::open_db_in_memory;
use projectledger_core::{
    ApiResponse, CategoryService, EntityRef, HttpStatus, ItemChanges, ItemFilter, LedgerError,
    NewItem, NewProject, NewUser, PageRequest, Principal, ProjectChanges, ProjectFilter,
    ProjectService, RepoError, SortDirection, SqliteCategoryRepository, SqliteProjectRepository,
    SqliteUserRepository, UserService,
};
use rusqlite::Connection;
use serde_json::json;

fn register(conn: &Connection, name: &str) -> Principal {
    let users = UserService::new(SqliteUserRepository::new(conn));
    let user = users
        .register(NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "argon2-hash".to_string(),
        })
        .unwrap();
    users.resolve_principal(user.id).unwrap()
}

fn new_project(category_id: uuid::Uuid, name: &str, budget: i64) -> NewProject {
    NewProject {
        category_id,
        name: name.to_string(),
        description: String::new(),
        budget,
    }
}

#[test]
fn projects_are_created_for_the_principal_with_trimmed_fields() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "dee");
    let category = CategoryService::new(SqliteCategoryRepository::new(&conn))
        .create("  travel  ")
        .unwrap();
    let projects = ProjectService::new(SqliteProjectRepository::new(&conn));

    let project = projects
        .create_project(
            &owner,
            NewProject {
                category_id: category.id,
                name: "  Offsite  ".to_string(),
                description: " two days ".to_string(),
                budget: 800,
            },
        )
        .unwrap();

    assert_eq!(category.name, "travel");
    assert_eq!(project.user_id, owner.user_id());
    assert_eq!(project.name, "Offsite");
    assert_eq!(project.description, "two days");

    let detail = projects.get_project(&owner, project.id).unwrap();
    assert_eq!(detail.project.id, project.id);
    assert_eq!(detail.balance.remaining, 800);
}

#[test]
fn foreign_projects_and_items_look_missing() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "dee");
    let intruder = register(&conn, "eve");
    let category = CategoryService::new(SqliteCategoryRepository::new(&conn))
        .create("travel")
        .unwrap();
    let projects = ProjectService::new(SqliteProjectRepository::new(&conn));
    let project = projects
        .create_project(&owner, new_project(category.id, "Offsite", 500))
        .unwrap();
    let item = projects
        .create_item(
            &owner,
            NewItem {
                project_id: project.id,
                name: "hotel".to_string(),
                budget_item: 200,
                status: false,
            },
        )
        .unwrap();

    assert!(matches!(
        projects.get_project(&intruder, project.id).unwrap_err(),
        LedgerError::NotFound(EntityRef::Project(_))
    ));
    assert!(matches!(
        projects.delete_project(&intruder, project.id).unwrap_err(),
        LedgerError::NotFound(EntityRef::Project(_))
    ));
    assert!(matches!(
        projects
            .create_item(
                &intruder,
                NewItem {
                    project_id: project.id,
                    name: "minibar".to_string(),
                    budget_item: 1,
                    status: false,
                },
            )
            .unwrap_err(),
        LedgerError::NotFound(EntityRef::Project(_))
    ));
    assert!(matches!(
        projects.delete_item(&intruder, item.id).unwrap_err(),
        LedgerError::NotFound(EntityRef::Item(id)) if id == item.id
    ));
    assert!(projects
        .list_projects(&intruder, ProjectFilter::default())
        .unwrap()
        .items
        .is_empty());

    let detail = projects.get_project(&owner, project.id).unwrap();
    assert_eq!(detail.balance.remaining, 300);
}

#[test]
fn moving_an_item_requires_owning_the_target() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "dee");
    let other = register(&conn, "eve");
    let category = CategoryService::new(SqliteCategoryRepository::new(&conn))
        .create("travel")
        .unwrap();
    let projects = ProjectService::new(SqliteProjectRepository::new(&conn));
    let mine = projects
        .create_project(&owner, new_project(category.id, "Offsite", 500))
        .unwrap();
    let also_mine = projects
        .create_project(&owner, new_project(category.id, "Retreat", 500))
        .unwrap();
    let theirs = projects
        .create_project(&other, new_project(category.id, "Theirs", 500))
        .unwrap();
    let item = projects
        .create_item(
            &owner,
            NewItem {
                project_id: mine.id,
                name: "bus".to_string(),
                budget_item: 100,
                status: false,
            },
        )
        .unwrap();

    let err = projects
        .update_item(
            &owner,
            item.id,
            ItemChanges {
                project_id: theirs.id,
                name: "bus".to_string(),
                budget_item: 100,
                status: false,
            },
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(EntityRef::Project(id)) if id == theirs.id));

    let moved = projects
        .update_item(
            &owner,
            item.id,
            ItemChanges {
                project_id: also_mine.id,
                name: " coach ".to_string(),
                budget_item: 120,
                status: true,
            },
        )
        .unwrap();
    assert_eq!(moved.project_id, also_mine.id);
    assert_eq!(moved.name, "coach");
    assert_eq!(projects.get_project(&owner, mine.id).unwrap().balance.remaining, 500);
    assert_eq!(
        projects
            .get_project(&owner, also_mine.id)
            .unwrap()
            .balance
            .remaining,
        380
    );
}

#[test]
fn update_project_keeps_owner_and_rebalances() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "dee");
    let categories = CategoryService::new(SqliteCategoryRepository::new(&conn));
    let travel = categories.create("travel").unwrap();
    let training = categories.create("training").unwrap();
    let projects = ProjectService::new(SqliteProjectRepository::new(&conn));
    let project = projects
        .create_project(&owner, new_project(travel.id, "Offsite", 500))
        .unwrap();
    projects
        .create_item(
            &owner,
            NewItem {
                project_id: project.id,
                name: "hotel".to_string(),
                budget_item: 300,
                status: false,
            },
        )
        .unwrap();

    let updated = projects
        .update_project(
            &owner,
            project.id,
            ProjectChanges {
                category_id: training.id,
                name: "Workshop".to_string(),
                description: String::new(),
                budget: 1_000,
            },
        )
        .unwrap();

    assert_eq!(updated.user_id, owner.user_id());
    assert_eq!(updated.category_id, training.id);
    assert_eq!(updated.budget, 700);
}

#[test]
fn list_filters_default_and_page() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "dee");
    let category = CategoryService::new(SqliteCategoryRepository::new(&conn))
        .create("travel")
        .unwrap();
    let projects = ProjectService::new(SqliteProjectRepository::new(&conn));
    for budget in 1..=12 {
        projects
            .create_project(&owner, new_project(category.id, &format!("p{budget}"), budget))
            .unwrap();
    }

    let first = projects
        .list_projects(&owner, ProjectFilter::default())
        .unwrap();
    assert_eq!(first.page, 1);
    assert_eq!(first.page_size, 10);
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total_items, 12);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.items[0].budget, 1);

    let beyond = projects
        .list_projects(
            &owner,
            ProjectFilter {
                page: PageRequest::new(5, 10),
                ..ProjectFilter::default()
            },
        )
        .unwrap();
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total_items, 12);

    let filter: ProjectFilter =
        serde_json::from_value(json!({ "sort": "desc", "page": { "page": 1, "page_size": 500 } }))
            .unwrap();
    assert_eq!(filter.sort, SortDirection::Desc);
    let everything = projects.list_projects(&owner, filter).unwrap();
    assert_eq!(everything.page_size, 100);
    assert_eq!(everything.items.len(), 12);
    assert_eq!(everything.items[0].budget, 12);

    let project_id = first.items[0].id;
    let items = projects
        .list_items(&owner, project_id, ItemFilter::default())
        .unwrap();
    assert!(items.items.is_empty());
    assert_eq!(items.total_pages, 0);
}

#[test]
fn deleting_a_category_leaves_projects_in_place() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "dee");
    let categories = CategoryService::new(SqliteCategoryRepository::new(&conn));
    let travel = categories.create("travel").unwrap();
    let projects = ProjectService::new(SqliteProjectRepository::new(&conn));
    let project = projects
        .create_project(&owner, new_project(travel.id, "Offsite", 500))
        .unwrap();

    categories.delete(travel.id).unwrap();

    assert!(matches!(
        categories.get(travel.id).unwrap_err(),
        RepoError::NotFound(EntityRef::Category(_))
    ));
    assert!(matches!(
        categories.delete(travel.id).unwrap_err(),
        RepoError::NotFound(_)
    ));
    let detail = projects.get_project(&owner, project.id).unwrap();
    assert_eq!(detail.project.category_id, travel.id);
    assert!(categories
        .list(None, PageRequest::default())
        .unwrap()
        .items
        .is_empty());
}

#[test]
fn categories_rename_and_search() {
    let conn = open_db_in_memory().unwrap();
    let categories = CategoryService::new(SqliteCategoryRepository::new(&conn));
    let first = categories.create("Marketing").unwrap();
    categories.create("Engineering").unwrap();
    categories.create("Facilities").unwrap();

    let renamed = categories.rename(first.id, " Brand ").unwrap();
    assert_eq!(renamed.name, "Brand");
    assert!(matches!(
        categories.rename(first.id, "   ").unwrap_err(),
        RepoError::Validation(_)
    ));

    let all = categories.list(None, PageRequest::default()).unwrap();
    let names: Vec<&str> = all.items.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Brand", "Engineering", "Facilities"]);

    let hits = categories
        .list(Some("ING".to_string()), PageRequest::default())
        .unwrap();
    assert_eq!(hits.total_items, 1);
    assert_eq!(hits.items[0].name, "Engineering");
}

#[test]
fn users_register_with_normalized_unique_email() {
    let conn = open_db_in_memory().unwrap();
    let users = UserService::new(SqliteUserRepository::new(&conn));

    let user = users
        .register(NewUser {
            username: " fay ".to_string(),
            email: " Fay@Example.COM ".to_string(),
            password_hash: "hash".to_string(),
        })
        .unwrap();
    assert_eq!(user.username, "fay");
    assert_eq!(user.email, "fay@example.com");

    let found = users.find_by_email("FAY@example.com").unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.password_hash, "hash");

    let err = users
        .register(NewUser {
            username: "fay2".to_string(),
            email: "fay@EXAMPLE.com".to_string(),
            password_hash: "hash".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, RepoError::EmailTaken(ref email) if email == "fay@example.com"));
    assert_eq!(err.status_code(), 400);

    let invalid = users
        .register(NewUser {
            username: "gus".to_string(),
            email: "not-an-email".to_string(),
            password_hash: "hash".to_string(),
        })
        .unwrap_err();
    assert!(matches!(invalid, RepoError::Validation(_)));

    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        users.resolve_principal(missing).unwrap_err(),
        RepoError::NotFound(EntityRef::User(id)) if id == missing
    ));
}

#[test]
fn api_response_envelope_shape() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "dee");
    let category = CategoryService::new(SqliteCategoryRepository::new(&conn))
        .create("travel")
        .unwrap();
    let projects = ProjectService::new(SqliteProjectRepository::new(&conn));
    let project = projects
        .create_project(&owner, new_project(category.id, "Offsite", 100))
        .unwrap();

    let ok = serde_json::to_value(ApiResponse::ok("project created", &project)).unwrap();
    assert_eq!(ok["code"], 200);
    assert_eq!(ok["message"], "project created");
    assert_eq!(ok["data"]["budget"], 100);
    assert_eq!(ok["data"]["id"], project.id.to_string());

    let err = projects
        .create_item(
            &owner,
            NewItem {
                project_id: project.id,
                name: "hotel".to_string(),
                budget_item: 500,
                status: false,
            },
        )
        .unwrap_err();
    let rejected = serde_json::to_value(ApiResponse::<()>::from_error(&err)).unwrap();
    assert_eq!(rejected["code"], 400);
    assert!(rejected["message"]
        .as_str()
        .unwrap()
        .starts_with("insufficient budget"));
    assert!(rejected.get("data").is_none());

    let done = serde_json::to_value(ApiResponse::<()>::done("project deleted")).unwrap();
    assert_eq!(done, json!({ "code": 200, "message": "project deleted" }));

    let user_json = serde_json::to_value(
        UserService::new(SqliteUserRepository::new(&conn))
            .get(owner.user_id())
            .unwrap(),
    )
    .unwrap();
    assert!(user_json.get("password_hash").is_none());
}
