//! Route handlers for creating and managing categories.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, DatabaseID, Error,
    category::{
        db,
        domain::{DEFAULT_COLOR, Kind},
    },
    user::UserID,
    validation::{FieldErrors, check_hex_color, check_length},
};

/// The JSON body for `POST /categories`.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub kind: Kind,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl CreateCategoryInput {
    fn validate(&self) -> Result<(), Error> {
        let mut errors = FieldErrors::new();

        check_length(&mut errors, "name", &self.name, 1, 100);
        if let Some(color) = &self.color {
            check_hex_color(&mut errors, "color", color);
        }
        if let Some(icon) = &self.icon {
            check_length(&mut errors, "icon", icon, 1, 50);
        }

        errors.finish()
    }
}

/// The JSON body for `PUT /categories/{category_id}`. Absent fields are left
/// unchanged; an explicit `null` icon clears it.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<Kind>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "crate::patch::double_option")]
    pub icon: Option<Option<String>>,
}

impl UpdateCategoryInput {
    fn validate(&self) -> Result<(), Error> {
        let mut errors = FieldErrors::new();

        if let Some(name) = &self.name {
            check_length(&mut errors, "name", name, 1, 100);
        }
        if let Some(color) = &self.color {
            check_hex_color(&mut errors, "color", color);
        }
        if let Some(Some(icon)) = &self.icon {
            check_length(&mut errors, "icon", icon, 1, 50);
        }

        errors.finish()
    }
}

/// The query parameters for `GET /categories`.
#[derive(Debug, Default, Deserialize)]
pub struct ListCategoriesParams {
    #[serde(default)]
    pub kind: Option<Kind>,
}

/// A route handler for creating a new category.
pub async fn create_category_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(input): Json<CreateCategoryInput>,
) -> Result<Response, Error> {
    input.validate()?;

    let connection = state.lock_connection()?;
    let category = db::create_category(
        user_id,
        &input.name,
        input.kind,
        input.color.as_deref().unwrap_or(DEFAULT_COLOR),
        input.icon.as_deref(),
        &connection,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Category created successfully",
            "category": category,
        })),
    )
        .into_response())
}

/// A route handler for listing the user's categories, optionally filtered by
/// kind.
pub async fn list_categories_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<ListCategoriesParams>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    let categories = db::list_categories(user_id, params.kind, &connection)?;

    Ok(Json(json!({"categories": categories})).into_response())
}

/// A route handler for fetching a single category.
pub async fn get_category_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    let category = db::get_category(category_id, user_id, &connection)?;

    Ok(Json(json!({"category": category})).into_response())
}

/// A route handler for updating a category.
///
/// Changing the kind of a category that transactions already reference is
/// rejected, since those transactions would no longer match their category.
pub async fn update_category_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<DatabaseID>,
    Json(input): Json<UpdateCategoryInput>,
) -> Result<Response, Error> {
    input.validate()?;

    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;

    let mut category = db::get_category(category_id, user_id, &sql_transaction)?;

    if let Some(kind) = input.kind
        && kind != category.kind
        && db::count_transactions(category.id, &sql_transaction)? > 0
    {
        return Err(Error::Conflict(
            "Cannot change the kind of a category that has transactions",
        ));
    }

    if let Some(name) = input.name {
        category.name = name;
    }
    if let Some(kind) = input.kind {
        category.kind = kind;
    }
    if let Some(color) = input.color {
        category.color = color;
    }
    if let Some(icon) = input.icon {
        category.icon = icon;
    }

    db::update_category(&category, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Json(json!({
        "message": "Category updated successfully",
        "category": category,
    }))
    .into_response())
}

/// A route handler for deleting a category.
///
/// Categories that transactions still reference cannot be deleted; the 409
/// response reports how many transactions are in the way.
pub async fn delete_category_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<DatabaseID>,
) -> Result<Response, Error> {
    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;
    db::delete_category(category_id, user_id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Json(json!({"message": "Category deleted successfully"})).into_response())
}

#[cfg(test)]
mod category_endpoint_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState, endpoints, pagination::PaginationConfig, routing::build_router,
    };

    fn get_test_server() -> TestServer {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = AppState::new(db_connection, "foobar", PaginationConfig::default())
            .expect("Could not create app state.");

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    async fn register_user(server: &TestServer, username: &str, email: &str) -> String {
        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "username": username,
                "email": email,
                "password": "averysafeandsecurepassword",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["access_token"]
            .as_str()
            .expect("register response should contain a token")
            .to_owned()
    }

    #[tokio::test]
    async fn create_category_applies_the_default_color() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;

        let response = server
            .post(endpoints::CATEGORIES)
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"name": "Groceries", "kind": "expense"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        assert_eq!(body["category"]["color"], json!("#6366f1"));
        assert_eq!(body["category"]["kind"], json!("expense"));
    }

    #[tokio::test]
    async fn category_name_may_be_up_to_100_characters() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;

        server
            .post(endpoints::CATEGORIES)
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"name": "x".repeat(100), "kind": "expense"}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::CATEGORIES)
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"name": "x".repeat(101), "kind": "expense"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["messages"]["name"].is_array());
    }

    #[tokio::test]
    async fn explicit_null_clears_the_icon() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;

        let category_id = server
            .post(endpoints::CATEGORIES)
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"name": "Groceries", "kind": "expense", "icon": "cart"}))
            .await
            .json::<Value>()["category"]["id"]
            .as_i64()
            .expect("category id should be a number");
        let path = endpoints::format_endpoint(endpoints::CATEGORY, category_id);

        let body = server
            .put(&path)
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"name": "Food"}))
            .await
            .json::<Value>();
        assert_eq!(body["category"]["icon"], json!("cart"));

        let body = server
            .put(&path)
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"icon": null}))
            .await
            .json::<Value>();
        assert_eq!(body["category"]["icon"], json!(null));
    }

    #[tokio::test]
    async fn create_category_rejects_a_bad_color() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;

        let response = server
            .post(endpoints::CATEGORIES)
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"name": "Groceries", "kind": "expense", "color": "red"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["messages"]["color"].is_array());
    }

    #[tokio::test]
    async fn categories_require_authentication() {
        let server = get_test_server();

        server
            .get(endpoints::CATEGORIES)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn another_users_category_is_not_found() {
        let server = get_test_server();
        let alice = register_user(&server, "alice", "alice@example.com").await;
        let bob = register_user(&server, "bob", "bob@example.com").await;

        let category_id = server
            .post(endpoints::CATEGORIES)
            .add_header("authorization", format!("Bearer {alice}"))
            .json(&json!({"name": "Groceries", "kind": "expense"}))
            .await
            .json::<Value>()["category"]["id"]
            .as_i64()
            .expect("category id should be a number");

        server
            .get(&endpoints::format_endpoint(endpoints::CATEGORY, category_id))
            .add_header("authorization", format!("Bearer {bob}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_categories_filters_by_kind() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;

        for (name, kind) in [("Groceries", "expense"), ("Salary", "income")] {
            server
                .post(endpoints::CATEGORIES)
                .add_header("authorization", format!("Bearer {token}"))
                .json(&json!({"name": name, "kind": kind}))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let body = server
            .get(&format!("{}?kind=income", endpoints::CATEGORIES))
            .add_header("authorization", format!("Bearer {token}"))
            .await
            .json::<Value>();

        let categories = body["categories"]
            .as_array()
            .expect("categories should be an array");
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0]["name"], json!("Salary"));
    }

    #[tokio::test]
    async fn delete_category_in_use_reports_the_transaction_count() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;

        let category_id = server
            .post(endpoints::CATEGORIES)
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"name": "Groceries", "kind": "expense"}))
            .await
            .json::<Value>()["category"]["id"]
            .as_i64()
            .expect("category id should be a number");

        for _ in 0..2 {
            server
                .post(endpoints::TRANSACTIONS)
                .add_header("authorization", format!("Bearer {token}"))
                .json(&json!({
                    "amount": "12.50",
                    "description": "Weekly shop",
                    "date": "2026-08-01",
                    "kind": "expense",
                    "category_id": category_id,
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = server
            .delete(&endpoints::format_endpoint(endpoints::CATEGORY, category_id))
            .add_header("authorization", format!("Bearer {token}"))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["transaction_count"], json!(2));
    }

    #[tokio::test]
    async fn changing_the_kind_of_a_used_category_conflicts() {
        let server = get_test_server();
        let token = register_user(&server, "alice", "alice@example.com").await;

        let category_id = server
            .post(endpoints::CATEGORIES)
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"name": "Groceries", "kind": "expense"}))
            .await
            .json::<Value>()["category"]["id"]
            .as_i64()
            .expect("category id should be a number");

        server
            .post(endpoints::TRANSACTIONS)
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({
                "amount": "12.50",
                "description": "Weekly shop",
                "date": "2026-08-01",
                "kind": "expense",
                "category_id": category_id,
            }))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .put(&endpoints::format_endpoint(endpoints::CATEGORY, category_id))
            .add_header("authorization", format!("Bearer {token}"))
            .json(&json!({"kind": "income"}))
            .await
            .assert_status(StatusCode::CONFLICT);
    }
}
