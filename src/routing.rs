//! Application router configuration with protected and unprotected route
//! definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::json;

use crate::{
    AppState,
    analytics::{by_category_endpoint, insights_endpoint, summary_endpoint, trend_endpoint},
    auth::{
        auth_guard, get_profile_endpoint, log_in_endpoint, register_endpoint,
        update_profile_endpoint,
    },
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budget_endpoint,
        list_budgets_endpoint, update_budget_endpoint,
    },
    category::{
        create_category_endpoint, delete_category_endpoint, get_category_endpoint,
        list_categories_endpoint, update_category_endpoint,
    },
    endpoints,
    goal::{
        create_goal_endpoint, delete_goal_endpoint, get_goal_endpoint, list_goals_endpoint,
        update_goal_endpoint,
    },
    group::{
        add_member_endpoint, create_group_endpoint, delete_group_endpoint, get_group_endpoint,
        list_groups_endpoint, list_members_endpoint, remove_member_endpoint, update_group_endpoint,
    },
    logging::logging_middleware,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transactions_endpoint, transaction_calendar_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::REGISTER, post(register_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint));

    let protected_routes = Router::new()
        .route(
            endpoints::ME,
            get(get_profile_endpoint).put(update_profile_endpoint),
        )
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .put(update_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_CALENDAR,
            get(transaction_calendar_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(list_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .put(update_budget_endpoint)
                .delete(delete_budget_endpoint),
        )
        .route(
            endpoints::GOALS,
            get(list_goals_endpoint).post(create_goal_endpoint),
        )
        .route(
            endpoints::GOAL,
            get(get_goal_endpoint)
                .put(update_goal_endpoint)
                .delete(delete_goal_endpoint),
        )
        .route(
            endpoints::GROUPS,
            get(list_groups_endpoint).post(create_group_endpoint),
        )
        .route(
            endpoints::GROUP,
            get(get_group_endpoint)
                .put(update_group_endpoint)
                .delete(delete_group_endpoint),
        )
        .route(
            endpoints::GROUP_MEMBERS,
            get(list_members_endpoint).post(add_member_endpoint),
        )
        .route(endpoints::GROUP_MEMBER, delete(remove_member_endpoint))
        .route(endpoints::ANALYTICS_SUMMARY, get(summary_endpoint))
        .route(endpoints::ANALYTICS_BY_CATEGORY, get(by_category_endpoint))
        .route(endpoints::ANALYTICS_TREND, get(trend_endpoint))
        .route(endpoints::ANALYTICS_INSIGHTS, get(insights_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .layer(middleware::from_fn(logging_middleware))
        .fallback(get_json_404)
        .with_state(state)
}

/// A route handler that reports the server is up.
async fn get_health() -> Response {
    Json(json!({"status": "healthy"})).into_response()
}

/// Every unknown path gets a JSON 404 rather than an empty body.
async fn get_json_404() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not found",
            "message": "The requested resource was not found",
        })),
    )
        .into_response()
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{AppState, endpoints, pagination::PaginationConfig};

    use super::build_router;

    fn get_test_server() -> TestServer {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = AppState::new(db_connection, "foobar", PaginationConfig::default())
            .expect("Could not create app state.");

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn health_endpoint_needs_no_token() {
        let server = get_test_server();

        let response = server.get(endpoints::HEALTH).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], json!("healthy"));
    }

    #[tokio::test]
    async fn unknown_paths_get_a_json_404() {
        let server = get_test_server();

        let response = server.get("/api/v1/does-not-exist").await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()["error"], json!("Not found"));
    }

    #[tokio::test]
    async fn protected_routes_reject_anonymous_requests() {
        let server = get_test_server();

        for path in [
            endpoints::CATEGORIES,
            endpoints::TRANSACTIONS,
            endpoints::BUDGETS,
            endpoints::GOALS,
            endpoints::GROUPS,
            endpoints::ANALYTICS_SUMMARY,
        ] {
            server
                .get(path)
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }
    }
}
