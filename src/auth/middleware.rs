//! Authentication middleware that resolves the bearer token on protected
//! routes.

use axum::{
    extract::{FromRef, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::DecodingKey;

use crate::{AppState, Error, auth::token::resolve_token, user::UserID};

/// The state needed by the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key for verifying token signatures.
    pub decoding_key: DecodingKey,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.decoding_key().clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token in the
/// `Authorization` header.
///
/// On success the resolved user ID is placed into the request and the request
/// executed normally; otherwise a 401 JSON error is returned.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = match user_id_from_request(&request, &state.decoding_key) {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    request.extensions_mut().insert(user_id);

    next.run(request).await
}

fn user_id_from_request(request: &Request, decoding_key: &DecodingKey) -> Result<UserID, Error> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(Error::MissingToken)?;
    let header = header.to_str().map_err(|_| Error::InvalidToken)?;
    let token = header.strip_prefix("Bearer ").ok_or(Error::MissingToken)?;

    resolve_token(token, decoding_key)
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{Extension, Json, Router, http::StatusCode, middleware, routing::get};
    use axum_test::TestServer;
    use jsonwebtoken::{DecodingKey, EncodingKey};
    use serde_json::json;

    use crate::{
        auth::token::issue_token,
        user::UserID,
    };

    use super::{AuthState, auth_guard};

    const SECRET: &[u8] = b"test secret";
    const TEST_PROTECTED_ROUTE: &str = "/protected";

    async fn test_handler(Extension(user_id): Extension<UserID>) -> Json<serde_json::Value> {
        Json(json!({"user_id": user_id}))
    }

    fn get_test_server() -> TestServer {
        let state = AuthState {
            decoding_key: DecodingKey::from_secret(SECRET),
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn request_without_token_gets_unauthorized() {
        let server = get_test_server();

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn request_with_garbage_token_gets_unauthorized() {
        let server = get_test_server();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_header("authorization", "Bearer garbage")
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn request_with_valid_token_reaches_the_handler() {
        let server = get_test_server();
        let token = issue_token(UserID::new(7), &EncodingKey::from_secret(SECRET))
            .expect("Could not issue token");

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_header("authorization", format!("Bearer {token}"))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["user_id"], json!(7));
    }
}
