//! Route handlers for registration, login, and the current-user profile.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::token::issue_token,
    user::{self, Theme, UserID},
    validation::{FieldErrors, check_email, check_length},
};

/// The JSON body for `POST /auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub theme_preference: Option<Theme>,
}

impl RegisterInput {
    fn validate(&self) -> Result<(), Error> {
        let mut errors = FieldErrors::new();

        check_length(&mut errors, "username", &self.username, 3, 80);
        check_email(&mut errors, "email", &self.email);
        check_length(&mut errors, "password", &self.password, 6, 72);

        errors.finish()
    }
}

/// The JSON body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// The JSON body for `PUT /auth/me`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileInput {
    #[serde(default)]
    pub theme_preference: Option<Theme>,
}

/// A route handler for registering a new user.
///
/// Responds with 201 and an access token on success, 400 on validation
/// failure, and 409 when the username or email is already taken.
pub async fn register_endpoint(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<Response, Error> {
    input.validate()?;

    let password_hash = bcrypt::hash(&input.password, bcrypt::DEFAULT_COST)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;
    let created = user::create_user(
        &input.username,
        &input.email,
        &password_hash,
        input.theme_preference.unwrap_or_default(),
        &sql_transaction,
    )?;
    sql_transaction.commit()?;

    let access_token = issue_token(created.id, state.encoding_key())?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": created,
            "access_token": access_token,
        })),
    )
        .into_response())
}

/// A route handler for logging in with an email and password.
///
/// Responds with an access token on success. A wrong email and a wrong
/// password both produce the same 401 so callers cannot probe for accounts.
pub async fn log_in_endpoint(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> Result<Response, Error> {
    let user = {
        let connection = state.lock_connection()?;
        user::get_user_by_email(&input.email, &connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            other => other,
        })?
    };

    let password_matches = bcrypt::verify(&input.password, &user.password_hash)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !password_matches {
        return Err(Error::InvalidCredentials);
    }

    let access_token = issue_token(user.id, state.encoding_key())?;

    Ok(Json(json!({
        "message": "Login successful",
        "user": user,
        "access_token": access_token,
    }))
    .into_response())
}

/// A route handler for fetching the authenticated user's profile.
pub async fn get_profile_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state.lock_connection()?;
    let user = user::get_user_by_id(user_id, &connection)?;

    Ok(Json(json!({"user": user})).into_response())
}

/// A route handler for updating the authenticated user's profile.
pub async fn update_profile_endpoint(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserID>,
    Json(input): Json<UpdateProfileInput>,
) -> Result<Response, Error> {
    let mut connection = state.lock_connection()?;
    let sql_transaction = connection.transaction()?;

    if let Some(theme_preference) = input.theme_preference {
        user::update_theme_preference(user_id, theme_preference, &sql_transaction)?;
    }

    let user = user::get_user_by_id(user_id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": user,
    }))
    .into_response())
}
