//! Defines the app level error type and its conversion to JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::validation::FieldErrors;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more input fields failed validation.
    ///
    /// Carries every failing field so the client can fix all problems at
    /// once instead of one round-trip at a time.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// The request did not carry a bearer token.
    #[error("missing bearer token")]
    MissingToken,

    /// The bearer token could not be decoded, its signature did not match, or
    /// its subject was not a valid user identifier.
    #[error("invalid bearer token")]
    InvalidToken,

    /// The bearer token's expiry is in the past.
    #[error("expired bearer token")]
    ExpiredToken,

    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// A token could not be created for a newly authenticated user.
    ///
    /// The underlying error should only be logged on the server, never shown
    /// to the client.
    #[error("could not create a token: {0}")]
    TokenCreation(String),

    /// An unexpected error occurred in the underlying password hashing
    /// library. The error string should only be logged on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested resource was not found.
    ///
    /// This is also returned when the resource exists but belongs to another
    /// user, so that callers cannot probe for other users' data.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The resource is visible to the caller but their role does not permit
    /// the attempted operation (e.g., a regular group member trying to add
    /// members).
    #[error("operation not permitted: {0}")]
    Forbidden(&'static str),

    /// The request collided with existing data, e.g., a duplicate category
    /// name or an existing group membership.
    #[error("conflict: {0}")]
    Conflict(&'static str),

    /// A category could not be deleted because transactions still reference
    /// it.
    #[error("category is referenced by {transaction_count} transaction(s)")]
    CategoryInUse {
        /// The number of transactions that reference the category.
        transaction_count: u64,
    },

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 =>
            {
                if desc.contains("user.username") {
                    Error::Conflict("a user with this username already exists")
                } else if desc.contains("user.email") {
                    Error::Conflict("a user with this email already exists")
                } else if desc.contains("category.") {
                    Error::Conflict("a category with this name already exists")
                } else if desc.contains("group_member.") {
                    Error::Conflict("the user is already a member of this group")
                } else if desc.contains("budget.") {
                    Error::Conflict("a budget for this category and period already exists")
                } else {
                    Error::SqlError(rusqlite::Error::SqliteFailure(
                        sql_error,
                        Some(desc.to_owned()),
                    ))
                }
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed, meaning
            // the request referenced a row that does not exist.
            rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 787 => {
                Error::NotFound
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => Error::SqlError(error),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Error::Validation(field_errors) => (
                StatusCode::BAD_REQUEST,
                json!({"error": "Validation error", "messages": field_errors}),
            ),
            Error::MissingToken => (
                StatusCode::UNAUTHORIZED,
                json!({"error": "Missing token", "message": "Authorization token required"}),
            ),
            Error::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                json!({"error": "Invalid token", "message": "Please log in again"}),
            ),
            Error::ExpiredToken => (
                StatusCode::UNAUTHORIZED,
                json!({"error": "Token has expired", "message": "Please log in again"}),
            ),
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({"error": "Invalid credentials", "message": "Invalid email or password"}),
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                json!({"error": "Not found", "message": "Resource not found"}),
            ),
            Error::Forbidden(reason) => (
                StatusCode::FORBIDDEN,
                json!({"error": "Forbidden", "message": reason}),
            ),
            Error::Conflict(reason) => (
                StatusCode::CONFLICT,
                json!({"error": "Conflict", "message": reason}),
            ),
            Error::CategoryInUse { transaction_count } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "Cannot delete category with existing transactions",
                    "transaction_count": transaction_count,
                }),
            ),
            // Errors not handled above are not intended to be shown to the
            // client. Any SQL transaction that produced them has already been
            // rolled back by the time the response is built.
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "Internal server error", "message": "Something went wrong"}),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::validation::FieldErrors;

    use super::Error;

    #[test]
    fn query_returned_no_rows_maps_to_not_found() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();

        assert_eq!(error, Error::NotFound);
    }

    #[test]
    fn validation_error_responds_with_bad_request() {
        let mut field_errors = FieldErrors::new();
        field_errors.add("amount", "Amount must be greater than 0");

        let response = Error::Validation(field_errors).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn category_in_use_responds_with_conflict() {
        let response = Error::CategoryInUse {
            transaction_count: 3,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
