//! The user model, the user table, and queries over it.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A newtype wrapper for integer user IDs.
///
/// This disambiguates user IDs from other row IDs at compile time, and marks
/// the one place a raw token subject is turned into a trusted identity: the
/// auth middleware parses the string subject once, and only the typed value
/// flows through the rest of the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for UserID {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.0.into())
    }
}

impl FromSql for UserID {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_i64().map(UserID::new)
    }
}

/// The color theme a user prefers for the client UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl ToSql for Theme {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Theme {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A user of the application.
///
/// The password hash is never serialized into responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The display name the user registered with.
    pub username: String,
    /// The email address the user logs in with.
    pub email: String,
    /// The bcrypt hash of the user's password.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// The color theme the user prefers for the client UI.
    pub theme_preference: Theme,
    /// When the account was created, as `YYYY-MM-DD HH:MM:SS` UTC.
    pub created_at: String,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            theme_preference TEXT NOT NULL DEFAULT 'light',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_user_email ON user(email);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        theme_preference: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const USER_COLUMNS: &str = "id, username, email, password_hash, theme_preference, created_at";

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns [Error::Conflict] if the username or email is already taken, or
/// [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    username: &str,
    email: &str,
    password_hash: &str,
    theme_preference: Theme,
    connection: &Connection,
) -> Result<User, Error> {
    let created_at = crate::date_format::now_timestamp();

    connection.execute(
        "INSERT INTO user (username, email, password_hash, theme_preference, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (username, email, password_hash, theme_preference, &created_at),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username: username.to_owned(),
        email: email.to_owned(),
        password_hash: password_hash.to_owned(),
        theme_preference,
        created_at,
    })
}

/// Get the user with an ID equal to `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered
/// user, or [Error::SqlError] if there was an error accessing the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id)], map_row)
        .map_err(|error| error.into())
}

/// Get the user with the given email address.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has this email, or [Error::SqlError]
/// if there was an error accessing the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE email = :email"
        ))?
        .query_row(&[(":email", &email)], map_row)
        .map_err(|error| error.into())
}

/// Update the theme preference of the user `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered
/// user.
pub fn update_theme_preference(
    user_id: UserID,
    theme_preference: Theme,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET theme_preference = ?1 WHERE id = ?2",
        (theme_preference, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
