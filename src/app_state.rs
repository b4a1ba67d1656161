//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;

use crate::{Error, db::initialize, pagination::PaginationConfig};

#[derive(Clone)]
struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,

    /// The config that controls how list endpoints page data.
    pub pagination_config: PaginationConfig,

    token_keys: TokenKeys,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models. `token_secret` signs and verifies access tokens.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        token_secret: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            pagination_config,
            token_keys: TokenKeys {
                encoding_key: EncodingKey::from_secret(token_secret.as_ref()),
                decoding_key: DecodingKey::from_secret(token_secret.as_ref()),
            },
        })
    }

    /// The key for signing access tokens.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.token_keys.encoding_key
    }

    /// The key for verifying access token signatures.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.token_keys.decoding_key
    }

    /// Lock the database connection for the duration of a request handler.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLock] if the lock is poisoned.
    pub fn lock_connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, Error> {
        self.db_connection.lock().map_err(|_| Error::DatabaseLock)
    }
}

impl FromRef<AppState> for PaginationConfig {
    fn from_ref(state: &AppState) -> Self {
        state.pagination_config.clone()
    }
}
