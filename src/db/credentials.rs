// Credential store: one row per user, login history kept as a JSON document
use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use crate::db::models::{LoginEvent, NewUser, User};
use crate::db::StoreError;
use crate::state::DbPool;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new user. A taken name surfaces as `StoreError::Conflict`.
    async fn insert(&self, user: &NewUser) -> Result<User, StoreError>;

    async fn find(&self, user_name: &str) -> Result<Option<User>, StoreError>;

    /// Write `history` only if the stored version still equals `expected_version`.
    /// Returns false when another writer got there first.
    async fn replace_login_history(
        &self,
        user_name: &str,
        history: &[LoginEvent],
        expected_version: i64,
    ) -> Result<bool, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;
}

pub struct SqliteCredentialStore {
    pool: DbPool,
}

impl SqliteCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<(User, String)> {
    Ok((
        User {
            user_name: row.get(0)?,
            password_hash: row.get(1)?,
            email: row.get(2)?,
            login_history: Vec::new(),
            version: row.get(4)?,
        },
        row.get(3)?,
    ))
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn insert(&self, user: &NewUser) -> Result<User, StoreError> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO users (user_name, password_hash, email, login_history, version)
             VALUES (?1, ?2, ?3, '[]', 0)",
            params![user.user_name, user.password_hash, user.email],
        )
        .map_err(|e| StoreError::from_insert(e, &user.user_name))?;

        Ok(User {
            user_name: user.user_name.clone(),
            password_hash: user.password_hash.clone(),
            email: user.email.clone(),
            login_history: Vec::new(),
            version: 0,
        })
    }

    async fn find(&self, user_name: &str) -> Result<Option<User>, StoreError> {
        let conn = self.pool.get()?;

        let found = conn
            .query_row(
                "SELECT user_name, password_hash, email, login_history, version
                 FROM users WHERE user_name = ?1",
                params![user_name],
                user_from_row,
            )
            .optional()?;

        match found {
            Some((mut user, history_json)) => {
                user.login_history = serde_json::from_str(&history_json)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    async fn replace_login_history(
        &self,
        user_name: &str,
        history: &[LoginEvent],
        expected_version: i64,
    ) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let history_json = serde_json::to_string(history)?;

        let rows = conn.execute(
            "UPDATE users SET login_history = ?1, version = version + 1
             WHERE user_name = ?2 AND version = ?3",
            params![history_json, user_name, expected_version],
        )?;

        Ok(rows == 1)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let conn = self.pool.get()?;
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }
}
