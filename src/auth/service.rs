use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::password;
use crate::db::models::{LoginEvent, NewUser, User};
use crate::db::{CredentialStore, StoreError};
use crate::error::{AppError, AppResult};

/// How many times a login retries after losing a login-history write race.
const HISTORY_WRITE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(rename = "userName", default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "password2", default)]
    pub password_confirmation: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(rename = "userName", default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            hash_cost: password::HASH_COST,
        }
    }

    /// Lower the bcrypt cost; only sensible in tests.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub async fn register(&self, candidate: Registration) -> AppResult<User> {
        let user_name = candidate.user_name.trim().to_string();
        if user_name.is_empty() {
            return Err(AppError::Validation("User Name is required".into()));
        }
        if candidate.password.is_empty() {
            return Err(AppError::Validation("Password is required".into()));
        }
        if candidate.password != candidate.password_confirmation {
            return Err(AppError::Validation("Passwords do not match".into()));
        }

        let password_hash =
            password::hash_password(candidate.password, self.hash_cost).await?;

        let new_user = NewUser {
            user_name,
            password_hash,
            email: candidate.email.trim().to_string(),
        };

        match self.store.insert(&new_user).await {
            Ok(user) => {
                tracing::info!(user = %user.user_name, "Registered user");
                Ok(user)
            }
            Err(StoreError::Conflict(_)) => {
                Err(AppError::Conflict("User Name already taken".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Verify credentials and record the login. Returns the user with the new
    /// history entry appended.
    pub async fn login(&self, credentials: Credentials, client_agent: &str) -> AppResult<User> {
        let user_name = credentials.user_name.trim();
        let user = self.get_user(user_name).await?;

        let matches =
            password::verify_password(credentials.password, user.password_hash.clone()).await?;
        if !matches {
            tracing::info!(user = %user_name, "Rejected login: bad password");
            return Err(AppError::Auth(format!(
                "Incorrect password for user: {user_name}"
            )));
        }

        let event = LoginEvent {
            date_time: Utc::now(),
            user_agent: client_agent.to_string(),
        };

        let mut user = user;
        for attempt in 1..=HISTORY_WRITE_ATTEMPTS {
            let mut history = user.login_history.clone();
            history.push(event.clone());

            if self
                .store
                .replace_login_history(&user.user_name, &history, user.version)
                .await?
            {
                user.login_history = history;
                user.version += 1;
                tracing::info!(user = %user.user_name, "User logged in");
                return Ok(user);
            }

            tracing::debug!(user = %user.user_name, attempt, "Login history changed underneath us, reloading");
            user = self.get_user(&user.user_name).await?;
        }

        Err(StoreError::StaleWrite(user.user_name).into())
    }

    pub async fn get_user(&self, user_name: &str) -> AppResult<User> {
        self.store
            .find(user_name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Unable to find user: {user_name}")))
    }

    pub async fn user_count(&self) -> AppResult<i64> {
        Ok(self.store.count().await?)
    }
}
