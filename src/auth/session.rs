//! Signed client-side sessions.
//!
//! The cookie value is an HS256 JWT carrying the user and an `exp` claim.
//! Nothing is kept server side: logging out clears the cookie and expiry is
//! carried inside the signed payload. A session has a fixed lifetime and is
//! pushed out whenever a request arrives inside the final "active" window.

use axum::extract::{Request, State};
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::state::AppState;

/// What a session remembers about the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_name: String,
    pub email: String,
}

/// JWT claims stored in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

#[derive(Clone)]
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    cookie_name: String,
    duration: Duration,
    active: Duration,
}

impl SessionCodec {
    pub fn new(secret: &[u8], config: &SessionConfig) -> Self {
        // HS256, exp checked with no grace period
        let mut validation = Validation::default();
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            cookie_name: config.cookie_name.clone(),
            duration: Duration::minutes(config.duration_minutes),
            active: Duration::minutes(config.active_minutes),
        }
    }

    /// Uses the configured secret, or a random one that only lives as long as
    /// this process.
    pub fn from_config(config: &SessionConfig) -> Self {
        match config.secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => Self::new(secret.as_bytes(), config),
            None => {
                tracing::warn!(
                    "No session secret configured; sessions will not survive a restart"
                );
                let secret: [u8; 32] = rand::thread_rng().gen();
                Self::new(&secret, config)
            }
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn start(&self, user: SessionUser, now: DateTime<Utc>) -> Session {
        Session {
            user,
            exp: (now + self.duration).timestamp(),
        }
    }

    /// Push the expiry out when less than the active window remains.
    /// Returns whether the session changed.
    pub fn refresh(&self, session: &mut Session, now: DateTime<Utc>) -> bool {
        let remaining = session.exp - now.timestamp();
        if remaining < self.active.num_seconds() {
            session.exp = (now + self.active).timestamp();
            true
        } else {
            false
        }
    }

    pub fn encode(&self, session: &Session) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::default(), session, &self.encoding)
    }

    /// Verifies the signature and the `exp` claim against the current time.
    pub fn decode(&self, value: &str) -> Result<Session, jsonwebtoken::errors::Error> {
        Ok(decode::<Session>(value, &self.decoding, &self.validation)?.claims)
    }

    pub fn set_cookie(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let max_age = (session.exp - now.timestamp()).max(0);
        Ok(format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            self.cookie_name,
            self.encode(session)?,
            max_age
        ))
    }

    pub fn clear_cookie(&self) -> String {
        format!(
            "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
            self.cookie_name
        )
    }
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}

/// Decodes the session cookie into a request extension and re-issues the
/// cookie when the sliding window moved the expiry.
pub async fn session_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let codec = &state.sessions;
    let now = Utc::now();
    let mut reissue = None;

    if let Some(raw) = cookie_value(req.headers(), codec.cookie_name()) {
        match codec.decode(raw) {
            Ok(mut session) => {
                if codec.refresh(&mut session, now) {
                    match codec.set_cookie(&session, now) {
                        Ok(cookie) => reissue = Some(cookie),
                        Err(e) => tracing::warn!("Could not re-issue session cookie: {}", e),
                    }
                }
                req.extensions_mut().insert(session);
            }
            Err(e) => tracing::debug!("Ignoring session cookie: {}", e),
        }
    }

    let mut response = next.run(req).await;

    if let Some(cookie) = reissue {
        let prefix = format!("{}=", codec.cookie_name());
        let handler_set_cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.starts_with(&prefix));
        if !handler_set_cookie {
            if let Ok(value) = cookie.parse() {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
    }

    response
}
