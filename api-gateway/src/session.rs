//! Session tokens
//!
//! Tokens are opaque random strings mapped to an account ID. They are
//! accepted from an `Authorization: Bearer` header or a `session` cookie.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// In-process token to account mapping
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Uuid>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token for an account
    pub fn issue(&self, account_id: Uuid) -> String {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        self.sessions.insert(token.clone(), account_id);
        token
    }

    /// Account a token belongs to
    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        self.sessions.get(token).map(|entry| *entry.value())
    }

    /// Revoke a token; false if it was not live
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is live
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// `Set-Cookie` value for a new session
pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

/// `Set-Cookie` value that clears the session cookie
pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Pull the session token out of request headers
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

/// The account behind the request's session token
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account_id: Uuid,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedAccount {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

        let account_id = state
            .sessions
            .resolve(&token)
            .ok_or_else(|| ApiError::Unauthorized("Unknown or expired session".to_string()))?;

        debug!("Request authenticated for account {}", account_id);
        Ok(Self { account_id, token })
    }
}
