//! Registration and session endpoints

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use common::model::Account;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::api::response::ApiResponse;
use crate::error::{ApiError, ErrorResponse};
use crate::session::{expired_session_cookie, session_cookie, AuthenticatedAccount};
use crate::AppState;

/// Registration request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Unique username, 3 to 32 characters
    #[schema(example = "alice")]
    pub username: String,
}

/// Login request; there are no passwords
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice")]
    pub username: String,
}

/// An account and its new session token
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub account: Account,
    /// Bearer token; also set as the `session` cookie
    pub token: String,
}

/// Register a new account and open a session
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 400, description = "Invalid or taken username", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    request: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = request.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let account = state.account_service.register(&request.username).await?;
    let token = state.sessions.issue(account.id);

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, session_cookie(&token))],
        ApiResponse::new(SessionResponse { account, token }),
    ))
}

/// Open a new session for an existing account
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = SessionResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Unknown username", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = request.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let account = state
        .account_service
        .find_by_username(&request.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(format!("Unknown username: {}", request.username.trim())))?;
    let token = state.sessions.issue(account.id);
    info!("Account {} logged in", account.id);

    Ok((
        [(SET_COOKIE, session_cookie(&token))],
        ApiResponse::new(SessionResponse { account, token }),
    ))
}

/// Revoke the current session
#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Session revoked"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedAccount,
) -> impl IntoResponse {
    state.sessions.revoke(&auth.token);
    info!("Account {} logged out", auth.account_id);

    (
        [(SET_COOKIE, expired_session_cookie())],
        ApiResponse::new(serde_json::json!({ "message": "Logged out" })),
    )
}

/// The authenticated account
#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "Current account", body = Account),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn current_user(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedAccount,
) -> Result<ApiResponse<Account>, ApiError> {
    let account = state.account_service.get_account(auth.account_id).await?;
    Ok(ApiResponse::new(account))
}
