//! Portfolio endpoints

use std::sync::Arc;

use account_service::Portfolio;
use axum::extract::State;
use common::model::Transaction;

use crate::api::response::{ApiListResponse, ApiResponse};
use crate::error::{ApiError, ErrorResponse};
use crate::session::AuthenticatedAccount;
use crate::AppState;

/// Holdings valued at current quotes, with account totals
#[utoipa::path(
    get,
    path = "/api/portfolio",
    responses(
        (status = 200, description = "Valued portfolio", body = Portfolio),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 503, description = "A quote is unavailable", body = ErrorResponse)
    ),
    tag = "portfolio"
)]
pub async fn get_portfolio(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedAccount,
) -> Result<ApiResponse<Portfolio>, ApiError> {
    let portfolio = state.account_service.get_portfolio(auth.account_id).await?;
    Ok(ApiResponse::new(portfolio))
}

/// Executed orders, oldest first
#[utoipa::path(
    get,
    path = "/api/portfolio/history",
    responses(
        (status = 200, description = "Transaction history", body = [Transaction]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "portfolio"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedAccount,
) -> Result<ApiListResponse<Transaction>, ApiError> {
    let transactions = state.account_service.get_transactions(auth.account_id).await?;
    Ok(ApiListResponse::new(transactions))
}

/// Executed orders, oldest first; same body as `/api/portfolio/history`
#[utoipa::path(
    get,
    path = "/api/transactions",
    responses(
        (status = 200, description = "Transaction history", body = [Transaction]),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "portfolio"
)]
pub async fn get_transactions(
    state: State<Arc<AppState>>,
    auth: AuthenticatedAccount,
) -> Result<ApiListResponse<Transaction>, ApiError> {
    get_history(state, auth).await
}
