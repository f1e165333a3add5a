//! Order execution endpoint

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use common::model::{OrderRequest, Transaction};

use crate::api::response::ApiResponse;
use crate::error::{ApiError, ErrorResponse};
use crate::session::AuthenticatedAccount;
use crate::AppState;

/// Execute a market order at the current quote
///
/// The body is `{symbol, side, quantity}`; `type` is accepted in place of
/// `side`. `meta.cash_balance` carries the balance after execution.
#[utoipa::path(
    post,
    path = "/api/trade",
    request_body = OrderRequest,
    responses(
        (status = 201, description = "Order executed", body = Transaction),
        (status = 400, description = "Invalid order, insufficient funds or holdings", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 503, description = "Quote unavailable or account busy; safe to retry", body = ErrorResponse)
    ),
    tag = "trade"
)]
pub async fn execute_trade(
    State(state): State<Arc<AppState>>,
    auth: AuthenticatedAccount,
    order: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<(StatusCode, ApiResponse<Transaction>), ApiError> {
    let Json(order) = order.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let executed = state.account_service.execute_order(auth.account_id, &order).await?;

    let meta = serde_json::json!({ "cash_balance": executed.new_balance });
    Ok((StatusCode::CREATED, ApiResponse::with_extra(executed.transaction, meta)))
}
