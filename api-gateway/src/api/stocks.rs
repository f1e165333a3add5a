//! Quote and price history endpoints

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use market_data::{PricePoint, Quote};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::response::{ApiListResponse, ApiResponse};
use crate::error::{ApiError, ErrorResponse};
use crate::AppState;

/// History window
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Days before today to include, 1 to 365 (default 30)
    pub days: Option<u32>,
}

/// Current quote; every read advances the mock feed
#[utoipa::path(
    get,
    path = "/api/stocks/{symbol}",
    params(
        ("symbol" = String, Path, description = "Ticker symbol, case-insensitive")
    ),
    responses(
        (status = 200, description = "Current quote", body = Quote),
        (status = 400, description = "Malformed symbol", body = ErrorResponse),
        (status = 503, description = "No quote for the symbol", body = ErrorResponse)
    ),
    tag = "stocks"
)]
pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<ApiResponse<Quote>, ApiError> {
    let quote = state.market_data_service.get_quote(&symbol).await?;
    Ok(ApiResponse::new(quote))
}

/// Daily closes ending today, oldest first
#[utoipa::path(
    get,
    path = "/api/stocks/{symbol}/history",
    params(
        ("symbol" = String, Path, description = "Ticker symbol, case-insensitive"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "Price history", body = [PricePoint]),
        (status = 400, description = "Malformed symbol or window", body = ErrorResponse),
        (status = 503, description = "No quote for the symbol", body = ErrorResponse)
    ),
    tag = "stocks"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<ApiListResponse<PricePoint>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let history = state.market_data_service.get_history(&symbol, query.days).await?;
    Ok(ApiListResponse::new(history))
}
