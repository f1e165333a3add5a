//! Trend prediction endpoint

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use market_data::Prediction;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::response::ApiResponse;
use crate::error::{ApiError, ErrorResponse};
use crate::AppState;

/// Prediction request
#[derive(Debug, Deserialize, ToSchema)]
pub struct PredictRequest {
    /// Ticker symbol
    #[schema(example = "AAPL")]
    pub symbol: String,
    /// Days of history to fit, 2 to 365 (default 50)
    pub days: Option<u32>,
}

/// Least-squares trend over recent history and a next-day estimate
#[utoipa::path(
    post,
    path = "/api/predict",
    request_body = PredictRequest,
    responses(
        (status = 200, description = "Fitted trend", body = Prediction),
        (status = 400, description = "Malformed symbol or window", body = ErrorResponse),
        (status = 503, description = "No quote for the symbol", body = ErrorResponse)
    ),
    tag = "prediction"
)]
pub async fn predict(
    State(state): State<Arc<AppState>>,
    request: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<ApiResponse<Prediction>, ApiError> {
    let Json(request) = request.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let prediction = state
        .market_data_service
        .predict(&request.symbol, request.days)
        .await?;
    Ok(ApiResponse::new(prediction))
}
