//! Market data models

use chrono::{DateTime, NaiveDate, Utc};
use common::decimal::Price;
use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

/// Current quote for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Quote {
    /// Ticker symbol
    pub symbol: String,
    /// Last price
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "151.20"))]
    pub price: Price,
    /// Price the change is measured against (session open)
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "150.00"))]
    pub reference_price: Price,
    /// `price - reference_price`
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "1.20"))]
    pub change: Price,
    /// Change in percent of the reference price
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "0.80"))]
    pub change_percent: Price,
    /// Quote time
    pub timestamp: DateTime<Utc>,
}

/// Daily closing price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct PricePoint {
    /// Trading day
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "2024-03-01"))]
    pub date: NaiveDate,
    /// Closing price
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "150.00"))]
    pub price: Price,
}

/// Least-squares trend over a price history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Prediction {
    /// Ticker symbol
    pub symbol: String,
    /// Observed history, oldest first
    pub actual: Vec<PricePoint>,
    /// Fitted trend line at each observed day
    pub predicted: Vec<PricePoint>,
    /// Day after the last observation
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "2024-03-02"))]
    pub next_day: NaiveDate,
    /// Trend line extrapolated to `next_day`
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "152.31"))]
    pub next_day_prediction: Price,
    /// Fitted price change per day
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub slope: Price,
    /// Fitted price at day zero
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub intercept: Price,
}
