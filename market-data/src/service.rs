//! Market data service: quotes, price history and trend prediction

use std::ops::RangeInclusive;
use std::sync::Arc;

use common::error::{Error, ErrorExt, Result};
use common::model::order::normalize_symbol;
use tracing::{debug, instrument};

use crate::models::{PricePoint, Prediction, Quote};
use crate::prediction::predict;
use crate::provider::QuoteProvider;

/// Default history window in days
pub const DEFAULT_HISTORY_DAYS: u32 = 30;

/// Default prediction window in days
pub const DEFAULT_PREDICTION_DAYS: u32 = 50;

const HISTORY_DAYS: RangeInclusive<u32> = 1..=365;
const PREDICTION_DAYS: RangeInclusive<u32> = 2..=365;

/// Market data service backed by a quote provider
#[derive(Clone)]
pub struct MarketDataService {
    quotes: Arc<dyn QuoteProvider>,
}

impl MarketDataService {
    /// Create a new market data service
    pub fn new(quotes: Arc<dyn QuoteProvider>) -> Self {
        Self { quotes }
    }

    /// Underlying quote provider
    pub fn provider(&self) -> Arc<dyn QuoteProvider> {
        self.quotes.clone()
    }

    /// Current quote for a symbol
    #[instrument(skip(self))]
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol)?;
        self.quotes.get_quote(&symbol).await
    }

    /// Daily closes for the last `days` days plus today, oldest first
    #[instrument(skip(self))]
    pub async fn get_history(&self, symbol: &str, days: Option<u32>) -> Result<Vec<PricePoint>> {
        let symbol = normalize_symbol(symbol)?;
        let days = check_days(days.unwrap_or(DEFAULT_HISTORY_DAYS), HISTORY_DAYS)?;

        self.quotes
            .get_history(&symbol, days)
            .await
            .with_context(|| format!("history for {}", symbol))
    }

    /// Least-squares trend over the last `days` days and a next-day estimate
    #[instrument(skip(self))]
    pub async fn predict(&self, symbol: &str, days: Option<u32>) -> Result<Prediction> {
        let symbol = normalize_symbol(symbol)?;
        let days = check_days(days.unwrap_or(DEFAULT_PREDICTION_DAYS), PREDICTION_DAYS)?;

        let history = self.quotes.get_history(&symbol, days).await?;
        let prediction = predict(&symbol, history)?;

        debug!(
            "Predicted {} at {} for {} (slope {})",
            symbol, prediction.next_day_prediction, prediction.next_day, prediction.slope
        );
        Ok(prediction)
    }
}

fn check_days(days: u32, range: RangeInclusive<u32>) -> Result<u32> {
    if range.contains(&days) {
        Ok(days)
    } else {
        Err(Error::ValidationError(format!(
            "days must be between {} and {}, got {}",
            range.start(),
            range.end(),
            days
        )))
    }
}
