//! Market data for the paper-trading platform
//!
//! Quotes come from a [`QuoteProvider`]. The bundled [`MockQuoteProvider`]
//! runs a seeded random walk per symbol; [`FixedQuoteProvider`] returns
//! prices set by the caller.

mod mock;
mod models;
mod prediction;
mod provider;
mod service;

pub use mock::{default_base_prices, MockQuoteProvider, DEFAULT_BASE_PRICE, PRICE_FLOOR};
pub use models::{PricePoint, Prediction, Quote};
pub use prediction::{linear_regression, predict, LinearFit};
pub use provider::{FixedQuoteProvider, QuoteProvider};
pub use service::{MarketDataService, DEFAULT_HISTORY_DAYS, DEFAULT_PREDICTION_DAYS};
