//! Quote provider port and a settable fixed-price implementation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use common::clock::{Clock, SystemClock};
use common::decimal::precision::round_cash;
use common::decimal::{Decimal, Price};
use common::error::{Error, Result};
use common::model::order::normalize_symbol;
use dashmap::DashMap;

use crate::models::{PricePoint, Quote};

/// Source of current prices
///
/// Implementations fail with `Error::QuoteUnavailable` when they cannot
/// produce a positive price for a symbol.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Current quote for an uppercase symbol
    async fn get_quote(&self, symbol: &str) -> Result<Quote>;

    /// Current price only
    async fn get_price(&self, symbol: &str) -> Result<Price> {
        Ok(self.get_quote(symbol).await?.price)
    }

    /// `days + 1` daily closes ending today, oldest first
    async fn get_history(&self, symbol: &str, days: u32) -> Result<Vec<PricePoint>>;

    /// Reachability check; must not move prices
    async fn ping(&self) -> Result<()>;

    /// Provider name used in logs and health output
    fn name(&self) -> &str;
}

/// Quote provider returning prices set by the caller
///
/// Used by tests and demo wiring. Prices never move on their own; history is
/// flat at the current price.
pub struct FixedQuoteProvider {
    prices: DashMap<String, Price>,
    unavailable: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl FixedQuoteProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty provider stamping quotes with the given clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            prices: DashMap::new(),
            unavailable: AtomicBool::new(false),
            clock,
        }
    }

    /// Builder-style variant of [`set_price`](Self::set_price)
    pub fn with_price(self, symbol: &str, price: Price) -> Self {
        self.set_price(symbol, price);
        self
    }

    /// Set or replace the price of a symbol
    pub fn set_price(&self, symbol: &str, price: Price) {
        self.prices.insert(symbol.trim().to_ascii_uppercase(), price);
    }

    /// Forget a symbol; later quotes for it are unavailable
    pub fn remove_price(&self, symbol: &str) {
        self.prices.remove(&symbol.trim().to_ascii_uppercase());
    }

    /// Simulate a feed outage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn current_price(&self, symbol: &str) -> Result<(String, Price)> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::QuoteUnavailable("Quote feed is offline".to_string()));
        }

        let symbol = normalize_symbol(symbol)?;
        let price = self
            .prices
            .get(&symbol)
            .map(|entry| *entry.value())
            .ok_or_else(|| Error::QuoteUnavailable(format!("No price for {}", symbol)))?;

        if price <= Decimal::ZERO {
            return Err(Error::QuoteUnavailable(format!(
                "Non-positive price {} for {}", price, symbol
            )));
        }

        Ok((symbol, price))
    }
}

impl Default for FixedQuoteProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for FixedQuoteProvider {
    async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        let (symbol, price) = self.current_price(symbol)?;
        let price = round_cash(price);

        Ok(Quote {
            symbol,
            price,
            reference_price: price,
            change: Decimal::ZERO,
            change_percent: Decimal::ZERO,
            timestamp: self.clock.now(),
        })
    }

    async fn get_price(&self, symbol: &str) -> Result<Price> {
        // Unrounded, so tests can drive exact prices into the ledger
        self.current_price(symbol).map(|(_, price)| price)
    }

    async fn get_history(&self, symbol: &str, days: u32) -> Result<Vec<PricePoint>> {
        let (_, price) = self.current_price(symbol)?;
        let today = self.clock.now().date_naive();

        Ok((0..=days)
            .rev()
            .map(|offset| PricePoint {
                date: today - Duration::days(i64::from(offset)),
                price: round_cash(price),
            })
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::QuoteUnavailable("Quote feed is offline".to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::clock::FixedClock;
    use common::decimal::dec;

    #[tokio::test]
    async fn test_set_and_remove_price() {
        let provider = FixedQuoteProvider::new().with_price("aapl", dec!(150.00));

        assert_eq!(provider.get_price("AAPL").await.unwrap(), dec!(150.00));
        assert_eq!(provider.get_quote("aapl").await.unwrap().symbol, "AAPL");

        provider.remove_price("AAPL");
        assert!(matches!(provider.get_price("AAPL").await, Err(Error::QuoteUnavailable(_))));
    }

    #[tokio::test]
    async fn test_outage_makes_quotes_unavailable() {
        let provider = FixedQuoteProvider::new().with_price("MSFT", dec!(300.00));
        provider.set_unavailable(true);
        assert!(matches!(provider.get_quote("MSFT").await, Err(Error::QuoteUnavailable(_))));
        assert!(matches!(provider.ping().await, Err(Error::QuoteUnavailable(_))));

        provider.set_unavailable(false);
        assert!(provider.get_quote("MSFT").await.is_ok());
        assert!(provider.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_non_positive_price_is_unavailable() {
        let provider = FixedQuoteProvider::new().with_price("ZERO", dec!(0));
        assert!(matches!(provider.get_price("ZERO").await, Err(Error::QuoteUnavailable(_))));
    }

    #[tokio::test]
    async fn test_flat_history_ends_today() {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()));
        let provider = FixedQuoteProvider::with_clock(clock).with_price("TSLA", dec!(900.00));

        let history = provider.get_history("TSLA", 3).await.unwrap();

        assert_eq!(history.len(), 4);
        assert_eq!(history[0].date.to_string(), "2024-03-07");
        assert_eq!(history[3].date.to_string(), "2024-03-10");
        assert!(history.iter().all(|p| p.price == dec!(900.00)));
    }
}
