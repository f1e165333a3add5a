//! Random-walk quote feed

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Duration;
use common::clock::{Clock, SystemClock};
use common::decimal::precision::round_cash;
use common::decimal::{dec, Decimal, Price};
use common::error::{Error, Result};
use common::model::order::normalize_symbol;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::models::{PricePoint, Quote};
use crate::provider::QuoteProvider;

/// Price for tickers not in the listed set
pub const DEFAULT_BASE_PRICE: Price = dec!(100.00);

/// Smallest price the walk can reach
pub const PRICE_FLOOR: Price = dec!(0.01);

/// Unlisted tickers that get their own persistent walk
pub const MAX_UNLISTED_SYMBOLS: usize = 1024;

/// Maximum move per quote read, in basis points
const QUOTE_STEP_BP: i64 = 100;

/// Daily history step in cents, drawn from `[-400, 600)`
const HISTORY_STEP_CENTS: (i64, i64) = (-400, 600);

/// Listed tickers and their opening prices
pub fn default_base_prices() -> HashMap<String, Price> {
    [
        ("AAPL", dec!(150.00)),
        ("GOOGL", dec!(2800.00)),
        ("MSFT", dec!(300.00)),
        ("TSLA", dec!(900.00)),
        ("AMZN", dec!(3400.00)),
    ]
    .into_iter()
    .map(|(symbol, price)| (symbol.to_string(), price))
    .collect()
}

#[derive(Debug, Clone, Copy)]
struct WalkState {
    reference: Price,
    last: Price,
}

/// Mock feed: every quote read advances a per-symbol random walk
///
/// `change` is measured against the symbol's opening (reference) price, so
/// consecutive quotes are consistent with each other.
pub struct MockQuoteProvider {
    base_prices: HashMap<String, Price>,
    state: DashMap<String, WalkState>,
    rng: Mutex<StdRng>,
    clock: Arc<dyn Clock>,
    strict: bool,
    /// Walks held for unlisted tickers, at most `max_unlisted`
    unlisted: AtomicUsize,
    max_unlisted: usize,
}

impl MockQuoteProvider {
    /// Feed seeded from OS entropy
    pub fn new() -> Self {
        Self::build(StdRng::from_entropy(), Arc::new(SystemClock))
    }

    /// Deterministic feed
    pub fn with_seed(seed: u64) -> Self {
        Self::build(StdRng::seed_from_u64(seed), Arc::new(SystemClock))
    }

    fn build(rng: StdRng, clock: Arc<dyn Clock>) -> Self {
        Self {
            base_prices: default_base_prices(),
            state: DashMap::new(),
            rng: Mutex::new(rng),
            clock,
            strict: false,
            unlisted: AtomicUsize::new(0),
            max_unlisted: MAX_UNLISTED_SYMBOLS,
        }
    }

    /// Stamp quotes and history with another clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Reject tickers without a listed base price
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// List an extra ticker or override a base price
    pub fn with_base_price(mut self, symbol: &str, price: Price) -> Self {
        self.base_prices.insert(symbol.trim().to_ascii_uppercase(), price);
        self
    }

    /// Cap the number of unlisted tickers with a persistent walk
    ///
    /// Past the cap, unlisted tickers are quoted one step from the default
    /// price without keeping any state.
    pub fn with_max_unlisted(mut self, max_unlisted: usize) -> Self {
        self.max_unlisted = max_unlisted;
        self
    }

    /// Number of tickers with walk state
    pub fn tracked_symbols(&self) -> usize {
        self.state.len()
    }

    fn reserve_unlisted_slot(&self) -> bool {
        self.unlisted
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < self.max_unlisted).then_some(n + 1))
            .is_ok()
    }

    fn base_price(&self, symbol: &str) -> Result<Price> {
        match self.base_prices.get(symbol) {
            Some(price) => Ok(*price),
            None if self.strict => Err(Error::QuoteUnavailable(format!("Unknown symbol: {}", symbol))),
            None => Ok(DEFAULT_BASE_PRICE),
        }
    }

    fn draw(&self, low: i64, high: i64) -> i64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(low..high)
    }

    /// Advance the walk one step and return the new state
    fn step(&self, symbol: &str) -> Result<WalkState> {
        let base = self.base_price(symbol)?;
        let bp = self.draw(-QUOTE_STEP_BP, QUOTE_STEP_BP + 1);

        let walk = |price: Price| round_cash(price + price * Decimal::new(bp, 4)).max(PRICE_FLOOR);

        let mut entry = match self.state.entry(symbol.to_string()) {
            Entry::Occupied(entry) => entry.into_ref(),
            Entry::Vacant(entry) => {
                if !self.base_prices.contains_key(symbol) && !self.reserve_unlisted_slot() {
                    return Ok(WalkState {
                        reference: base,
                        last: walk(base),
                    });
                }
                entry.insert(WalkState {
                    reference: base,
                    last: base,
                })
            }
        };
        entry.last = walk(entry.last);

        trace!("{} walked {}bp to {}", symbol, bp, entry.last);
        Ok(*entry)
    }
}

impl Default for MockQuoteProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for MockQuoteProvider {
    async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol)?;
        let state = self.step(&symbol)?;

        let change = state.last - state.reference;
        let change_percent = if state.reference.is_zero() {
            Decimal::ZERO
        } else {
            round_cash(change / state.reference * dec!(100))
        };

        Ok(Quote {
            symbol,
            price: state.last,
            reference_price: state.reference,
            change,
            change_percent,
            timestamp: self.clock.now(),
        })
    }

    async fn get_history(&self, symbol: &str, days: u32) -> Result<Vec<PricePoint>> {
        let mut price = self.get_quote(symbol).await?.price;
        let today = self.clock.now().date_naive();

        let mut history = Vec::with_capacity(days as usize + 1);
        for offset in (0..=days).rev() {
            let (low, high) = HISTORY_STEP_CENTS;
            price = (price + Decimal::new(self.draw(low, high), 2)).max(PRICE_FLOOR);
            history.push(PricePoint {
                date: today - Duration::days(i64::from(offset)),
                price,
            });
        }

        Ok(history)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
