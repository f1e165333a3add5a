//! Decimal type utilities for exact ledger arithmetic

pub use rust_decimal::{Decimal, RoundingStrategy};
pub use rust_decimal_macros::dec;

/// Price per share
pub type Price = Decimal;

/// Cash amount (balances, costs, proceeds)
pub type Amount = Decimal;

/// Whole number of shares
pub type Shares = u64;

/// Precision helpers for display values
///
/// Ledger state is never rounded; these are only applied to derived,
/// presentation-side numbers such as quotes and portfolio valuations.
pub mod precision {
    use super::*;

    /// Cents
    pub const CASH_PRECISION: u32 = 2;

    /// Round a price or cash amount to cents, half away from zero
    pub fn round_cash(amount: Amount) -> Amount {
        amount.round_dp_with_strategy(CASH_PRECISION, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Amount for `shares` at `price`, `None` on overflow
    pub fn notional(price: Price, shares: Shares) -> Option<Amount> {
        price.checked_mul(Decimal::from(shares))
    }
}
