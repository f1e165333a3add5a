//! Order shape validation
//!
//! Runs before any price is fetched or any state is read.

use common::decimal::{Decimal, Shares};
use common::error::{Error, Result};
use common::model::order::{normalize_symbol, OrderRequest, Side};
use rust_decimal::prelude::ToPrimitive;

/// Order that passed validation: normalized symbol, whole positive quantity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOrder {
    /// Uppercase ticker
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Shares, at least one
    pub quantity: Shares,
}

/// Validate an order request and normalize its symbol
pub fn validate_order(order: &OrderRequest) -> Result<ValidatedOrder> {
    let symbol = normalize_symbol(&order.symbol)?;
    let quantity = whole_shares(order.quantity)?;

    Ok(ValidatedOrder {
        symbol,
        side: order.side,
        quantity,
    })
}

fn whole_shares(quantity: Decimal) -> Result<Shares> {
    if quantity <= Decimal::ZERO {
        return Err(Error::InvalidOrder(format!(
            "Quantity must be positive, got {}", quantity
        )));
    }

    if !quantity.fract().is_zero() {
        return Err(Error::InvalidOrder(format!(
            "Quantity must be a whole number of shares, got {}", quantity
        )));
    }

    // Holdings are stored as signed 64-bit integers
    quantity
        .to_i64()
        .and_then(|q| Shares::try_from(q).ok())
        .ok_or_else(|| Error::InvalidOrder(format!("Quantity {} is too large", quantity)))
}
