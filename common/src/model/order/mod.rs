//! Order models and related types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decimal::Decimal;
use crate::error::{Error, Result};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Longest accepted ticker
pub const MAX_SYMBOL_LEN: usize = 10;

/// Trim and uppercase a ticker, rejecting anything that is not ticker-shaped
///
/// Accepts ASCII letters, digits, `.` and `-`, starting with a letter or digit.
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_ascii_uppercase();

    if symbol.is_empty() {
        return Err(Error::InvalidOrder("Symbol must not be empty".to_string()));
    }

    if symbol.len() > MAX_SYMBOL_LEN {
        return Err(Error::InvalidOrder(format!(
            "Symbol {} is longer than {} characters", symbol, MAX_SYMBOL_LEN
        )));
    }

    let well_formed = symbol.starts_with(|c: char| c.is_ascii_alphanumeric())
        && symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.' || c == '-');
    if !well_formed {
        return Err(Error::InvalidOrder(format!("Malformed symbol: {}", raw)));
    }

    Ok(symbol)
}

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Lowercase wire/storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(format!("unknown side: {}", other)),
        }
    }
}

/// Market order as submitted by a client
///
/// The execution price is never part of the request; it is taken from the
/// quote feed when the order is applied. `quantity` is kept exactly as
/// submitted so the ledger can reject fractional or non-positive amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct OrderRequest {
    /// Ticker symbol
    pub symbol: String,
    /// Order side (buy or sell)
    #[serde(alias = "type")]
    pub side: Side,
    /// Number of shares, must be a positive integer
    #[cfg_attr(feature = "utoipa", schema(value_type = f64, example = 2))]
    pub quantity: Decimal,
}

impl OrderRequest {
    /// Create a new market order
    pub fn new(symbol: impl Into<String>, side: Side, quantity: impl Into<Decimal>) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity: quantity.into(),
        }
    }

    /// Create a buy order
    pub fn buy(symbol: impl Into<String>, quantity: impl Into<Decimal>) -> Self {
        Self::new(symbol, Side::Buy, quantity)
    }

    /// Create a sell order
    pub fn sell(symbol: impl Into<String>, quantity: impl Into<Decimal>) -> Self {
        Self::new(symbol, Side::Sell, quantity)
    }

    /// Copy of this order with the symbol trimmed and uppercased
    pub fn normalized(&self) -> Self {
        Self {
            symbol: self.symbol.trim().to_ascii_uppercase(),
            side: self.side,
            quantity: self.quantity,
        }
    }
}
