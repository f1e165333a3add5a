//! Ledger transaction models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Amount, Price, Shares};
use crate::model::order::Side;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Executed order, appended to the account's history and never modified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Transaction {
    /// Unique transaction ID
    pub id: Uuid,
    /// Account the order was applied to
    pub account_id: Uuid,
    /// Ticker symbol
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Shares traded
    pub quantity: Shares,
    /// Execution price per share
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "150.00"))]
    pub price: Price,
    /// Total amount (price * quantity)
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "300.00"))]
    pub amount: Amount,
    /// Execution time
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(
        account_id: Uuid,
        symbol: String,
        side: Side,
        quantity: Shares,
        price: Price,
        amount: Amount,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            symbol,
            side,
            quantity,
            price,
            amount,
            timestamp,
        }
    }
}
