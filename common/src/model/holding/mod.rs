//! Holding models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Amount, Decimal, Price, Shares};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Shares of one symbol held by one account
///
/// A holding with zero shares is never stored: it is removed instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Holding {
    /// Owning account
    pub account_id: Uuid,
    /// Uppercase ticker
    pub symbol: String,
    /// Shares held, always positive
    pub quantity: Shares,
    /// Weighted-average purchase price per share
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "160.00"))]
    pub average_cost: Price,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    /// Total paid for the shares still held
    pub fn cost_basis(&self) -> Amount {
        self.average_cost * Decimal::from(self.quantity)
    }
}
