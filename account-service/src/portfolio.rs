//! Portfolio valuation at current quotes

use common::decimal::precision::round_cash;
use common::decimal::{Amount, Decimal, Price, Shares};
use common::model::{Account, Holding};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

/// A holding valued at the current price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Position {
    pub symbol: String,
    pub quantity: Shares,
    /// Stored average cost, unrounded
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub average_cost: Price,
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub current_price: Price,
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub current_value: Amount,
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub cost_basis: Amount,
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub gain_loss: Amount,
}

impl Position {
    /// Value `holding` at `current_price`
    pub fn value(holding: &Holding, current_price: Price) -> Self {
        let shares = Decimal::from(holding.quantity);
        let current_value = current_price * shares;
        let cost_basis = holding.cost_basis();

        Self {
            symbol: holding.symbol.clone(),
            quantity: holding.quantity,
            average_cost: holding.average_cost,
            current_price,
            current_value: round_cash(current_value),
            cost_basis: round_cash(cost_basis),
            gain_loss: round_cash(current_value - cost_basis),
        }
    }
}

/// Account totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct PortfolioSummary {
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub cash_balance: Amount,
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub holdings_value: Amount,
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub total_equity: Amount,
}

/// Valued positions of one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Portfolio {
    pub account_id: Uuid,
    pub positions: Vec<Position>,
    pub summary: PortfolioSummary,
}

impl Portfolio {
    /// Assemble a portfolio from an account and its valued positions
    pub fn new(account: &Account, positions: Vec<Position>) -> Self {
        let holdings_value: Amount = positions.iter().map(|p| p.current_value).sum();

        Self {
            account_id: account.id,
            summary: PortfolioSummary {
                cash_balance: account.cash_balance,
                holdings_value,
                total_equity: account.cash_balance + holdings_value,
            },
            positions,
        }
    }
}
