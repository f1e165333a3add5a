//! Order application
//!
//! `apply_order` is a pure function of its inputs: the account and holding
//! snapshots, the order, the quoted price and the execution time. It never
//! reads a clock or a price feed itself, and a rejected order yields no new
//! state at all.

use chrono::{DateTime, Utc};
use common::decimal::precision::notional;
use common::decimal::{Amount, Decimal, Price, Shares};
use common::error::{Error, Result};
use common::model::{Account, Holding, OrderRequest, Side, Transaction};
use tracing::debug;

use crate::validation::{validate_order, ValidatedOrder};

/// What happens to the account's holding in the traded symbol
#[derive(Debug, Clone, PartialEq)]
pub enum HoldingChange {
    /// Insert or replace the holding
    Upsert(Holding),
    /// The position went to zero shares; delete it
    Remove {
        /// Symbol of the removed holding
        symbol: String,
    },
}

impl HoldingChange {
    /// Holding left after the order, if any
    pub fn holding(&self) -> Option<&Holding> {
        match self {
            HoldingChange::Upsert(holding) => Some(holding),
            HoldingChange::Remove { .. } => None,
        }
    }

    /// Symbol the change applies to
    pub fn symbol(&self) -> &str {
        match self {
            HoldingChange::Upsert(holding) => &holding.symbol,
            HoldingChange::Remove { symbol } => symbol,
        }
    }
}

/// New state produced by an accepted order
///
/// The three parts are written together or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedOrder {
    /// Cash balance after the order
    pub new_balance: Amount,
    /// Holding mutation
    pub holding: HoldingChange,
    /// Record to append to the account's history
    pub transaction: Transaction,
}

impl ExecutedOrder {
    /// The account snapshot with the new balance applied
    pub fn updated_account(&self, account: &Account) -> Account {
        Account {
            cash_balance: self.new_balance,
            updated_at: self.transaction.timestamp,
            ..account.clone()
        }
    }
}

/// Validate and apply one market order against an account's current state
///
/// `holding` must be the account's holding in `order.symbol`, or `None` if it
/// holds no shares of it. `price` is the quote taken at execution time.
pub fn apply_order(
    account: &Account,
    holding: Option<&Holding>,
    order: &OrderRequest,
    price: Price,
    now: DateTime<Utc>,
) -> Result<ExecutedOrder> {
    let order = validate_order(order)?;

    if price <= Decimal::ZERO {
        return Err(Error::QuoteUnavailable(format!(
            "Non-positive quote {} for {}", price, order.symbol
        )));
    }

    if let Some(holding) = holding {
        if holding.account_id != account.id || holding.symbol != order.symbol {
            return Err(Error::InvalidOrder(format!(
                "Holding {}/{} does not belong to order {}/{}",
                holding.account_id, holding.symbol, account.id, order.symbol
            )));
        }
    }

    let executed = match order.side {
        Side::Buy => buy(account, holding, &order, price, now)?,
        Side::Sell => sell(account, holding, &order, price, now)?,
    };

    debug!(
        "Applied {} {} {} @ {} to account {}: balance {} -> {}",
        order.side, order.quantity, order.symbol, price, account.id,
        account.cash_balance, executed.new_balance
    );

    Ok(executed)
}

fn buy(
    account: &Account,
    holding: Option<&Holding>,
    order: &ValidatedOrder,
    price: Price,
    now: DateTime<Utc>,
) -> Result<ExecutedOrder> {
    let total_cost = notional(price, order.quantity).ok_or_else(|| overflow(order))?;

    if account.cash_balance < total_cost {
        return Err(Error::InsufficientFunds(format!(
            "Buying {} {} costs {} but the balance is {}",
            order.quantity, order.symbol, total_cost, account.cash_balance
        )));
    }

    let new_balance = account.cash_balance - total_cost;

    let updated = match holding {
        None => Holding {
            account_id: account.id,
            symbol: order.symbol.clone(),
            quantity: order.quantity,
            average_cost: price,
            updated_at: now,
        },
        Some(existing) => {
            let new_quantity = existing
                .quantity
                .checked_add(order.quantity)
                .filter(|q| i64::try_from(*q).is_ok())
                .ok_or_else(|| overflow(order))?;

            // Weighted average over the old position and this fill
            let new_average_cost = existing
                .average_cost
                .checked_mul(Decimal::from(existing.quantity))
                .and_then(|basis| basis.checked_add(total_cost))
                .and_then(|basis| basis.checked_div(Decimal::from(new_quantity)))
                .ok_or_else(|| overflow(order))?;

            Holding {
                quantity: new_quantity,
                average_cost: new_average_cost,
                updated_at: now,
                ..existing.clone()
            }
        }
    };

    Ok(ExecutedOrder {
        new_balance,
        holding: HoldingChange::Upsert(updated),
        transaction: record(account, order, price, total_cost, now),
    })
}

fn sell(
    account: &Account,
    holding: Option<&Holding>,
    order: &ValidatedOrder,
    price: Price,
    now: DateTime<Utc>,
) -> Result<ExecutedOrder> {
    let existing = holding.ok_or_else(|| {
        Error::InsufficientHoldings(format!("No {} shares held", order.symbol))
    })?;

    if existing.quantity < order.quantity {
        return Err(Error::InsufficientHoldings(format!(
            "Selling {} {} but only {} held",
            order.quantity, order.symbol, existing.quantity
        )));
    }

    let proceeds = notional(price, order.quantity).ok_or_else(|| overflow(order))?;
    let new_balance = account
        .cash_balance
        .checked_add(proceeds)
        .ok_or_else(|| overflow(order))?;

    let remaining: Shares = existing.quantity - order.quantity;
    let change = if remaining == 0 {
        HoldingChange::Remove {
            symbol: existing.symbol.clone(),
        }
    } else {
        // Cost basis per share is unchanged by a partial sell
        HoldingChange::Upsert(Holding {
            quantity: remaining,
            updated_at: now,
            ..existing.clone()
        })
    };

    Ok(ExecutedOrder {
        new_balance,
        holding: change,
        transaction: record(account, order, price, proceeds, now),
    })
}

fn record(
    account: &Account,
    order: &ValidatedOrder,
    price: Price,
    amount: Amount,
    now: DateTime<Utc>,
) -> Transaction {
    Transaction::new(
        account.id,
        order.symbol.clone(),
        order.side,
        order.quantity,
        price,
        amount,
        now,
    )
}

fn overflow(order: &ValidatedOrder) -> Error {
    Error::InvalidOrder(format!(
        "Order for {} {} exceeds the representable value range",
        order.quantity, order.symbol
    ))
}
