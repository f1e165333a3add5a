use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::decimal::Shares;
use crate::error::{Error, Result};
use crate::model::{Account, Holding, Side, Transaction};

/// Database model for the accounts table
#[derive(Debug, Clone, FromRow)]
pub struct DbAccount {
    pub id: Uuid,
    pub username: String,
    pub cash_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database model for the holdings table
#[derive(Debug, Clone, FromRow)]
pub struct DbHolding {
    pub account_id: Uuid,
    pub symbol: String,
    pub quantity: i64,
    pub average_cost: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Database model for the transactions table
#[derive(Debug, Clone, FromRow)]
pub struct DbTransaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub symbol: String,
    pub side: String,
    pub quantity: i64,
    pub price: Decimal,
    pub amount: Decimal,
    pub executed_at: DateTime<Utc>,
}

/// Convert a stored share count, rejecting negative values
pub fn shares_from_db(quantity: i64) -> Result<Shares> {
    Shares::try_from(quantity)
        .map_err(|_| Error::Internal(format!("Negative share count in database: {}", quantity)))
}

/// Convert a share count for storage in a BIGINT column
pub fn shares_to_db(quantity: Shares) -> Result<i64> {
    i64::try_from(quantity)
        .map_err(|_| Error::Internal(format!("Share count too large for storage: {}", quantity)))
}

impl From<DbAccount> for Account {
    fn from(row: DbAccount) -> Self {
        Account {
            id: row.id,
            username: row.username,
            cash_balance: row.cash_balance,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl TryFrom<DbHolding> for Holding {
    type Error = Error;

    fn try_from(row: DbHolding) -> Result<Self> {
        Ok(Holding {
            account_id: row.account_id,
            symbol: row.symbol,
            quantity: shares_from_db(row.quantity)?,
            average_cost: row.average_cost,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DbTransaction> for Transaction {
    type Error = Error;

    fn try_from(row: DbTransaction) -> Result<Self> {
        let side = row.side.parse::<Side>().map_err(Error::Internal)?;

        Ok(Transaction {
            id: row.id,
            account_id: row.account_id,
            symbol: row.symbol,
            side,
            quantity: shares_from_db(row.quantity)?,
            price: row.price,
            amount: row.amount,
            timestamp: row.executed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn negative_quantities_are_rejected() {
        assert!(shares_from_db(-1).is_err());
        assert_eq!(shares_from_db(3).unwrap(), 3);
        assert!(shares_to_db(u64::MAX).is_err());
    }

    #[test]
    fn transaction_rows_map_to_domain() {
        let row = DbTransaction {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            symbol: "AAPL".to_string(),
            side: "sell".to_string(),
            quantity: 3,
            price: dec!(200.00),
            amount: dec!(600.00),
            executed_at: Utc::now(),
        };

        let tx = Transaction::try_from(row).unwrap();
        assert_eq!(tx.side, Side::Sell);
        assert_eq!(tx.quantity, 3);
        assert_eq!(tx.amount, dec!(600.00));
    }
}
