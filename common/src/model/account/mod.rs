//! Account models and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Trading account holding the user's cash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Account {
    /// Unique account ID
    pub id: Uuid,
    /// Login name, unique across accounts
    pub username: String,
    /// Cash available for buying, never negative
    #[cfg_attr(feature = "utoipa", schema(value_type = String, example = "100000.00"))]
    pub cash_balance: Amount,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account funded with `initial_balance`
    pub fn new(username: impl Into<String>, initial_balance: Amount, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            cash_balance: initial_balance,
            created_at: now,
            updated_at: now,
        }
    }
}
