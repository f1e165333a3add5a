//! Common types and utilities for the paper-trading platform
//!
//! This library contains the shared types, utilities, and abstractions used
//! across the ledger engine, the account service and the API gateway. It
//! provides a unified approach to error handling, time, database access, and
//! domain models.

pub mod clock;
pub mod error;
pub mod model;
pub mod decimal;
pub mod db;

/// Re-export important types
pub use error::{Error, Result, ErrorExt};
pub use decimal::*;
pub use clock::{Clock, FixedClock, SystemClock};

// Re-export database types
pub use db::transaction::{PgTransaction, TransactionManager};

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
