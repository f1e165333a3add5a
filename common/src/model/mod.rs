//! Domain models for the paper-trading ledger

pub mod order;
pub mod transaction;
pub mod account;
pub mod holding;

pub use account::Account;
pub use holding::Holding;
pub use order::{OrderRequest, Side};
pub use transaction::Transaction;
