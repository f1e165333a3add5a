//! Ledger engine: applies buy and sell orders to an account's cash and holdings

pub mod engine;
pub mod validation;

pub use engine::{apply_order, ExecutedOrder, HoldingChange};
pub use validation::{validate_order, ValidatedOrder};
