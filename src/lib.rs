//! Paper-trading platform
//!
//! Re-exports the workspace crates under one name. The server binary lives in
//! the `trading-engine` package.

pub use account_service;
pub use api_gateway;
pub use common;
pub use ledger_engine;
pub use market_data;
