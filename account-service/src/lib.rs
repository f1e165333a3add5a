//! Account service: registration, order execution and portfolio valuation
//!
//! Orders are priced through a [`market_data::QuoteProvider`] and applied by
//! [`ledger_engine::apply_order`] inside [`AccountRepository::run_atomic`].

pub mod config;
pub mod portfolio;
pub mod repository;
pub mod service;

pub use config::AccountServiceConfig;
pub use portfolio::{Portfolio, PortfolioSummary, Position};
pub use repository::{AccountRepository, ApplyFn, InMemoryAccountRepository, PostgresAccountRepository};
pub use service::{AccountService, RepositoryType};
