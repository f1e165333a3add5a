//! API handlers
//!
//! Each handler follows the same pattern:
//! - Extract state, session and parameters using Axum extractors
//! - Call the account or market data service
//! - Map the result to the `{data, meta?}` response format

pub mod auth;
pub mod health;
pub mod portfolio;
pub mod prediction;
pub mod response;
pub mod stocks;
pub mod trade;

pub use response::{ApiListResponse, ApiResponse, ResponseMetadata};
