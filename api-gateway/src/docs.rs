//! OpenAPI document

use utoipa::OpenApi;

use crate::api;

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Session routes
        api::auth::register,
        api::auth::login,
        api::auth::logout,
        api::auth::current_user,
        // Market data routes
        api::stocks::get_quote,
        api::stocks::get_history,
        api::prediction::predict,
        // Ledger routes
        api::trade::execute_trade,
        api::portfolio::get_portfolio,
        api::portfolio::get_history,
        api::portfolio::get_transactions,
        // Operations
        api::health::health_check,
    ),
    components(
        schemas(
            api::auth::RegisterRequest,
            api::auth::LoginRequest,
            api::auth::SessionResponse,
            api::prediction::PredictRequest,
            api::health::HealthReport,
            api::health::ComponentHealth,
            crate::error::ErrorResponse,
            common::model::Account,
            common::model::Holding,
            common::model::OrderRequest,
            common::model::Side,
            common::model::Transaction,
            account_service::Portfolio,
            account_service::PortfolioSummary,
            account_service::Position,
            market_data::Quote,
            market_data::PricePoint,
            market_data::Prediction,
        )
    ),
    tags(
        (name = "auth", description = "Registration and sessions"),
        (name = "stocks", description = "Quotes and price history"),
        (name = "prediction", description = "Trend prediction"),
        (name = "trade", description = "Order execution"),
        (name = "portfolio", description = "Holdings and transaction history"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "Paper Trading API",
        version = "1.0.0",
        description = "Simulated stock trading: market orders against a mock quote feed, portfolio valuation and trend prediction"
    )
)]
pub struct ApiDoc;
