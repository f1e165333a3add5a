//! HTTP boundary for the paper-trading platform

pub mod api;
pub mod config;
pub mod docs;
pub mod error;
pub mod session;

use std::sync::Arc;
use std::time::Instant;

use account_service::AccountService;
use axum::routing::{get, post};
use axum::Router;
use market_data::MarketDataService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::session::SessionStore;

pub use config::AppConfig;
pub use error::ApiError;

/// App state shared across handlers
pub struct AppState {
    /// Account service
    pub account_service: Arc<AccountService>,
    /// Market data service
    pub market_data_service: Arc<MarketDataService>,
    /// Live sessions
    pub sessions: Arc<SessionStore>,
    /// Process start, for uptime
    pub started_at: Instant,
}

impl AppState {
    /// Create state with an empty session store
    pub fn new(account_service: Arc<AccountService>, market_data_service: Arc<MarketDataService>) -> Self {
        Self {
            account_service,
            market_data_service,
            sessions: Arc::new(SessionStore::new()),
            started_at: Instant::now(),
        }
    }
}

/// Routes under `/api`
pub fn api_routes() -> Router<Arc<AppState>> {
    use crate::api::{auth, portfolio, prediction, stocks, trade};

    Router::new()
        // Session routes
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/user", get(auth::current_user))
        // Market data routes
        .route("/stocks/:symbol", get(stocks::get_quote))
        .route("/stocks/:symbol/history", get(stocks::get_history))
        .route("/predict", post(prediction::predict))
        // Ledger routes
        .route("/trade", post(trade::execute_trade))
        .route("/portfolio", get(portfolio::get_portfolio))
        .route("/portfolio/history", get(portfolio::get_history))
        .route("/transactions", get(portfolio::get_transactions))
}

/// Full application: API, health check, docs, CORS and request tracing
pub fn router(state: Arc<AppState>, log_level: Level) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .nest("/api", api_routes())
        .route("/health", get(api::health::health_check))
        .merge(swagger_ui)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(log_level))
                .on_request(DefaultOnRequest::new().level(log_level))
                .on_response(DefaultOnResponse::new().level(log_level)),
        )
        .with_state(state)
}
