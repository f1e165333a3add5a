//! Paper-trading server binary

use std::net::SocketAddr;
use std::sync::Arc;

use account_service::{
    AccountRepository, AccountService, AccountServiceConfig, InMemoryAccountRepository, PostgresAccountRepository,
};
use api_gateway::{AppConfig, AppState};
use clap::{Parser, ValueEnum};
use common::clock::SystemClock;
use common::db;
use common::model::OrderRequest;
use dotenv::dotenv;
use market_data::{MarketDataService, MockQuoteProvider, QuoteProvider};
use tokio::signal;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

/// Account storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Process-local maps; state is lost on exit
    Memory,
    /// PostgreSQL at DATABASE_URL
    Postgres,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Address to listen on (defaults to 0.0.0.0:$API_PORT)
    #[clap(long)]
    addr: Option<SocketAddr>,

    /// Account storage backend; postgres when DATABASE_URL is set
    #[clap(long, value_enum)]
    repository: Option<Backend>,

    /// Register a demo account with a few positions
    #[clap(short, long)]
    demo: bool,

    /// Log level (trace, debug, info, warn, error)
    #[clap(long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // DEBUG=1 in .env wins over the flag
    let log_level = if std::env::var("DEBUG").map(|v| v == "1").unwrap_or(false) {
        Level::DEBUG
    } else {
        args.log_level
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("tower_http=debug,api_gateway=debug,market_data=debug,account_service=debug,ledger_engine=debug")?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .finish();

    // Only set the global subscriber if it hasn't been set already
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        info!("Tracing initialized");
        debug!("Log level {}", log_level);
    }

    info!("Starting paper-trading server...");

    let app_config = AppConfig::new();
    let account_config = AccountServiceConfig::from_env();

    // Quote feed
    let feed = match app_config.seed_quotes {
        Some(seed) => {
            info!("Mock quote feed seeded with {}", seed);
            MockQuoteProvider::with_seed(seed)
        }
        None => MockQuoteProvider::new(),
    };
    let quotes: Arc<dyn QuoteProvider> = Arc::new(feed.strict(app_config.strict_symbols));

    // Account storage
    let backend = args.repository.unwrap_or(if app_config.database_url.is_some() {
        Backend::Postgres
    } else {
        Backend::Memory
    });
    let repository: Arc<dyn AccountRepository> = match backend {
        Backend::Memory => Arc::new(InMemoryAccountRepository::with_config(&account_config)),
        Backend::Postgres => {
            let database_url = app_config
                .database_url
                .clone()
                .unwrap_or_else(|| account_config.database_url.clone());
            let pool = db::connect(&database_url, account_config.db_pool_size, account_config.lock_timeout).await?;
            db::run_migrations(&pool).await?;
            info!("Database migrations applied");
            Arc::new(PostgresAccountRepository::from_pool(pool, &account_config))
        }
    };
    info!("Using {} account repository", repository.name());

    let account_service = Arc::new(AccountService::new(
        repository,
        quotes.clone(),
        Arc::new(SystemClock),
        account_config,
    ));
    let market_data_service = Arc::new(MarketDataService::new(quotes));

    if args.demo {
        info!("Creating demo data...");
        create_demo_data(&account_service).await?;
    }

    let state = Arc::new(AppState::new(account_service, market_data_service));
    let app = api_gateway::router(state, log_level);

    let addr = args
        .addr
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], app_config.port)));
    info!("Starting API server on {}", addr);
    info!("API docs at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    Ok(())
}

/// Register a demo account and buy into a few listed tickers
async fn create_demo_data(account_service: &AccountService) -> Result<(), Box<dyn std::error::Error>> {
    let account = match account_service.find_by_username("demo").await? {
        Some(account) => {
            info!("Demo account already exists: {} (POST /api/login as \"demo\")", account.id);
            return Ok(());
        }
        None => account_service.register("demo").await?,
    };

    info!(
        "Created demo account {} with balance {} (POST /api/login as \"demo\")",
        account.id, account.cash_balance
    );

    let orders = [
        OrderRequest::buy("AAPL", 10),
        OrderRequest::buy("MSFT", 5),
        OrderRequest::buy("TSLA", 2),
        OrderRequest::sell("AAPL", 4),
    ];

    for order in &orders {
        match account_service.execute_order(account.id, order).await {
            Ok(executed) => info!(
                "Demo {} {} {} @ {}, balance {}",
                order.side, order.quantity, order.symbol, executed.transaction.price, executed.new_balance
            ),
            Err(e) => warn!("Demo order {} {} failed: {}", order.side, order.symbol, e),
        }
    }

    info!("Demo data created successfully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
