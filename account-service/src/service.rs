//! Account service implementation

use std::sync::Arc;

use common::clock::{Clock, SystemClock};
use common::decimal::Decimal;
use common::error::{Error, ErrorExt, Result};
use common::model::{Account, Holding, OrderRequest, Transaction};
use ledger_engine::{apply_order, validate_order, ExecutedOrder};
use market_data::QuoteProvider;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::AccountServiceConfig;
use crate::portfolio::{Portfolio, Position};
use crate::repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository};

/// Shortest accepted username
pub const MIN_USERNAME_LEN: usize = 3;
/// Longest accepted username
pub const MAX_USERNAME_LEN: usize = 32;

/// Account service: registration, order execution and portfolio reads
pub struct AccountService {
    /// Repository for account data
    repo: Arc<dyn AccountRepository>,
    /// Price source for executions and valuation
    quotes: Arc<dyn QuoteProvider>,
    /// Time source for timestamps
    clock: Arc<dyn Clock>,
    config: AccountServiceConfig,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres,
}

impl AccountService {
    /// Create a service from explicit parts
    pub fn new(
        repo: Arc<dyn AccountRepository>,
        quotes: Arc<dyn QuoteProvider>,
        clock: Arc<dyn Clock>,
        config: AccountServiceConfig,
    ) -> Self {
        Self { repo, quotes, clock, config }
    }

    /// In-memory service on the system clock with default configuration
    pub fn in_memory(quotes: Arc<dyn QuoteProvider>) -> Self {
        let config = AccountServiceConfig::default();
        Self::new(
            Arc::new(InMemoryAccountRepository::with_config(&config)),
            quotes,
            Arc::new(SystemClock),
            config,
        )
    }

    /// Create a new account service with a specific repository type
    pub async fn with_repository(
        repo_type: RepositoryType,
        quotes: Arc<dyn QuoteProvider>,
        clock: Arc<dyn Clock>,
        config: AccountServiceConfig,
    ) -> Result<Self> {
        let repo: Arc<dyn AccountRepository> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryAccountRepository::with_config(&config)),
            RepositoryType::Postgres => Arc::new(PostgresAccountRepository::with_config(&config).await?),
        };

        info!("Account service using {} repository", repo.name());
        Ok(Self::new(repo, quotes, clock, config))
    }

    /// Underlying repository
    pub fn repository(&self) -> Arc<dyn AccountRepository> {
        self.repo.clone()
    }

    /// Underlying quote provider
    pub fn quotes(&self) -> Arc<dyn QuoteProvider> {
        self.quotes.clone()
    }

    /// Active configuration
    pub fn config(&self) -> &AccountServiceConfig {
        &self.config
    }

    /// Register an account holding the configured opening balance
    pub async fn register(&self, username: &str) -> Result<Account> {
        let username = validate_username(username)?;
        let account = Account::new(username, self.config.initial_balance, self.clock.now());

        let account = self.repo.create_account(account).await?;
        info!("Registered account {} ({})", account.username, account.id);
        Ok(account)
    }

    /// Get an account by ID
    pub async fn get_account(&self, id: Uuid) -> Result<Account> {
        self.repo
            .get_account(id)
            .await
            .with_context(|| format!("Failed to retrieve account {}", id))?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", id)))
    }

    /// Get an account by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.repo.find_by_username(username.trim()).await
    }

    /// Execute a market order at the current quote
    ///
    /// The order is validated before any quote is fetched. The price and
    /// timestamp are fixed once and reused if the repository retries the
    /// atomic section.
    pub async fn execute_order(&self, account_id: Uuid, order: &OrderRequest) -> Result<ExecutedOrder> {
        let validated = validate_order(order)?;

        let price = self
            .quotes
            .get_price(&validated.symbol)
            .await
            .with_context(|| format!("Pricing {} order", validated.symbol))?;
        if price <= Decimal::ZERO {
            return Err(Error::QuoteUnavailable(format!(
                "Non-positive quote {} for {}", price, validated.symbol
            )));
        }
        let now = self.clock.now();

        let apply = |account: &Account, holding: Option<&Holding>| apply_order(account, holding, order, price, now);
        let result = self.repo.run_atomic(account_id, &validated.symbol, &apply).await;

        match &result {
            Ok(executed) => {
                let tx = &executed.transaction;
                if self.config.transaction_logging {
                    info!(
                        "Executed {} {} {} @ {} for account {} (balance {})",
                        tx.side, tx.quantity, tx.symbol, tx.price, account_id, executed.new_balance
                    );
                } else {
                    debug!("Executed transaction {} for account {}", tx.id, account_id);
                }
            }
            Err(e) if e.is_rejection() => {
                info!("Rejected {} order for account {}: {}", validated.side, account_id, e);
            }
            Err(e) if e.is_retryable() => {
                warn!("Order for account {} not executed: {}", account_id, e);
            }
            Err(e) => {
                error!("Error executing order for account {}: {}", account_id, e);
            }
        }

        result
    }

    /// Holdings of an account valued at current quotes
    pub async fn get_portfolio(&self, account_id: Uuid) -> Result<Portfolio> {
        let account = self.get_account(account_id).await?;
        let holdings = self.repo.get_holdings(account_id).await?;

        let mut positions = Vec::with_capacity(holdings.len());
        for holding in &holdings {
            let price = self
                .quotes
                .get_price(&holding.symbol)
                .await
                .with_context(|| format!("Valuing {}", holding.symbol))?;
            positions.push(Position::value(holding, price));
        }

        Ok(Portfolio::new(&account, positions))
    }

    /// Raw holdings of an account
    pub async fn get_holdings(&self, account_id: Uuid) -> Result<Vec<Holding>> {
        self.get_account(account_id).await?;
        self.repo.get_holdings(account_id).await
    }

    /// Executed orders of an account, oldest first
    pub async fn get_transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        self.get_account(account_id).await?;
        self.repo.get_transactions(account_id).await
    }
}

fn validate_username(raw: &str) -> Result<String> {
    let username = raw.trim();

    if username.len() < MIN_USERNAME_LEN || username.len() > MAX_USERNAME_LEN {
        return Err(Error::ValidationError(format!(
            "Username must be {} to {} characters long",
            MIN_USERNAME_LEN, MAX_USERNAME_LEN
        )));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(Error::ValidationError(format!(
            "Username may only contain letters, digits, '_', '-' and '.': {}",
            username
        )));
    }

    Ok(username.to_string())
}
