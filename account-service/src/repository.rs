//! Repository for account data
//!
//! Both implementations funnel every ledger write through
//! [`AccountRepository::run_atomic`]: the account is locked, a fresh snapshot
//! of it and of its holding in the traded symbol is handed to the caller's
//! apply function, and the resulting balance, holding and transaction are
//! committed together or not at all.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::db::models::{shares_to_db, DbAccount, DbHolding, DbTransaction};
use common::db::transaction::{is_conflict, is_unique_violation};
use common::db::{self, DbPool, PgTransaction, PgTransactionManager, TransactionManager};
use common::error::{Error, ErrorExt, Result};
use common::model::{Account, Holding, Transaction};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ledger_engine::{ExecutedOrder, HoldingChange};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AccountServiceConfig;

/// Order application run inside the atomic section
///
/// Receives the locked account and its holding in the traded symbol. An
/// `Err` aborts the section and leaves the stored state untouched.
pub type ApplyFn<'a> = dyn Fn(&Account, Option<&Holding>) -> Result<ExecutedOrder> + Send + Sync + 'a;

/// Account repository trait defining the interface for account data storage
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Store a new account; usernames are unique
    async fn create_account(&self, account: Account) -> Result<Account>;

    /// Get an account by ID
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>>;

    /// Get an account by username
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// All holdings of an account, ordered by symbol
    async fn get_holdings(&self, account_id: Uuid) -> Result<Vec<Holding>>;

    /// Holding of an account in one symbol
    async fn get_holding(&self, account_id: Uuid, symbol: &str) -> Result<Option<Holding>>;

    /// Executed orders of an account, oldest first
    async fn get_transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>>;

    /// Apply a ledger change to one account atomically
    ///
    /// Orders on the same account are serialized. Failing to obtain the
    /// account within the configured bound surfaces as
    /// `Error::PersistenceConflict`; an unknown account as
    /// `Error::AccountNotFound`.
    async fn run_atomic(&self, account_id: Uuid, symbol: &str, apply: &ApplyFn<'_>) -> Result<ExecutedOrder>;

    /// Cheap liveness check
    async fn ping(&self) -> Result<()>;

    /// Repository name used in logs and health output
    fn name(&self) -> &str;
}

/// Everything stored for one account
#[derive(Debug, Clone)]
struct AccountLedger {
    account: Account,
    holdings: BTreeMap<String, Holding>,
    transactions: Vec<Transaction>,
}

/// In-memory repository for account data
///
/// Each account's ledger sits behind its own async mutex, so an order on one
/// account never waits for another account.
pub struct InMemoryAccountRepository {
    /// Ledgers by account ID
    ledgers: DashMap<Uuid, Arc<Mutex<AccountLedger>>>,
    /// Account IDs by username
    usernames: DashMap<String, Uuid>,
    /// Longest wait for an account's lock
    lock_timeout: Duration,
}

impl InMemoryAccountRepository {
    /// Create a new in-memory account repository
    pub fn new() -> Self {
        Self::with_lock_timeout(Duration::from_millis(2000))
    }

    /// Create a repository with an explicit lock wait bound
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            ledgers: DashMap::new(),
            usernames: DashMap::new(),
            lock_timeout,
        }
    }

    /// Create a repository from the service configuration
    pub fn with_config(config: &AccountServiceConfig) -> Self {
        Self::with_lock_timeout(config.lock_timeout)
    }

    async fn lock(&self, account_id: Uuid) -> Result<Option<OwnedMutexGuard<AccountLedger>>> {
        // Clone the handle out so the DashMap shard is not held across the await
        let ledger = match self.ledgers.get(&account_id) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };

        tokio::time::timeout(self.lock_timeout, ledger.lock_owned())
            .await
            .map(Some)
            .map_err(|_| {
                Error::PersistenceConflict(format!(
                    "Timed out after {}ms waiting for account {}",
                    self.lock_timeout.as_millis(),
                    account_id
                ))
            })
    }
}

impl Default for InMemoryAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create_account(&self, account: Account) -> Result<Account> {
        match self.usernames.entry(account.username.clone()) {
            Entry::Occupied(_) => Err(Error::ValidationError(format!(
                "Username {} is already taken", account.username
            ))),
            Entry::Vacant(slot) => {
                let ledger = AccountLedger {
                    account: account.clone(),
                    holdings: BTreeMap::new(),
                    transactions: Vec::new(),
                };
                self.ledgers.insert(account.id, Arc::new(Mutex::new(ledger)));
                slot.insert(account.id);
                Ok(account)
            }
        }
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.lock(id).await?.map(|ledger| ledger.account.clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let id = match self.usernames.get(username) {
            Some(entry) => *entry.value(),
            None => return Ok(None),
        };
        self.get_account(id).await
    }

    async fn get_holdings(&self, account_id: Uuid) -> Result<Vec<Holding>> {
        Ok(self
            .lock(account_id)
            .await?
            .map(|ledger| ledger.holdings.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_holding(&self, account_id: Uuid, symbol: &str) -> Result<Option<Holding>> {
        Ok(self
            .lock(account_id)
            .await?
            .and_then(|ledger| ledger.holdings.get(symbol).cloned()))
    }

    async fn get_transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        Ok(self
            .lock(account_id)
            .await?
            .map(|ledger| ledger.transactions.clone())
            .unwrap_or_default())
    }

    async fn run_atomic(&self, account_id: Uuid, symbol: &str, apply: &ApplyFn<'_>) -> Result<ExecutedOrder> {
        let mut ledger = self
            .lock(account_id)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", account_id)))?;

        let executed = apply(&ledger.account, ledger.holdings.get(symbol))?;

        // Nothing below can fail, so the three writes land together
        ledger.account = executed.updated_account(&ledger.account);
        match &executed.holding {
            HoldingChange::Upsert(holding) => {
                ledger.holdings.insert(holding.symbol.clone(), holding.clone());
            }
            HoldingChange::Remove { symbol } => {
                ledger.holdings.remove(symbol);
            }
        }
        ledger.transactions.push(executed.transaction.clone());

        Ok(executed)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// PostgreSQL repository for account data
pub struct PostgresAccountRepository {
    /// Database connection pool
    pool: DbPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
    /// Bound on row lock waits
    lock_timeout: Duration,
    /// Extra attempts after a conflict
    max_conflict_retries: u32,
}

impl PostgresAccountRepository {
    /// Create a repository on an existing pool
    pub fn from_pool(pool: DbPool, config: &AccountServiceConfig) -> Self {
        Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
            lock_timeout: config.lock_timeout,
            max_conflict_retries: config.max_conflict_retries,
        }
    }

    /// Create a new PostgreSQL account repository with configuration
    pub async fn with_config(config: &AccountServiceConfig) -> Result<Self> {
        info!("Connecting to PostgreSQL database with pool size: {}", config.db_pool_size);

        let pool = db::connect(&config.database_url, config.db_pool_size, config.lock_timeout)
            .await
            .with_context(|| "Failed to connect to PostgreSQL")?;

        info!("Connected to PostgreSQL database");
        Ok(Self::from_pool(pool, config))
    }

    /// Underlying pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// One attempt: lock, read, apply, write, commit
    async fn attempt(&self, account_id: Uuid, symbol: &str, apply: &ApplyFn<'_>) -> Result<ExecutedOrder> {
        let mut tx = self.transaction_manager.begin_transaction().await?;
        tx.set_lock_timeout(self.lock_timeout).await?;

        let account: Account = sqlx::query_as::<_, DbAccount>(
            "SELECT id, username, cash_balance, created_at, updated_at
             FROM accounts
             WHERE id = $1
             FOR UPDATE",
        )
        .bind(account_id)
        .fetch_optional(tx.conn())
        .await?
        .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", account_id)))?
        .into();

        let holding = sqlx::query_as::<_, DbHolding>(
            "SELECT account_id, symbol, quantity, average_cost, updated_at
             FROM holdings
             WHERE account_id = $1 AND symbol = $2
             FOR UPDATE",
        )
        .bind(account_id)
        .bind(symbol)
        .fetch_optional(tx.conn())
        .await?
        .map(Holding::try_from)
        .transpose()?;

        let executed = match apply(&account, holding.as_ref()) {
            Ok(executed) => executed,
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        };

        write_executed(&mut tx, &executed).await?;
        tx.commit().await?;

        Ok(executed)
    }
}

/// Persist the three parts of an executed order inside `tx`
async fn write_executed(tx: &mut PgTransaction, executed: &ExecutedOrder) -> Result<()> {
    let record = &executed.transaction;

    sqlx::query("UPDATE accounts SET cash_balance = $2, updated_at = $3 WHERE id = $1")
        .bind(record.account_id)
        .bind(executed.new_balance)
        .bind(record.timestamp)
        .execute(tx.conn())
        .await?;

    match &executed.holding {
        HoldingChange::Upsert(holding) => {
            sqlx::query(
                "INSERT INTO holdings (account_id, symbol, quantity, average_cost, updated_at)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (account_id, symbol)
                 DO UPDATE SET
                    quantity = EXCLUDED.quantity,
                    average_cost = EXCLUDED.average_cost,
                    updated_at = EXCLUDED.updated_at",
            )
            .bind(holding.account_id)
            .bind(&holding.symbol)
            .bind(shares_to_db(holding.quantity)?)
            .bind(holding.average_cost)
            .bind(holding.updated_at)
            .execute(tx.conn())
            .await?;
        }
        HoldingChange::Remove { symbol } => {
            sqlx::query("DELETE FROM holdings WHERE account_id = $1 AND symbol = $2")
                .bind(record.account_id)
                .bind(symbol)
                .execute(tx.conn())
                .await?;
        }
    }

    sqlx::query(
        "INSERT INTO transactions (id, account_id, symbol, side, quantity, price, amount, executed_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.id)
    .bind(record.account_id)
    .bind(&record.symbol)
    .bind(record.side.as_str())
    .bind(shares_to_db(record.quantity)?)
    .bind(record.price)
    .bind(record.amount)
    .bind(record.timestamp)
    .execute(tx.conn())
    .await?;

    Ok(())
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create_account(&self, account: Account) -> Result<Account> {
        debug!("Creating account {} in database", account.username);

        let result = sqlx::query(
            "INSERT INTO accounts (id, username, cash_balance, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(account.cash_balance)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(account),
            Err(e) if is_unique_violation(&e) => Err(Error::ValidationError(format!(
                "Username {} is already taken", account.username
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        debug!("Getting account from database: {}", id);

        let row = sqlx::query_as::<_, DbAccount>(
            "SELECT id, username, cash_balance, created_at, updated_at FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, DbAccount>(
            "SELECT id, username, cash_balance, created_at, updated_at FROM accounts WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn get_holdings(&self, account_id: Uuid) -> Result<Vec<Holding>> {
        debug!("Getting all holdings for account: {}", account_id);

        let rows = sqlx::query_as::<_, DbHolding>(
            "SELECT account_id, symbol, quantity, average_cost, updated_at
             FROM holdings
             WHERE account_id = $1
             ORDER BY symbol",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Holding::try_from).collect()
    }

    async fn get_holding(&self, account_id: Uuid, symbol: &str) -> Result<Option<Holding>> {
        let row = sqlx::query_as::<_, DbHolding>(
            "SELECT account_id, symbol, quantity, average_cost, updated_at
             FROM holdings
             WHERE account_id = $1 AND symbol = $2",
        )
        .bind(account_id)
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Holding::try_from).transpose()
    }

    async fn get_transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, DbTransaction>(
            "SELECT id, account_id, symbol, side, quantity, price, amount, executed_at
             FROM transactions
             WHERE account_id = $1
             ORDER BY executed_at, id",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn run_atomic(&self, account_id: Uuid, symbol: &str, apply: &ApplyFn<'_>) -> Result<ExecutedOrder> {
        let mut retries = 0;

        loop {
            match self.attempt(account_id, symbol, apply).await {
                Err(Error::Database(e)) if is_conflict(&e) => {
                    if retries >= self.max_conflict_retries {
                        return Err(Error::PersistenceConflict(format!(
                            "Account {} still contended after {} retries: {}",
                            account_id, retries, e
                        )));
                    }
                    retries += 1;
                    warn!("Conflict on account {} ({}), retry {}", account_id, e, retries);
                    tokio::time::sleep(Duration::from_millis(10 * u64::from(retries))).await;
                }
                other => return other,
            }
        }
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "postgres"
    }
}
