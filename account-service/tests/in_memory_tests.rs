use std::sync::Arc;
use std::time::Duration;

use account_service::{AccountRepository, InMemoryAccountRepository};
use chrono::{TimeZone, Utc};
use common::decimal::dec;
use common::error::Error;
use common::model::{Account, OrderRequest};
use ledger_engine::apply_order;
use uuid::Uuid;

fn new_account(username: &str) -> Account {
    Account::new(username, dec!(1000.00), Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap())
}

#[tokio::test]
async fn test_create_and_find_account() {
    let repo = InMemoryAccountRepository::new();
    let account = repo.create_account(new_account("alice")).await.unwrap();

    let by_id = repo.get_account(account.id).await.unwrap().unwrap();
    let by_name = repo.find_by_username("alice").await.unwrap().unwrap();

    assert_eq!(by_id, account);
    assert_eq!(by_name.id, account.id);
    assert!(repo.get_account(Uuid::new_v4()).await.unwrap().is_none());
    assert!(repo.find_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let repo = InMemoryAccountRepository::new();
    repo.create_account(new_account("alice")).await.unwrap();

    let result = repo.create_account(new_account("alice")).await;

    assert!(matches!(result, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_run_atomic_commits_all_parts() {
    let repo = InMemoryAccountRepository::new();
    let account = repo.create_account(new_account("alice")).await.unwrap();
    let now = Utc::now();
    let order = OrderRequest::buy("AAPL", dec!(2));

    let executed = repo
        .run_atomic(account.id, "AAPL", &|a, h| apply_order(a, h, &order, dec!(150.00), now))
        .await
        .unwrap();

    let stored = repo.get_account(account.id).await.unwrap().unwrap();
    assert_eq!(stored.cash_balance, dec!(700.00));
    assert_eq!(stored.updated_at, now);
    let holding = repo.get_holding(account.id, "AAPL").await.unwrap().unwrap();
    assert_eq!(holding.quantity, 2);
    let transactions = repo.get_transactions(account.id).await.unwrap();
    assert_eq!(transactions, vec![executed.transaction]);
}

#[tokio::test]
async fn test_rejected_apply_leaves_state_untouched() {
    let repo = InMemoryAccountRepository::new();
    let account = repo.create_account(new_account("alice")).await.unwrap();
    let order = OrderRequest::buy("GOOGL", dec!(1));

    let result = repo
        .run_atomic(account.id, "GOOGL", &|a, h| apply_order(a, h, &order, dec!(2800.00), Utc::now()))
        .await;

    assert!(matches!(result, Err(Error::InsufficientFunds(_))));
    assert_eq!(repo.get_account(account.id).await.unwrap().unwrap(), account);
    assert!(repo.get_holdings(account.id).await.unwrap().is_empty());
    assert!(repo.get_transactions(account.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_atomic_on_unknown_account() {
    let repo = InMemoryAccountRepository::new();
    let order = OrderRequest::buy("AAPL", dec!(1));

    let result = repo
        .run_atomic(Uuid::new_v4(), "AAPL", &|a, h| apply_order(a, h, &order, dec!(150.00), Utc::now()))
        .await;

    assert!(matches!(result, Err(Error::AccountNotFound(_))));
}

#[tokio::test]
async fn test_holdings_are_ordered_by_symbol() {
    let repo = InMemoryAccountRepository::new();
    let account = repo.create_account(new_account("alice")).await.unwrap();

    for symbol in ["TSLA", "AAPL", "MSFT"] {
        let order = OrderRequest::buy(symbol, dec!(1));
        repo.run_atomic(account.id, symbol, &|a, h| apply_order(a, h, &order, dec!(10.00), Utc::now()))
            .await
            .unwrap();
    }

    let symbols: Vec<String> = repo
        .get_holdings(account.id)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.symbol)
        .collect();
    assert_eq!(symbols, vec!["AAPL", "MSFT", "TSLA"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lock_wait_is_bounded() {
    let repo = Arc::new(InMemoryAccountRepository::with_lock_timeout(Duration::from_millis(20)));
    let account_id = repo.create_account(new_account("alice")).await.unwrap().id;

    // First order holds the account lock while its apply step blocks
    let slow = {
        let repo = repo.clone();
        tokio::spawn(async move {
            let order = OrderRequest::buy("AAPL", dec!(1));
            let result = repo
                .run_atomic(account_id, "AAPL", &|a, h| {
                    std::thread::sleep(Duration::from_millis(300));
                    apply_order(a, h, &order, dec!(150.00), Utc::now())
                })
                .await;
            result
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let order = OrderRequest::buy("MSFT", dec!(1));
    let contended = repo
        .run_atomic(account_id, "MSFT", &|a, h| apply_order(a, h, &order, dec!(300.00), Utc::now()))
        .await;

    assert!(matches!(contended, Err(Error::PersistenceConflict(_))));
    assert!(slow.await.unwrap().is_ok());
    assert_eq!(repo.get_holdings(account_id).await.unwrap().len(), 1);
}
