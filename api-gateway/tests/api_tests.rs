use std::sync::Arc;

use account_service::{AccountService, AccountServiceConfig, InMemoryAccountRepository};
use api_gateway::{router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::clock::SystemClock;
use common::decimal::dec;
use market_data::{FixedQuoteProvider, MarketDataService, MockQuoteProvider, QuoteProvider};
use serde_json::{json, Value};
use tower::ServiceExt;
use tracing::Level;

struct TestApp {
    app: Router,
    quotes: Arc<FixedQuoteProvider>,
}

fn app_with_quotes(quotes: Arc<dyn QuoteProvider>) -> Router {
    let config = AccountServiceConfig::default().with_initial_balance(dec!(1000.00));
    let account_service = AccountService::new(
        Arc::new(InMemoryAccountRepository::with_config(&config)),
        quotes.clone(),
        Arc::new(SystemClock),
        config,
    );
    let market_data_service = MarketDataService::new(quotes);
    let state = Arc::new(AppState::new(Arc::new(account_service), Arc::new(market_data_service)));

    router(state, Level::DEBUG)
}

fn test_app() -> TestApp {
    let quotes = Arc::new(
        FixedQuoteProvider::new()
            .with_price("AAPL", dec!(150.00))
            .with_price("MSFT", dec!(300.00)),
    );

    TestApp {
        app: app_with_quotes(quotes.clone()),
        quotes,
    }
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(app, Method::POST, "/api/register", None, Some(json!({ "username": username }))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["token"].as_str().unwrap().to_string()
}

fn decimal(value: &Value) -> rust_decimal::Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_register_and_current_user() {
    let t = test_app();

    let (status, body) = send(&t.app, Method::POST, "/api/register", None, Some(json!({ "username": "alice" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["account"]["username"], "alice");
    assert_eq!(decimal(&body["data"]["account"]["cash_balance"]), dec!(1000.00));
    let token = body["data"]["token"].as_str().unwrap();

    let (status, body) = send(&t.app, Method::GET, "/api/user", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");

    let (status, body) = send(&t.app, Method::POST, "/api/register", None, Some(json!({ "username": "alice" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationError");
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let t = test_app();
    let token = register(&t.app, "alice").await;

    let request = Request::builder()
        .uri("/api/user")
        .header(header::COOKIE, format!("session={}", token))
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let t = test_app();

    for (method, uri) in [
        (Method::GET, "/api/user"),
        (Method::GET, "/api/portfolio"),
        (Method::GET, "/api/portfolio/history"),
        (Method::GET, "/api/transactions"),
        (Method::POST, "/api/logout"),
    ] {
        let (status, body) = send(&t.app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["kind"], "Unauthorized");
        assert!(body["request_id"].is_string());
    }

    let (status, _) = send(&t.app, Method::GET, "/api/user", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let t = test_app();
    let token = register(&t.app, "alice").await;

    let (status, body) = send(&t.app, Method::POST, "/api/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Logged out");

    let (status, _) = send(&t.app, Method::GET, "/api/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_reopens_account_after_logout() {
    let t = test_app();
    let token = register(&t.app, "alice").await;

    let order = json!({ "symbol": "AAPL", "side": "buy", "quantity": 2 });
    let (status, _) = send(&t.app, Method::POST, "/api/trade", Some(&token), Some(order)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&t.app, Method::POST, "/api/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&t.app, Method::POST, "/api/login", None, Some(json!({ "username": " alice " }))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let new_token = body["data"]["token"].as_str().unwrap().to_string();
    assert_ne!(new_token, token);
    assert_eq!(body["data"]["account"]["username"], "alice");

    let (status, body) = send(&t.app, Method::GET, "/api/user", Some(&new_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["data"]["cash_balance"]), dec!(700.00));

    let (status, body) = send(&t.app, Method::GET, "/api/portfolio", Some(&new_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["positions"][0]["quantity"], 2);

    // The revoked token stays dead
    let (status, _) = send(&t.app, Method::GET, "/api/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_unknown_username() {
    let t = test_app();

    let (status, body) = send(&t.app, Method::POST, "/api/login", None, Some(json!({ "username": "nobody" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "Unauthorized");

    let (status, body) = send(&t.app, Method::POST, "/api/login", None, Some(json!({ "name": "alice" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationError");
}

#[tokio::test]
async fn test_trade_flow() {
    let t = test_app();
    let token = register(&t.app, "trader").await;

    let order = json!({ "symbol": "aapl", "side": "buy", "quantity": 2 });
    let (status, body) = send(&t.app, Method::POST, "/api/trade", Some(&token), Some(order)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["symbol"], "AAPL");
    assert_eq!(body["data"]["side"], "buy");
    assert_eq!(decimal(&body["data"]["amount"]), dec!(300.00));
    assert_eq!(decimal(&body["meta"]["cash_balance"]), dec!(700.00));

    t.quotes.set_price("AAPL", dec!(180.00));
    let order = json!({ "symbol": "AAPL", "type": "buy", "quantity": 1 });
    let (status, _) = send(&t.app, Method::POST, "/api/trade", Some(&token), Some(order)).await;
    assert_eq!(status, StatusCode::CREATED);

    t.quotes.set_price("AAPL", dec!(200.00));
    let (status, body) = send(&t.app, Method::GET, "/api/portfolio", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let position = &body["data"]["positions"][0];
    assert_eq!(position["quantity"], 3);
    assert_eq!(decimal(&position["average_cost"]), dec!(160.00));
    assert_eq!(decimal(&position["current_value"]), dec!(600.00));
    assert_eq!(decimal(&position["gain_loss"]), dec!(120.00));
    assert_eq!(decimal(&body["data"]["summary"]["total_equity"]), dec!(1120.00));

    let order = json!({ "symbol": "AAPL", "side": "sell", "quantity": 3 });
    let (status, body) = send(&t.app, Method::POST, "/api/trade", Some(&token), Some(order)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(decimal(&body["meta"]["cash_balance"]), dec!(1120.00));

    let (status, body) = send(&t.app, Method::GET, "/api/portfolio/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let sides: Vec<&str> = body["data"].as_array().unwrap().iter().map(|t| t["side"].as_str().unwrap()).collect();
    assert_eq!(sides, vec!["buy", "buy", "sell"]);
    assert_eq!(body["meta"]["count"], 3);

    let (status, transactions) = send(&t.app, Method::GET, "/api/transactions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(transactions, body);
}

#[tokio::test]
async fn test_trade_rejections() {
    let t = test_app();
    let token = register(&t.app, "trader").await;

    let cases = [
        (json!({ "symbol": "AAPL", "side": "buy", "quantity": 7 }), "InsufficientFunds"),
        (json!({ "symbol": "AAPL", "side": "sell", "quantity": 1 }), "InsufficientHoldings"),
        (json!({ "symbol": "AAPL", "side": "buy", "quantity": 1.5 }), "InvalidOrder"),
        (json!({ "symbol": "AAPL", "side": "buy", "quantity": 0 }), "InvalidOrder"),
        (json!({ "symbol": "NOT A TICKER", "side": "buy", "quantity": 1 }), "InvalidOrder"),
        (json!({ "symbol": "AAPL", "side": "hold", "quantity": 1 }), "ValidationError"),
    ];

    for (order, kind) in cases {
        let (status, body) = send(&t.app, Method::POST, "/api/trade", Some(&token), Some(order.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", order);
        assert_eq!(body["kind"], kind, "{}", order);
    }

    let (_, body) = send(&t.app, Method::GET, "/api/user", Some(&token), None).await;
    assert_eq!(decimal(&body["data"]["cash_balance"]), dec!(1000.00));
}

#[tokio::test]
async fn test_missing_quote_is_503() {
    let t = test_app();
    let token = register(&t.app, "trader").await;

    let order = json!({ "symbol": "NFLX", "side": "buy", "quantity": 1 });
    let (status, body) = send(&t.app, Method::POST, "/api/trade", Some(&token), Some(order)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["kind"], "QuoteUnavailable");
}

#[tokio::test]
async fn test_stock_endpoints() {
    let t = test_app();

    let (status, body) = send(&t.app, Method::GET, "/api/stocks/msft", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["symbol"], "MSFT");
    assert_eq!(decimal(&body["data"]["price"]), dec!(300.00));

    let (status, body) = send(&t.app, Method::GET, "/api/stocks/MSFT/history?days=5", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 6);

    let (status, body) = send(&t.app, Method::GET, "/api/stocks/MSFT/history", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 31);

    let (status, body) = send(&t.app, Method::GET, "/api/stocks/MSFT/history?days=0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationError");

    let (status, body) = send(&t.app, Method::GET, "/api/stocks/MSFT/history?days=abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationError");
}

#[tokio::test]
async fn test_predict() {
    let t = test_app();

    let (status, body) = send(&t.app, Method::POST, "/api/predict", None, Some(json!({ "symbol": "AAPL" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["actual"].as_array().unwrap().len(), 51);
    assert_eq!(body["data"]["predicted"].as_array().unwrap().len(), 51);
    assert_eq!(decimal(&body["data"]["next_day_prediction"]), dec!(150.00));

    let (status, body) = send(&t.app, Method::POST, "/api/predict", None, Some(json!({ "symbol": "AAPL", "days": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "ValidationError");
}

#[tokio::test]
async fn test_health() {
    let t = test_app();

    let (status, body) = send(&t.app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["repository"]["backend"], "memory");
    assert_eq!(body["quote_feed"]["backend"], "fixed");

    t.quotes.set_unavailable(true);
    let (status, body) = send(&t.app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["quote_feed"]["status"], "down");
}

#[tokio::test]
async fn test_health_does_not_move_mock_prices() {
    let feed = Arc::new(MockQuoteProvider::with_seed(11));
    let app = app_with_quotes(feed.clone());

    for _ in 0..5 {
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["quote_feed"]["backend"], "mock");
    }

    assert_eq!(feed.tracked_symbols(), 0);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let t = test_app();

    let (status, body) = send(&t.app, Method::GET, "/api-docs/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/trade"].is_object());
    assert!(body["paths"]["/api/login"].is_object());
    assert!(body["paths"]["/api/transactions"].is_object());
}
