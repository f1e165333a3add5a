use chrono::Utc;
use common::decimal::dec;
use common::model::{Account, Holding, OrderRequest};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ledger_engine::apply_order;

fn bench_apply_order(c: &mut Criterion) {
    let now = Utc::now();
    let account = Account::new("bench", dec!(1000000.00), now);
    let holding = Holding {
        account_id: account.id,
        symbol: "AAPL".to_string(),
        quantity: 300,
        average_cost: dec!(148.37),
        updated_at: now,
    };
    let buy = OrderRequest::buy("AAPL", dec!(7));
    let sell = OrderRequest::sell("AAPL", dec!(7));

    c.bench_function("buy_into_existing_holding", |b| {
        b.iter(|| apply_order(black_box(&account), Some(&holding), black_box(&buy), dec!(151.20), now))
    });

    c.bench_function("partial_sell", |b| {
        b.iter(|| apply_order(black_box(&account), Some(&holding), black_box(&sell), dec!(151.20), now))
    });
}

criterion_group!(benches, bench_apply_order);
criterion_main!(benches);
