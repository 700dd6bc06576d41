//! Mode switching and execution scenarios against the simulated gateways.

mod common;

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use rust_decimal_macros::dec;
use trading_engine::domain::order_execution::Venue;
use trading_engine::{ErrorCode, OrderRequest, OrderSide, OrderStatus, TradingMode};

const SMALL_ACCOUNT: &str = r"
simulation:
  starting_balances:
    EUR: 1000
";

fn btc_limit_buy(amount: rust_decimal::Decimal) -> OrderRequest {
    OrderRequest::limit_order("BTC-EUR".parse().unwrap(), OrderSide::Buy, amount, dec!(50000))
}

#[tokio::test]
async fn dry_run_buy_beyond_balance_is_insufficient_funds() {
    let engine = common::container(SMALL_ACCOUNT);

    let err = engine.orders().execute(btc_limit_buy(dec!(1))).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::InsufficientFunds);
    let balance = engine.orders().balance().await.unwrap();
    assert_eq!(balance.data.available("EUR"), dec!(1000));
    assert!(engine.orders().journal(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn demo_buy_within_balance_fills_in_demo() {
    let engine = common::container(SMALL_ACCOUNT);
    engine
        .modes()
        .set_mode(TradingMode::Demo, false)
        .await
        .unwrap();

    let result = engine.orders().execute(btc_limit_buy(dec!(0.001))).await.unwrap();

    assert_eq!(result.status, OrderStatus::Filled);
    assert_eq!(result.executing_mode, TradingMode::Demo);
    assert_eq!(result.venue, Venue::Simulated);
    assert!(result.dry_run);
    assert!(!result.is_live_execution());
}

#[tokio::test]
async fn dry_run_and_demo_keep_separate_books() {
    let engine = common::container(SMALL_ACCOUNT);
    engine.orders().execute(btc_limit_buy(dec!(0.001))).await.unwrap();

    engine.modes().set_mode(TradingMode::Demo, false).await.unwrap();
    let demo = engine.orders().balance().await.unwrap();

    assert_eq!(demo.mode, TradingMode::Demo);
    assert_eq!(demo.data.available("EUR"), dec!(1000));
    assert!(demo.data.available("BTC").is_zero());
}

#[tokio::test]
async fn live_without_credentials_leaves_mode_unchanged() {
    let engine = common::container("trading:\n  initial_mode: demo\n");

    let err = engine
        .modes()
        .set_mode(TradingMode::Live, false)
        .await
        .unwrap_err();

    assert_eq!(trading_engine::ExecutionError::from(err).code(), ErrorCode::CredentialValidation);
    let status = engine.modes().status();
    assert_eq!(status.current_mode, TradingMode::Demo);
    assert!(!status.is_live_trading);
}

#[tokio::test]
async fn live_rehearsal_routes_to_simulation() {
    let engine = common::container("");

    let status = engine.modes().set_mode(TradingMode::Live, true).await.unwrap();
    assert!(status.dry_run_enabled);
    assert!(!status.is_live_trading);

    let result = engine.orders().execute(btc_limit_buy(dec!(0.001))).await.unwrap();
    assert_eq!(result.executing_mode, TradingMode::Live);
    assert!(result.dry_run);
    assert_eq!(result.venue, Venue::Simulated);
    assert!(!result.is_live_execution());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn emergency_dry_run_during_concurrent_executions() {
    let engine = common::container("trading:\n  initial_mode: demo\n");
    let orders = engine.orders();
    let modes = engine.modes();

    let spawn_batch = |count: usize| {
        (0..count)
            .map(|_| {
                let orders = Arc::clone(&orders);
                tokio::spawn(async move {
                    let request = OrderRequest::market_order(
                        "ADA-EUR".parse().unwrap(),
                        OrderSide::Buy,
                        dec!(1),
                    );
                    orders.execute(request).await
                })
            })
            .collect::<Vec<_>>()
    };

    let before = spawn_batch(100);
    tokio::time::sleep(Duration::from_millis(1)).await;
    let snapshot = modes.enable_emergency_dry_run();
    assert_eq!(snapshot.current_mode, TradingMode::DryRun);
    let after = spawn_batch(20);

    for handle in before {
        let result = handle.await.unwrap().unwrap();
        assert!(matches!(
            result.executing_mode,
            TradingMode::Demo | TradingMode::DryRun
        ));
        assert_eq!(result.venue, Venue::Simulated);
    }
    for handle in after {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.executing_mode, TradingMode::DryRun);
    }

    let status = modes.status();
    assert_eq!(status.current_mode, TradingMode::DryRun);
    assert!(status.dry_run_enabled);
}

#[tokio::test]
async fn repeated_client_order_id_places_once() {
    let engine = common::container("");
    let key = trading_engine::domain::shared::ClientOrderId::generate();
    let request = || OrderRequest::market_order("ETH-EUR".parse().unwrap(), OrderSide::Buy, dec!(0.1));

    let first = engine
        .orders()
        .execute_with_key(request(), key.clone())
        .await
        .unwrap();
    let second = engine.orders().execute_with_key(request(), key).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.orders().journal(10).await.unwrap().len(), 1);
}

proptest! {
    #[test]
    fn status_is_stable_without_transitions(demo in any::<bool>(), reads in 1usize..50) {
        let yaml = if demo { "trading:\n  initial_mode: demo\n" } else { "" };
        let engine = common::container(yaml);
        let first = engine.modes().status();
        for _ in 0..reads {
            prop_assert_eq!(engine.modes().status(), first.clone());
        }
    }
}
