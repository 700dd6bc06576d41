//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::{Value, json};
use trading_engine::config::{Config, load_config_from_string};
use trading_engine::infrastructure::config::Container;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fast, jitter-free retries so failure paths finish quickly.
pub const FAST_RETRY: &str = r"
retry:
  max_attempts: 3
  initial_backoff_ms: 1
  max_backoff_ms: 5
  multiplier: 2.0
  jitter_factor: 0.0
";

pub fn config(yaml: &str) -> Config {
    load_config_from_string(&format!("{FAST_RETRY}\n{yaml}")).unwrap()
}

pub fn container(yaml: &str) -> Container {
    Container::from_config(&config(yaml))
}

/// Engine pointed at `server` with a complete credential set.
pub fn live_container(server: &MockServer, extra_yaml: &str) -> Container {
    container(&format!(
        r#"
exchange:
  base_url: "{}"
  timeout_secs: 5
  api_key: test-key
  api_secret: test-secret
{extra_yaml}
"#,
        server.uri()
    ))
}

pub fn decimal(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

pub fn filled_order(client_order_id: &str) -> Value {
    json!({
        "orderId": format!("bv-{client_order_id}"),
        "clientOrderId": client_order_id,
        "market": "BTC-EUR",
        "created": 1_700_000_000_000_i64,
        "updated": 1_700_000_000_100_i64,
        "status": "filled",
        "side": "buy",
        "orderType": "market",
        "amount": "0.001",
        "filledAmount": "0.001",
        "filledAmountQuote": "50",
        "feePaid": "0.125",
        "feeCurrency": "EUR"
    })
}

/// Mount the read endpoints every live execution touches.
pub async fn mount_exchange_reads(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"time": 1_700_000_000_000_i64})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/balance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"symbol": "EUR", "available": "100000", "inOrder": "0"},
            {"symbol": "BTC", "available": "2", "inOrder": "0"}
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ordersOpen"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ticker/price"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"market": "BTC-EUR", "price": "50000"})),
        )
        .mount(server)
        .await;
}

/// A healthy exchange whose order endpoint answers after `place_delay`.
pub async fn healthy_exchange(place_delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    mount_exchange_reads(&server).await;
    Mock::given(method("POST"))
        .and(path("/order"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(filled_order("cid"))
                .set_delay(place_delay),
        )
        .mount(&server)
        .await;
    server
}

/// Number of order placements the exchange received.
pub async fn placements(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == "/order")
        .count()
}

/// Number of order lookups (`GET /order`) the exchange received.
pub async fn lookups(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == "/order")
        .count()
}

/// Answer client-id lookups with "no order found".
pub async fn mount_lookup_miss(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/order"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"errorCode": 240, "error": "No order found"})),
        )
        .mount(server)
        .await;
}
