//! Runtime integration tests
//!
//! Tests for the tick loop, request ordering, rate limiting and shutdown.

use std::sync::Arc;

use ntest::timeout;
use serde_json::json;
use tokio::sync::{mpsc, oneshot};

use table_core::{Database, ServiceConfig, TableError};
use table_runtime::{ApiRequest, QueryParams, Runtime};
use table_types::{field, SystemProperties};

fn test_config() -> ServiceConfig {
    ServiceConfig {
        tickrate: 200,
        max_api_requests_per_tick: 100,
        ..Default::default()
    }
}

fn stored_rows(db: &Database, table: &str) -> usize {
    db.query(table, None, 0, usize::MAX, SystemProperties::none())
        .unwrap()
        .len()
}

fn insert(
    tx: &mpsc::Sender<ApiRequest>,
    table: &str,
    row: serde_json::Value,
) -> oneshot::Receiver<table_runtime::Result<serde_json::Value>> {
    let (response, rx) = oneshot::channel();
    tx.try_send(ApiRequest::Insert {
        table: table.to_string(),
        row,
        properties: SystemProperties::all(),
        response,
    })
    .unwrap();
    rx
}

#[test]
#[timeout(5000)]
fn test_runtime_applies_requests_in_order() {
    let db = Arc::new(Database::new());
    let (tx, rx) = mpsc::channel(100);
    let mut runtime = Runtime::new(db.clone(), test_config(), rx);

    let mut first = insert(&tx, "items", json!({"id": "a", "n": 1}));

    let (response, mut updated) = oneshot::channel();
    tx.try_send(ApiRequest::Update {
        table: "items".to_string(),
        id: "a".to_string(),
        patch: json!({"n": 2}),
        if_match: None,
        properties: SystemProperties::all(),
        response,
    })
    .unwrap();

    runtime.tick();

    let inserted = first.try_recv().unwrap().unwrap();
    let updated = updated.try_recv().unwrap().unwrap();
    assert_eq!(updated["n"], 2);
    assert_ne!(inserted["__version"], updated["__version"]);
    assert_eq!(runtime.stats().processed, 2);
}

#[test]
#[timeout(5000)]
fn test_runtime_rate_limits_per_tick() {
    let db = Arc::new(Database::new());
    let (tx, rx) = mpsc::channel(100);
    let config = ServiceConfig {
        max_api_requests_per_tick: 3,
        ..test_config()
    };
    let mut runtime = Runtime::new(db.clone(), config, rx);

    let responses: Vec<_> = (0..5)
        .map(|i| insert(&tx, "items", json!({"id": format!("r{}", i)})))
        .collect();

    runtime.tick();
    assert_eq!(stored_rows(&db, "items"), 3);
    assert_eq!(runtime.queue_len(), 2);

    runtime.tick();
    assert_eq!(stored_rows(&db, "items"), 5);
    for mut rx in responses {
        assert!(rx.try_recv().unwrap().is_ok());
    }
}

#[test]
#[timeout(5000)]
fn test_query_caps_top_and_reports_count() {
    let db = Arc::new(Database::new());
    let (tx, rx) = mpsc::channel(100);
    let config = ServiceConfig {
        max_top: 2,
        ..test_config()
    };
    let mut runtime = Runtime::new(db, config, rx);

    for i in 0..4 {
        insert(&tx, "items", json!({"id": format!("r{}", i), "even": i % 2 == 0}));
    }

    let (response, mut capped) = oneshot::channel();
    tx.try_send(ApiRequest::Query {
        table: "items".to_string(),
        query: QueryParams {
            top: Some(50),
            ..Default::default()
        },
        response,
    })
    .unwrap();

    let (response, mut filtered) = oneshot::channel();
    tx.try_send(ApiRequest::Query {
        table: "items".to_string(),
        query: QueryParams {
            filter: Some(field("even").eq(true)),
            properties: SystemProperties::all(),
            ..Default::default()
        },
        response,
    })
    .unwrap();

    runtime.tick();

    let capped = capped.try_recv().unwrap().unwrap();
    assert_eq!(capped["count"], 2);
    assert!(capped["results"][0].get("__version").is_none());

    let filtered = filtered.try_recv().unwrap().unwrap();
    assert_eq!(filtered["count"], 2);
    assert_eq!(filtered["results"][1]["id"], "r2");
    assert!(filtered["results"][1].get("__version").is_some());
}

#[test]
#[timeout(5000)]
fn test_errors_are_returned_to_caller() {
    let db = Arc::new(Database::new());
    let (tx, rx) = mpsc::channel(100);
    let mut runtime = Runtime::new(db, test_config(), rx);

    let (response, mut missing) = oneshot::channel();
    tx.try_send(ApiRequest::Delete {
        table: "items".to_string(),
        id: "nope".to_string(),
        response,
    })
    .unwrap();

    runtime.tick();
    assert!(matches!(
        missing.try_recv().unwrap(),
        Err(TableError::TableNotFound { .. })
    ));
}

#[test]
#[timeout(5000)]
fn test_run_stops_when_senders_drop() {
    let db = Arc::new(Database::new());
    let (api_tx, handle) = table_runtime::spawn(db.clone(), test_config()).unwrap();

    let mut rx = insert(&api_tx, "items", json!({"id": "a"}));
    drop(api_tx);
    handle.join().unwrap();

    assert!(rx.try_recv().unwrap().is_ok());
    assert_eq!(stored_rows(&db, "items"), 1);
}
