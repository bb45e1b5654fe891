//! REST API integration tests against a server bound to an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;

use ntest::timeout;
use serde_json::{json, Value};

use table_api::{Router, Server};
use table_core::{Database, ServiceConfig};

async fn start(config: ServiceConfig) -> String {
    let config = Arc::new(config);
    let (api_tx, _runtime) =
        table_runtime::spawn(Arc::new(Database::new()), (*config).clone()).unwrap();
    let router = Router::new(config, api_tx).unwrap();
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = Server::new(addr, router).bind().await.unwrap();
    let base = format!("http://{}", server.local_addr().unwrap());
    tokio::spawn(server.serve());
    base
}

async fn json_body(response: reqwest::Response) -> Value {
    response.json().await.unwrap()
}

#[tokio::test(flavor = "multi_thread")]
#[timeout(10000)]
async fn test_row_lifecycle_over_http() {
    let base = start(ServiceConfig::default()).await;
    let client = reqwest::Client::new();
    let table = format!("{}/tables/items", base);

    let created = client
        .post(format!("{}?__systemproperties=*", table))
        .json(&json!({"id": "a", "name": "first"}))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);
    let created = json_body(created).await;
    assert_eq!(created["success"], true);
    let version = created["data"]["__version"].as_str().unwrap().to_string();
    assert!(created["data"]["__createdAt"].is_string());

    let lookup = json_body(client.get(format!("{}/a", table)).send().await.unwrap()).await;
    assert_eq!(lookup["data"]["name"], "first");
    assert!(lookup["data"].get("__version").is_none());

    let filtered = client
        .get(&table)
        .query(&[("$filter", format!("(__version eq '{}')", version))])
        .send()
        .await
        .unwrap();
    let filtered = json_body(filtered).await;
    assert_eq!(filtered["data"]["count"], 1);
    assert_eq!(filtered["data"]["results"][0]["id"], "a");

    let updated = client
        .patch(format!("{}/a?__systemproperties=__version", table))
        .header("If-Match", format!("\"{}\"", version))
        .json(&json!({"name": "second"}))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status(), 200);
    let updated = json_body(updated).await;
    assert_ne!(updated["data"]["__version"], Value::String(version.clone()));

    let deleted = client.delete(format!("{}/a", table)).send().await.unwrap();
    assert_eq!(deleted.status(), 204);
    let again = client.delete(format!("{}/a", table)).send().await.unwrap();
    assert_eq!(again.status(), 404);
}

#[tokio::test(flavor = "multi_thread")]
#[timeout(10000)]
async fn test_stale_version_returns_precondition_failed() {
    let base = start(ServiceConfig::default()).await;
    let client = reqwest::Client::new();
    let table = format!("{}/tables/items", base);

    let created = client
        .post(format!("{}?__systemproperties=__version", table))
        .json(&json!({"id": "b", "name": "x"}))
        .send()
        .await
        .unwrap();
    let created = json_body(created).await;

    let conflict = client
        .patch(format!("{}/b", table))
        .header("If-Match", "\"random\"")
        .json(&json!({"name": "y"}))
        .send()
        .await
        .unwrap();
    assert_eq!(conflict.status(), 412);
    let conflict = json_body(conflict).await;
    assert_eq!(conflict["success"], false);
    assert_eq!(conflict["current"]["__version"], created["data"]["__version"]);
    assert_eq!(conflict["current"]["name"], "x");
}

#[tokio::test(flavor = "multi_thread")]
#[timeout(10000)]
async fn test_validation_errors() {
    let base = start(ServiceConfig::default()).await;
    let client = reqwest::Client::new();
    let table = format!("{}/tables/items", base);

    let system_field = client
        .post(&table)
        .json(&json!({"id": "c", "__version": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(system_field.status(), 400);

    client
        .post(&table)
        .json(&json!({"id": "c"}))
        .send()
        .await
        .unwrap();
    let duplicate = client
        .post(&table)
        .json(&json!({"id": "c"}))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status(), 409);

    let bad_filter = client
        .get(&table)
        .query(&[("$filter", "id eq")])
        .send()
        .await
        .unwrap();
    assert_eq!(bad_filter.status(), 400);

    let method = client.put(format!("{}/c", table)).send().await.unwrap();
    assert_eq!(method.status(), 405);
}

#[tokio::test(flavor = "multi_thread")]
#[timeout(10000)]
async fn test_application_key_is_enforced() {
    let base = start(ServiceConfig {
        application_key: Some("secret".to_string()),
        ..Default::default()
    })
    .await;
    let client = reqwest::Client::new();
    let url = format!("{}/tables/items", base);

    let denied = client.get(&url).send().await.unwrap();
    assert_eq!(denied.status(), 401);

    let allowed = client
        .get(&url)
        .header("X-ZUMO-APPLICATION", "secret")
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status(), 200);
    assert_eq!(json_body(allowed).await["data"]["count"], 0);
}
