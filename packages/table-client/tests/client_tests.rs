//! Client tests against an in-process service.

use std::net::SocketAddr;
use std::sync::Arc;

use ntest::timeout;
use serde::{Deserialize, Serialize};
use serde_json::json;

use table_api::{Router, Server};
use table_client::{
    field, ClientError, MobileServiceClient, SystemProperties, SystemProperty, TableRow,
};
use table_core::{Database, ServiceConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Note {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    text: String,
    #[serde(rename = "__version", default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(rename = "__createdAt", default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
}

impl TableRow for Note {
    fn system_properties() -> SystemProperties {
        SystemProperties::from([SystemProperty::Version, SystemProperty::CreatedAt])
    }
}

async fn start_client() -> MobileServiceClient {
    let config = ServiceConfig {
        application_key: Some("key".to_string()),
        ..Default::default()
    };
    let (api_tx, _runtime) =
        table_runtime::spawn(Arc::new(Database::new()), config.clone()).unwrap();
    let router = Router::new(Arc::new(config), api_tx).unwrap();
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let server = Server::new(addr, router).bind().await.unwrap();
    let base = format!("http://{}", server.local_addr().unwrap());
    tokio::spawn(server.serve());

    MobileServiceClient::builder()
        .base_url(base)
        .application_key("key")
        .build()
        .unwrap()
}

fn note(text: &str) -> Note {
    Note {
        id: Some(uuid::Uuid::new_v4().to_string()),
        text: text.to_string(),
        version: None,
        created_at: None,
    }
}

#[tokio::test(flavor = "multi_thread")]
#[timeout(10000)]
async fn test_typed_table_uses_declared_properties() {
    let client = start_client().await;
    let notes = client.table::<Note>("notes");
    assert_eq!(notes.system_properties(), Note::system_properties());

    let inserted = notes.insert(&note("hello"), &[]).await.unwrap();
    assert!(inserted.version.is_some());
    assert!(inserted.created_at.is_some());

    let found = notes
        .query(&field("id").eq(inserted.id.clone().unwrap()), &[])
        .await
        .unwrap();
    assert_eq!(found, vec![inserted.clone()]);

    let mut changed = inserted.clone();
    changed.text = "changed".to_string();
    let updated = notes.update(&changed, &[]).await.unwrap();
    assert_ne!(updated.version, inserted.version);
    assert_eq!(updated.created_at, inserted.created_at);

    notes.delete(&updated).await.unwrap();
    let missing = notes.lookup(inserted.id.as_deref().unwrap(), &[]).await;
    assert!(matches!(missing, Err(ClientError::Service { status: 404, .. })));
}

#[tokio::test(flavor = "multi_thread")]
#[timeout(10000)]
async fn test_parameter_overrides_table_properties() {
    let client = start_client().await;
    let mut table = client.json_table("raw");
    table.set_system_properties(SystemProperties::all());

    let params = vec![("__systemproperties".to_string(), "__updatedAt".to_string())];
    let inserted = table.insert(json!({"text": "x"}), &params).await.unwrap();
    assert!(inserted.get("__updatedAt").is_some());
    assert!(inserted.get("__version").is_none());
    assert!(inserted["id"].is_string());

    table.set_system_properties(SystemProperties::none());
    let looked_up = table
        .lookup(inserted["id"].as_str().unwrap(), &[])
        .await
        .unwrap();
    assert!(looked_up.get("__updatedAt").is_none());
}

#[tokio::test(flavor = "multi_thread")]
#[timeout(10000)]
async fn test_stale_version_surfaces_precondition_failed() {
    let client = start_client().await;
    let notes = client.table::<Note>("notes");
    let inserted = notes.insert(&note("v1"), &[]).await.unwrap();

    let mut stale = inserted.clone();
    stale.version = Some("random".to_string());
    let err = notes.update(&stale, &[]).await.unwrap_err();
    let conflict = err.as_precondition_failed().unwrap();
    assert_eq!(conflict.version(), inserted.version.as_deref());
    let server_row: Note = conflict.item().unwrap();
    assert_eq!(server_row, inserted);
    assert_eq!(err.status(), Some(412));
}

#[tokio::test(flavor = "multi_thread")]
#[timeout(10000)]
async fn test_callback_fires_once_with_result() {
    let client = start_client().await;
    let table = client.json_table("callbacks");

    let (tx, rx) = tokio::sync::oneshot::channel();
    table.insert_with_callback(json!({"id": "cb"}), &[], move |result| {
        let _ = tx.send(result);
    });
    let inserted = rx.await.unwrap().unwrap();
    assert_eq!(inserted["id"], "cb");

    let (tx, rx) = tokio::sync::oneshot::channel();
    table.insert_with_callback(json!({"id": "cb"}), &[], move |result| {
        let _ = tx.send(result);
    });
    let duplicate = rx.await.unwrap();
    assert!(matches!(
        duplicate,
        Err(ClientError::Service { status: 409, .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
#[timeout(10000)]
async fn test_missing_application_key_is_rejected() {
    let client = start_client().await;
    let anonymous = MobileServiceClient::builder()
        .base_url(client.base_url())
        .build()
        .unwrap();
    let err = anonymous.json_table("raw").read(&[]).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}
