use std::sync::{Arc, Once};

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio_test::assert_ok;
use tower::ServiceExt;

use stat_responder_api::bootstrap::{build_backend, build_state};
use stat_responder_api::create_app;
use stat_responder_data::database::{DatabaseConfig, DatabasePool};
use stat_responder_data::repository::{
    with_offline_cache, PersistenceMode, SqliteDocumentStore, UserDataRepositoryTrait,
};
use stat_responder_domain::config::AppConfig;
use stat_responder_domain::entities::{MedicalInfo, NewEmergencyContact, UserId};
use stat_responder_domain::services::{create_user_data_store, UserDataServiceTrait};

static INIT: Once = Once::new();

fn initialize() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

fn file_config(dir: &std::path::Path) -> AppConfig {
    let dir = dir.to_string_lossy().to_string();
    AppConfig::from_lookup(move |name| match name {
        "STAT_STORAGE" => Some("file".to_string()),
        "DATA_DIR" => Some(dir.clone()),
        "STAT_USER_ID" => Some("integration-user".to_string()),
        _ => None,
    })
    .expect("config should parse")
}

async fn start_file_app(config: &AppConfig) -> (Router, Arc<dyn UserDataServiceTrait>) {
    let backend = build_backend(config).expect("file backend should open");
    let state = build_state(config, backend).expect("state should build");
    let store = state.user_data.clone();
    store.load().await.expect("load should succeed");
    (create_app(state), store)
}

async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn jane() -> NewEmergencyContact {
    NewEmergencyContact {
        name: "Jane Doe".to_string(),
        relationship: "Spouse".to_string(),
        phone_number: "+1234567890".to_string(),
    }
}

#[tokio::test]
async fn test_file_backend_survives_restart() {
    initialize();
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(dir.path());

    {
        let (router, _) = start_file_app(&config).await;

        let contact = json!({ "name": "Jane Doe", "relationship": "Spouse", "phoneNumber": "+1234567890" });
        let (status, _) = call(&router, Method::POST, "/api/v1/contacts", Some(contact)).await;
        assert_eq!(status, StatusCode::CREATED);

        let info = json!({ "allergies": "Penicillin", "medications": "Inhaler", "conditions": "Asthma" });
        let (status, _) = call(&router, Method::PUT, "/api/v1/medical-info", Some(info)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (router, store) = start_file_app(&config).await;
    assert_eq!(store.user_id().as_str(), "integration-user");

    let (status, body) = call(&router, Method::GET, "/api/v1/user-data", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isLoading"], false);
    assert_eq!(body["emergencyContacts"][0]["name"], "Jane Doe");
    assert_eq!(body["medicalInfo"]["allergies"], "Penicillin");
}

#[tokio::test]
async fn test_sos_uses_persisted_data() {
    initialize();
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(dir.path());
    let (router, store) = start_file_app(&config).await;

    store.add_contact(jane()).await.unwrap();
    store
        .update_medical_info(MedicalInfo {
            allergies: "Peanuts".to_string(),
            medications: String::new(),
            conditions: String::new(),
        })
        .await
        .unwrap();

    let location = json!({ "latitude": 51.5007, "longitude": -0.1246 });
    let (status, body) = call(&router, Method::POST, "/api/v1/sos", Some(location)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["primaryContact"], "Jane Doe");
    assert_eq!(body["medicalInfoAvailable"], true);

    let (status, body) = call(&router, Method::POST, "/api/v1/sos/preparedness", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let text = body["text"].as_str().unwrap();
    assert!(text.contains("Peanuts"));
    assert!(text.contains("+1234567890"));
}

#[tokio::test]
async fn test_sqlite_document_store_survives_restart() {
    initialize();
    let dir = tempfile::tempdir().unwrap();
    let db_config = DatabaseConfig {
        sqlite_path: Some(dir.path().join("stat.db").to_string_lossy().to_string()),
        ..DatabaseConfig::default()
    };
    let user = UserId::new("sqlite-user");

    {
        let pool = DatabasePool::open(&db_config).unwrap();
        let repository: Arc<dyn UserDataRepositoryTrait> = Arc::new(SqliteDocumentStore::new(pool));
        let store = create_user_data_store(repository, user.clone(), PersistenceMode::OnlineOnly);
        assert_ok!(store.load().await);
        assert_ok!(store.add_contact(jane()).await);
    }

    let pool = DatabasePool::open(&db_config).unwrap();
    let repository: Arc<dyn UserDataRepositoryTrait> = Arc::new(SqliteDocumentStore::new(pool));
    let store = create_user_data_store(repository, user, PersistenceMode::OnlineOnly);
    let snapshot = assert_ok!(store.load().await);

    assert_eq!(snapshot.emergency_contacts.len(), 1);
    assert_eq!(snapshot.emergency_contacts[0].phone_number, "+1234567890");
    assert!(snapshot.medical_info.is_none());
}

#[tokio::test]
async fn test_offline_cache_is_exclusive() {
    initialize();
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("offline_cache.json");

    let first = SqliteDocumentStore::new(DatabasePool::in_memory().unwrap());
    let (_primary, mode) = with_offline_cache(first, cache_path.clone());
    assert_eq!(mode, PersistenceMode::OfflineCapable);

    // A second instance finds the lock held and runs without the cache
    let second = SqliteDocumentStore::new(DatabasePool::in_memory().unwrap());
    let (repository, mode) = with_offline_cache(second, cache_path);
    assert_eq!(mode, PersistenceMode::OnlineOnly);
    assert_eq!(repository.backend_name(), "sqlite");
}
