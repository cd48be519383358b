use axum::http::{Method, StatusCode};
use serde_json::json;

use super::send;
use crate::api::routes::tests::{create_test_app, create_unloaded_test_app};

fn jane() -> serde_json::Value {
    json!({ "name": "Jane Doe", "relationship": "Spouse", "phoneNumber": "+1234567890" })
}

#[tokio::test]
async fn test_create_contact() {
    let app = create_test_app().await;

    let (status, body) = send(&app.router, Method::POST, "/api/v1/contacts", Some(jane())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!body["id"].as_str().unwrap().is_empty());
    assert_eq!(body["name"], "Jane Doe");
    assert_eq!(body["relationship"], "Spouse");
    assert_eq!(body["phoneNumber"], "+1234567890");

    let (status, body) = send(&app.router, Method::GET, "/api/v1/contacts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(app.repository.write_count(), 1);
}

#[tokio::test]
async fn test_create_contact_rejects_bad_phone_number() {
    let app = create_test_app().await;
    let request = json!({ "name": "Jane Doe", "relationship": "Spouse", "phoneNumber": "call me" });

    let (status, body) = send(&app.router, Method::POST, "/api/v1/contacts", Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (_, contacts) = send(&app.router, Method::GET, "/api/v1/contacts", None).await;
    assert!(contacts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_contact() {
    let app = create_test_app().await;
    let (_, created) = send(&app.router, Method::POST, "/api/v1/contacts", Some(jane())).await;
    let id = created["id"].as_str().unwrap();

    let update = json!({ "name": "Jane Doe", "relationship": "Wife", "phoneNumber": "+1234567899" });
    let (status, body) = send(&app.router, Method::PUT, &format!("/api/v1/contacts/{}", id), Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    assert_eq!(body["relationship"], "Wife");

    let (_, contacts) = send(&app.router, Method::GET, "/api/v1/contacts", None).await;
    assert_eq!(contacts[0]["phoneNumber"], "+1234567899");
}

#[tokio::test]
async fn test_update_missing_contact_is_not_found() {
    let app = create_test_app().await;

    let (status, body) = send(&app.router, Method::PUT, "/api/v1/contacts/nope", Some(jane())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_delete_contact() {
    let app = create_test_app().await;
    let (_, created) = send(&app.router, Method::POST, "/api/v1/contacts", Some(jane())).await;
    let uri = format!("/api/v1/contacts/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app.router, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = send(&app.router, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_write_is_rolled_back() {
    let app = create_test_app().await;
    app.repository.set_fail_writes(true);

    let (status, body) = send(&app.router, Method::POST, "/api/v1/contacts", Some(jane())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "persistence_error");
    assert!(body["details"]["changeId"].is_u64());

    let (_, user_data) = send(&app.router, Method::GET, "/api/v1/user-data", None).await;
    assert!(user_data["emergencyContacts"].as_array().unwrap().is_empty());
    assert_eq!(user_data["syncState"], "durable");
    assert_eq!(user_data["pendingChanges"], 0);
}

#[tokio::test]
async fn test_mutation_before_load_is_unavailable() {
    let app = create_unloaded_test_app();

    let (status, body) = send(&app.router, Method::POST, "/api/v1/contacts", Some(jane())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "service_unavailable");

    let (_, user_data) = send(&app.router, Method::GET, "/api/v1/user-data", None).await;
    assert_eq!(user_data["isLoading"], true);
}

#[tokio::test]
async fn test_medical_info_round_trip() {
    let app = create_test_app().await;

    let (status, body) = send(&app.router, Method::GET, "/api/v1/medical-info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let info = json!({ "allergies": "Penicillin", "medications": "", "conditions": "Asthma" });
    let (status, body) = send(&app.router, Method::PUT, "/api/v1/medical-info", Some(info.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, info);

    let (_, user_data) = send(&app.router, Method::GET, "/api/v1/user-data", None).await;
    assert_eq!(user_data["medicalInfo"], info);
    assert_eq!(user_data["isLoading"], false);
}
