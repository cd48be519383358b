use axum::http::{Method, StatusCode};
use serde_json::json;

use stat_responder_domain::testing::{ScriptedModel, StaticPlacesClient};

use super::send;
use crate::api::routes::tests::{create_test_app, create_test_app_with, general_hospital};

#[tokio::test]
async fn test_voice_guidance() {
    let app = create_test_app().await;
    let request = json!({ "voiceRecordingDataUri": "data:audio/webm;codecs=opus;base64,GkXfo59ChoEB" });

    let (status, body) = send(&app.router, Method::POST, "/api/v1/guidance/voice", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keywords"], json!(["bleeding", "arm"]));
    assert_eq!(body["guidance"], "Apply firm pressure to the wound.");
}

#[tokio::test]
async fn test_voice_guidance_rejects_non_audio() {
    let app = create_test_app().await;
    let request = json!({ "voiceRecordingDataUri": "data:image/png;base64,iVBORw0KGgo=" });

    let (status, body) = send(&app.router, Method::POST, "/api/v1/guidance/voice", Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_chest_pain_leads_with_emergency_call() {
    let app = create_test_app_with(
        ScriptedModel::replying("Sit down and rest. Chew an aspirin if advised."),
        StaticPlacesClient::with_hospitals(Vec::new()),
    )
    .await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/guidance/symptom",
        Some(json!({ "symptom": "Chest Pain" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["guidance"]
        .as_str()
        .unwrap()
        .starts_with("Call emergency services (911) immediately."));
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway() {
    let app = create_test_app_with(
        ScriptedModel::failing("503 UNAVAILABLE: model overloaded"),
        StaticPlacesClient::with_hospitals(Vec::new()),
    )
    .await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/guidance/symptom",
        Some(json!({ "symptom": "Headache" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_error");
}

#[tokio::test]
async fn test_empty_symptom_is_rejected() {
    let app = create_test_app().await;

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/v1/guidance/symptom",
        Some(json!({ "symptom": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_common_symptoms() {
    let app = create_test_app().await;

    let (status, body) = send(&app.router, Method::GET, "/api/v1/guidance/symptoms", None).await;
    assert_eq!(status, StatusCode::OK);
    let symptoms = body["symptoms"].as_array().unwrap();
    assert!(symptoms.contains(&json!("Chest Pain")));
}

#[tokio::test]
async fn test_symptom_checker() {
    let app = create_test_app().await;

    let uri = "/api/v1/guidance/checker?q=Severe%20Bleeding%20from%20arm";
    let (status, body) = send(&app.router, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Guidance for Severe Bleeding");
    assert!(!body["advice"].as_array().unwrap().is_empty());

    let (status, _) = send(&app.router, Method::GET, "/api/v1/guidance/checker?q=hiccups", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app.router, Method::GET, "/api/v1/guidance/checker", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_nearby_hospitals() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/hospitals/nearby",
        Some(json!({ "latitude": 40.0, "longitude": -75.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hospitals"][0]["name"], general_hospital().name);
    assert_eq!(body["hospitals"][0]["placeId"], "abc");
}

#[tokio::test]
async fn test_nearby_hospitals_upstream_status_is_an_error() {
    let app = create_test_app_with(
        ScriptedModel::replying("unused"),
        StaticPlacesClient::with_status("REQUEST_DENIED"),
    )
    .await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/hospitals/nearby",
        Some(json!({ "latitude": 40.0, "longitude": -75.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["message"].as_str().unwrap().contains("REQUEST_DENIED"));
}

#[tokio::test]
async fn test_nearby_hospitals_rejects_bad_coordinates() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/hospitals/nearby",
        Some(json!({ "latitude": 123.0, "longitude": 0.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["latitude"].is_array());
}
