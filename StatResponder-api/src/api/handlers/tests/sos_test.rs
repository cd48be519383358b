use axum::http::{Method, StatusCode};
use serde_json::json;

use super::send;
use crate::api::routes::tests::{create_test_app, create_unloaded_test_app};

#[tokio::test]
async fn test_sos_with_contact_and_location() {
    let app = create_test_app().await;
    let contact = json!({ "name": "Jane Doe", "relationship": "Spouse", "phoneNumber": "+1234567890" });
    send(&app.router, Method::POST, "/api/v1/contacts", Some(contact)).await;

    let location = json!({ "latitude": 40.712776, "longitude": -74.005974 });
    let (status, body) = send(&app.router, Method::POST, "/api/v1/sos", Some(location)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["telUri"], "tel:911");
    assert_eq!(body["emergencyNumber"], "911");
    assert_eq!(body["primaryContact"], "Jane Doe");
    assert_eq!(body["medicalInfoAvailable"], false);

    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Emergency SOS initiated!\n"));
    assert!(message.contains("Current Location: Lat 40.7128, Lon -74.0060"));
    assert!(message.contains("Primary emergency contact (Jane Doe) will be notified."));
}

#[tokio::test]
async fn test_sos_without_location() {
    let app = create_test_app().await;

    let request = json!({ "locationError": "User denied Geolocation" });
    let (status, body) = send(&app.router, Method::POST, "/api/v1/sos", Some(request)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["primaryContact"].is_null());
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Location: Could not be determined (User denied Geolocation)"));
}

#[tokio::test]
async fn test_sos_rejects_half_a_location() {
    let app = create_test_app().await;

    let (status, body) = send(&app.router, Method::POST, "/api/v1/sos", Some(json!({ "latitude": 40.0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_preparedness_text() {
    let app = create_test_app().await;
    let info = json!({ "allergies": "Penicillin", "medications": "", "conditions": "" });
    send(&app.router, Method::PUT, "/api/v1/medical-info", Some(info)).await;

    let (status, body) = send(&app.router, Method::POST, "/api/v1/sos/preparedness", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let text = body["text"].as_str().unwrap();
    assert!(text.starts_with("EMERGENCY INFO:\nLocation: Attempting to fetch...\n"));
    assert!(text.contains("Allergies: Penicillin\nMedications: None specified\n"));
    assert!(text.contains("No emergency contacts provided."));
}

#[tokio::test]
async fn test_emergency_directory() {
    let app = create_test_app().await;

    let (status, body) = send(&app.router, Method::GET, "/api/v1/emergency-directory", None).await;
    assert_eq!(status, StatusCode::OK);

    let hospitals = body["hospitals"].as_array().unwrap();
    let ambulances = body["ambulanceServices"].as_array().unwrap();
    assert_eq!(hospitals.len(), 4);
    assert_eq!(ambulances.len(), 3);

    assert_eq!(hospitals[2]["name"], "St. Luke's Emergency");
    assert_eq!(hospitals[2]["number"], "555-0103");
    assert_eq!(hospitals[2]["telUri"], "tel:555-0103");
    assert_eq!(ambulances[0]["name"], "Citywide Ambulance");
    assert_eq!(ambulances[0]["telUri"], "tel:555-0201");
}

#[tokio::test]
async fn test_emergency_directory_is_served_while_loading() {
    let app = create_unloaded_test_app();

    let (status, body) = send(&app.router, Method::GET, "/api/v1/emergency-directory", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hospitals"][0]["telUri"], "tel:555-0101");
}
