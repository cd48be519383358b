use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, instrument};

use crate::api::error::ErrorResponse;
use crate::api::handlers::user_data::reject_change;
use crate::api::state::UserDataService;
use crate::entities::user_data::{
    convert_to_domain_contact, convert_to_new_contact, convert_to_public_contact, ContactRequest,
    EmergencyContact,
};

/// List the user's emergency contacts in order
#[utoipa::path(
    get,
    path = "/api/v1/contacts",
    responses(
        (status = 200, description = "Emergency contacts", body = Vec<EmergencyContact>),
    ),
    tag = "contacts"
)]
#[instrument(skip(service))]
pub async fn list_contacts(State(service): State<UserDataService>) -> impl IntoResponse {
    let contacts: Vec<EmergencyContact> = service
        .snapshot()
        .await
        .emergency_contacts
        .into_iter()
        .map(convert_to_public_contact)
        .collect();

    Json(contacts)
}

/// Add an emergency contact
#[utoipa::path(
    post,
    path = "/api/v1/contacts",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Contact created", body = EmergencyContact),
        (status = 400, description = "Invalid contact", body = ErrorResponse),
        (status = 500, description = "Change could not be saved", body = ErrorResponse),
        (status = 503, description = "User data still loading", body = ErrorResponse),
    ),
    tag = "contacts"
)]
#[instrument(skip(service, request))]
pub async fn create_contact(
    State(service): State<UserDataService>,
    Json(request): Json<ContactRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    info!("Creating new emergency contact");

    match service.add_contact(convert_to_new_contact(request)).await {
        Ok(contact) => {
            info!("Emergency contact created with ID: {}", contact.id);
            Ok((StatusCode::CREATED, Json(convert_to_public_contact(contact))))
        }
        Err(e) => Err(reject_change(&service, e).await),
    }
}

/// Replace an emergency contact
#[utoipa::path(
    put,
    path = "/api/v1/contacts/{id}",
    params(
        ("id" = String, Path, description = "Contact ID")
    ),
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Contact updated", body = EmergencyContact),
        (status = 400, description = "Invalid contact", body = ErrorResponse),
        (status = 404, description = "Contact not found", body = ErrorResponse),
        (status = 500, description = "Change could not be saved", body = ErrorResponse),
    ),
    tag = "contacts"
)]
#[instrument(skip(service, request))]
pub async fn update_contact(
    State(service): State<UserDataService>,
    Path(id): Path<String>,
    Json(request): Json<ContactRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let contact = convert_to_domain_contact(id, request);

    match service.update_contact(contact.clone()).await {
        Ok(true) => Ok(Json(convert_to_public_contact(contact))),
        Ok(false) => Err(ErrorResponse::not_found("emergency contact")),
        Err(e) => Err(reject_change(&service, e).await),
    }
}

/// Delete an emergency contact
#[utoipa::path(
    delete,
    path = "/api/v1/contacts/{id}",
    params(
        ("id" = String, Path, description = "Contact ID")
    ),
    responses(
        (status = 204, description = "Contact deleted"),
        (status = 404, description = "Contact not found", body = ErrorResponse),
        (status = 500, description = "Change could not be saved", body = ErrorResponse),
    ),
    tag = "contacts"
)]
#[instrument(skip(service))]
pub async fn delete_contact(
    State(service): State<UserDataService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ErrorResponse> {
    match service.delete_contact(&id).await {
        Ok(true) => {
            info!("Emergency contact {} deleted", id);
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(false) => Err(ErrorResponse::not_found("emergency contact")),
        Err(e) => Err(reject_change(&service, e).await),
    }
}
