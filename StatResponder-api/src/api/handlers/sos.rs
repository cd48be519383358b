use std::sync::Arc;

use axum::extract::{Json, State};
use axum::response::IntoResponse;
use tracing::{info, instrument, warn};
use validator::Validate;

use stat_responder_domain::entities::LocationStatus;
use stat_responder_domain::services::{
    emergency_directory, format_emergency_info, DirectoryCategory, SosReport,
};

use crate::api::error::ErrorResponse;
use crate::api::state::{ServerSettings, UserDataService};
use crate::entities::sos::{
    convert_to_directory_entry, convert_to_sos_response, DirectoryEntryResponse,
    EmergencyDirectoryResponse, LocationRequest, PreparednessResponse, SosResponse,
};

fn location_status(request: &LocationRequest) -> Result<LocationStatus, ErrorResponse> {
    request.validate().map_err(|e| ErrorResponse::from_validation(&e))?;
    request
        .to_status()
        .map_err(|message| ErrorResponse::validation_error(&message, None))
}

/// Trigger the SOS flow and report what would be shared
#[utoipa::path(
    post,
    path = "/api/v1/sos",
    request_body = LocationRequest,
    responses(
        (status = 200, description = "SOS report", body = SosResponse),
        (status = 400, description = "Invalid location", body = ErrorResponse),
    ),
    tag = "sos"
)]
#[instrument(skip(service, settings))]
pub async fn trigger_sos(
    State(service): State<UserDataService>,
    State(settings): State<Arc<ServerSettings>>,
    Json(request): Json<LocationRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let location = location_status(&request)?;

    if service.is_loading() {
        warn!("SOS triggered before user data finished loading");
    }
    let snapshot = service.snapshot().await;

    let report = SosReport::build(
        &snapshot.emergency_contacts,
        snapshot.medical_info.as_ref(),
        &location,
        &settings.emergency_number,
    );
    info!(
        "SOS triggered: primary contact {:?}, medical info shared: {}",
        report.primary_contact, report.medical_info_available
    );

    Ok(Json(convert_to_sos_response(report)))
}

/// Plain-text summary of location, medical info and contacts
#[utoipa::path(
    post,
    path = "/api/v1/sos/preparedness",
    request_body = LocationRequest,
    responses(
        (status = 200, description = "Preparedness text", body = PreparednessResponse),
        (status = 400, description = "Invalid location", body = ErrorResponse),
    ),
    tag = "sos"
)]
#[instrument(skip(service))]
pub async fn preparedness_text(
    State(service): State<UserDataService>,
    Json(request): Json<LocationRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let location = location_status(&request)?;
    let snapshot = service.snapshot().await;

    Ok(Json(PreparednessResponse {
        text: format_emergency_info(
            &snapshot.emergency_contacts,
            snapshot.medical_info.as_ref(),
            &location,
        ),
    }))
}

fn directory_section(category: DirectoryCategory) -> Vec<DirectoryEntryResponse> {
    emergency_directory(category).map(convert_to_directory_entry).collect()
}

/// Local hospitals and ambulance services with dialable links
#[utoipa::path(
    get,
    path = "/api/v1/emergency-directory",
    responses(
        (status = 200, description = "Emergency directory", body = EmergencyDirectoryResponse),
    ),
    tag = "sos"
)]
#[instrument]
pub async fn list_emergency_directory() -> Json<EmergencyDirectoryResponse> {
    Json(EmergencyDirectoryResponse {
        hospitals: directory_section(DirectoryCategory::Hospital),
        ambulance_services: directory_section(DirectoryCategory::Ambulance),
    })
}
