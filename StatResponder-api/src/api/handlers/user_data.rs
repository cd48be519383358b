use axum::{
    extract::{Json, State},
    response::IntoResponse,
};
use tracing::{info, instrument, warn};

use stat_responder_domain::services::StoreError;

use crate::api::error::ErrorResponse;
use crate::api::state::UserDataService;
use crate::entities::user_data::{
    build_user_data_response, convert_to_domain_medical_info, convert_to_public_medical_info,
    MedicalInfo, UserDataResponse,
};

/// Turn a failed mutation into a response, undoing the in-memory change
/// first so the response matches what clients will read back.
pub(super) async fn reject_change(service: &UserDataService, err: StoreError) -> ErrorResponse {
    if let Some(token) = err.rollback() {
        if service.rollback(token).await {
            warn!("Rolled back change {} after a failed write", token.id());
        }
    }
    ErrorResponse::from(err)
}

/// Get everything stored for the user
#[utoipa::path(
    get,
    path = "/api/v1/user-data",
    responses(
        (status = 200, description = "Current user data", body = UserDataResponse),
    ),
    tag = "user_data"
)]
#[instrument(skip(service))]
pub async fn get_user_data(State(service): State<UserDataService>) -> impl IntoResponse {
    let snapshot = service.snapshot().await;
    let sync_state = service.sync_state().await;

    Json(build_user_data_response(snapshot, service.is_loading(), sync_state))
}

/// Get the user's medical info, or `null` if none has been saved
#[utoipa::path(
    get,
    path = "/api/v1/medical-info",
    responses(
        (status = 200, description = "Medical info, or null", body = Option<MedicalInfo>),
    ),
    tag = "user_data"
)]
#[instrument(skip(service))]
pub async fn get_medical_info(State(service): State<UserDataService>) -> impl IntoResponse {
    let medical_info = service.snapshot().await.medical_info;
    Json(medical_info.map(convert_to_public_medical_info))
}

/// Replace the user's medical info
#[utoipa::path(
    put,
    path = "/api/v1/medical-info",
    request_body = MedicalInfo,
    responses(
        (status = 200, description = "Medical info saved", body = MedicalInfo),
        (status = 500, description = "Change could not be saved", body = ErrorResponse),
        (status = 503, description = "User data still loading", body = ErrorResponse),
    ),
    tag = "user_data"
)]
#[instrument(skip(service, request))]
pub async fn update_medical_info(
    State(service): State<UserDataService>,
    Json(request): Json<MedicalInfo>,
) -> Result<impl IntoResponse, ErrorResponse> {
    info!("Updating medical info");

    match service.update_medical_info(convert_to_domain_medical_info(request)).await {
        Ok(saved) => Ok(Json(convert_to_public_medical_info(saved))),
        Err(e) => Err(reject_change(&service, e).await),
    }
}
