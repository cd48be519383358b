use std::sync::Arc;

use axum::extract::{Json, State};
use axum::response::IntoResponse;
use tracing::instrument;
use validator::Validate;

use stat_responder_domain::services::HospitalService;

use crate::api::error::ErrorResponse;
use crate::entities::guidance::{convert_to_hospital_response, NearbyHospitalsRequest, NearbyHospitalsResponse};

/// Hospitals near the given coordinates
#[utoipa::path(
    post,
    path = "/api/v1/hospitals/nearby",
    request_body = NearbyHospitalsRequest,
    responses(
        (status = 200, description = "Nearby hospitals", body = NearbyHospitalsResponse),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse),
        (status = 502, description = "Places service failed", body = ErrorResponse),
        (status = 503, description = "Places service not configured", body = ErrorResponse),
    ),
    tag = "hospitals"
)]
#[instrument(skip(service))]
pub async fn nearby_hospitals(
    State(service): State<Arc<HospitalService>>,
    Json(request): Json<NearbyHospitalsRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    request.validate().map_err(|e| ErrorResponse::from_validation(&e))?;

    let hospitals = service.find_nearby(request.latitude, request.longitude).await?;
    Ok(Json(NearbyHospitalsResponse {
        hospitals: hospitals.into_iter().map(convert_to_hospital_response).collect(),
    }))
}
