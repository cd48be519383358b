use std::sync::Arc;

use axum::extract::{Json, Query, State};
use axum::response::IntoResponse;
use tracing::{debug, info, instrument};
use validator::Validate;

use stat_responder_domain::services::GuidanceService;

use crate::api::error::ErrorResponse;
use crate::entities::guidance::{
    convert_to_advice_response, convert_to_symptom_response, convert_to_voice_response,
    CheckerQueryParams, SymptomAdviceResponse, SymptomGuidanceRequest, SymptomGuidanceResponse,
    SymptomListResponse, VoiceGuidanceRequest, VoiceGuidanceResponse,
};

/// Analyze a voice recording for distress keywords and guidance
#[utoipa::path(
    post,
    path = "/api/v1/guidance/voice",
    request_body = VoiceGuidanceRequest,
    responses(
        (status = 200, description = "Keywords and guidance", body = VoiceGuidanceResponse),
        (status = 400, description = "Invalid recording", body = ErrorResponse),
        (status = 502, description = "AI service failed", body = ErrorResponse),
        (status = 503, description = "AI service not configured", body = ErrorResponse),
    ),
    tag = "guidance"
)]
#[instrument(skip(service, request))]
pub async fn voice_guidance(
    State(service): State<Arc<GuidanceService>>,
    Json(request): Json<VoiceGuidanceRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    request.validate().map_err(|e| ErrorResponse::from_validation(&e))?;

    info!("Voice guidance requested");
    let guidance = service.voice_guidance(&request.voice_recording_data_uri).await?;
    Ok(Json(convert_to_voice_response(guidance)))
}

/// First-aid guidance for a symptom
#[utoipa::path(
    post,
    path = "/api/v1/guidance/symptom",
    request_body = SymptomGuidanceRequest,
    responses(
        (status = 200, description = "First-aid guidance", body = SymptomGuidanceResponse),
        (status = 400, description = "Invalid symptom", body = ErrorResponse),
        (status = 502, description = "AI service failed", body = ErrorResponse),
        (status = 503, description = "AI service not configured", body = ErrorResponse),
    ),
    tag = "guidance"
)]
#[instrument(skip(service))]
pub async fn symptom_guidance(
    State(service): State<Arc<GuidanceService>>,
    Json(request): Json<SymptomGuidanceRequest>,
) -> Result<impl IntoResponse, ErrorResponse> {
    request.validate().map_err(|e| ErrorResponse::from_validation(&e))?;

    let guidance = service.symptom_guidance(&request.symptom).await?;
    Ok(Json(convert_to_symptom_response(guidance)))
}

/// Symptoms offered for quick selection
#[utoipa::path(
    get,
    path = "/api/v1/guidance/symptoms",
    responses(
        (status = 200, description = "Common symptoms", body = SymptomListResponse),
    ),
    tag = "guidance"
)]
pub async fn list_common_symptoms(State(service): State<Arc<GuidanceService>>) -> impl IntoResponse {
    Json(SymptomListResponse {
        symptoms: service.common_symptoms().iter().map(|s| s.to_string()).collect(),
    })
}

/// Offline symptom checker. Works without any AI configuration.
#[utoipa::path(
    get,
    path = "/api/v1/guidance/checker",
    params(CheckerQueryParams),
    responses(
        (status = 200, description = "Matching advice", body = SymptomAdviceResponse),
        (status = 400, description = "Missing query", body = ErrorResponse),
        (status = 404, description = "No advice for this symptom", body = ErrorResponse),
    ),
    tag = "guidance"
)]
#[instrument(skip(service))]
pub async fn check_symptoms(
    State(service): State<Arc<GuidanceService>>,
    Query(params): Query<CheckerQueryParams>,
) -> Result<impl IntoResponse, ErrorResponse> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(ErrorResponse::bad_request("Query parameter q is required"));
    }

    match service.check_symptoms(&query) {
        Some(advice) => Ok(Json(convert_to_advice_response(advice))),
        None => {
            debug!("No built-in advice for {:?}", query);
            Err(ErrorResponse::not_found("symptom advice"))
        }
    }
}
