use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use stat_responder_domain::entities::{Hospital, SymptomAdvice, SymptomGuidance, VoiceGuidance};

/// Request payload for analyzing a distress recording
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoiceGuidanceRequest {
    /// Recording encoded as `data:<mimetype>;base64,<payload>`
    #[validate(length(min = 1, message = "A voice recording is required"))]
    #[schema(example = "data:audio/webm;base64,GkXfo59ChoEBQveBAULygQRC84EIQoKEd2VibQ==")]
    pub voice_recording_data_uri: String,
}

/// Keywords heard in the recording and the guidance derived from them
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VoiceGuidanceResponse {
    #[schema(example = json!(["bleeding", "arm"]))]
    pub keywords: Vec<String>,
    pub guidance: String,
}

/// Request payload for first-aid guidance on a symptom
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SymptomGuidanceRequest {
    #[validate(length(min = 1, max = 200, message = "Symptom must be between 1 and 200 characters"))]
    #[schema(example = "Chest Pain")]
    pub symptom: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SymptomGuidanceResponse {
    pub guidance: String,
}

/// Symptoms offered for quick selection
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SymptomListResponse {
    pub symptoms: Vec<String>,
}

/// Query parameters for the offline symptom checker
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct CheckerQueryParams {
    /// Free-text symptom description
    pub q: Option<String>,
}

/// Canned advice from the offline symptom checker
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SymptomAdviceResponse {
    #[schema(example = "Chest Pain")]
    pub title: String,
    pub advice: Vec<String>,
}

/// Request payload for a nearby hospital search
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct NearbyHospitalsRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    #[schema(example = 40.0)]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    #[schema(example = -75.0)]
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalResponse {
    pub name: String,
    /// Address or general vicinity
    pub vicinity: String,
    pub place_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NearbyHospitalsResponse {
    pub hospitals: Vec<HospitalResponse>,
}

pub fn convert_to_voice_response(guidance: VoiceGuidance) -> VoiceGuidanceResponse {
    VoiceGuidanceResponse {
        keywords: guidance.keywords,
        guidance: guidance.guidance,
    }
}

pub fn convert_to_symptom_response(guidance: SymptomGuidance) -> SymptomGuidanceResponse {
    SymptomGuidanceResponse { guidance: guidance.guidance }
}

pub fn convert_to_advice_response(advice: SymptomAdvice) -> SymptomAdviceResponse {
    SymptomAdviceResponse {
        title: advice.title,
        advice: advice.advice,
    }
}

pub fn convert_to_hospital_response(hospital: Hospital) -> HospitalResponse {
    HospitalResponse {
        name: hospital.name,
        vicinity: hospital.vicinity,
        place_id: hospital.place_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hospital_request_ranges() {
        assert!(NearbyHospitalsRequest { latitude: 40.0, longitude: -75.0 }.validate().is_ok());

        let errors = NearbyHospitalsRequest { latitude: 91.0, longitude: 181.0 }
            .validate()
            .unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("latitude"));
        assert!(fields.contains_key("longitude"));
    }

    #[test]
    fn test_voice_request_field_name() {
        let request: VoiceGuidanceRequest =
            serde_json::from_str(r#"{"voiceRecordingDataUri":"data:audio/wav;base64,AAAA"}"#).unwrap();
        assert!(request.validate().is_ok());
        assert!(request.voice_recording_data_uri.starts_with("data:audio/wav"));
    }

    #[test]
    fn test_empty_symptom_fails_validation() {
        let request = SymptomGuidanceRequest { symptom: String::new() };
        assert!(request.validate().is_err());
    }
}
