use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // User data endpoints
        crate::api::handlers::user_data::get_user_data,
        crate::api::handlers::user_data::get_medical_info,
        crate::api::handlers::user_data::update_medical_info,

        // Contact endpoints
        crate::api::handlers::contacts::list_contacts,
        crate::api::handlers::contacts::create_contact,
        crate::api::handlers::contacts::update_contact,
        crate::api::handlers::contacts::delete_contact,

        // Guidance endpoints
        crate::api::handlers::guidance::voice_guidance,
        crate::api::handlers::guidance::symptom_guidance,
        crate::api::handlers::guidance::list_common_symptoms,
        crate::api::handlers::guidance::check_symptoms,
        crate::api::handlers::hospitals::nearby_hospitals,

        // SOS endpoints
        crate::api::handlers::sos::trigger_sos,
        crate::api::handlers::sos::preparedness_text,
        crate::api::handlers::sos::list_emergency_directory
    ),
    components(
        schemas(
            crate::api::error::ErrorResponse,

            // Health handlers
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentHealthStatus,

            // User data entities
            crate::entities::user_data::EmergencyContact,
            crate::entities::user_data::ContactRequest,
            crate::entities::user_data::MedicalInfo,
            crate::entities::user_data::UserDataResponse,

            // Guidance entities
            crate::entities::guidance::VoiceGuidanceRequest,
            crate::entities::guidance::VoiceGuidanceResponse,
            crate::entities::guidance::SymptomGuidanceRequest,
            crate::entities::guidance::SymptomGuidanceResponse,
            crate::entities::guidance::SymptomListResponse,
            crate::entities::guidance::SymptomAdviceResponse,
            crate::entities::guidance::NearbyHospitalsRequest,
            crate::entities::guidance::NearbyHospitalsResponse,
            crate::entities::guidance::HospitalResponse,

            // SOS entities
            crate::entities::sos::LocationRequest,
            crate::entities::sos::SosResponse,
            crate::entities::sos::PreparednessResponse,
            crate::entities::sos::DirectoryEntryResponse,
            crate::entities::sos::EmergencyDirectoryResponse
        )
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "user_data", description = "Stored user data and medical info"),
        (name = "contacts", description = "Emergency contact management"),
        (name = "guidance", description = "AI first-aid guidance and the offline symptom checker"),
        (name = "hospitals", description = "Nearby hospital lookup"),
        (name = "sos", description = "SOS alert, preparedness summaries and the emergency directory")
    ),
    info(
        title = "StatResponder API",
        version = "0.1.0",
        description = "Emergency assistant: contacts, medical info, first-aid guidance and SOS",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_doc_generation() {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "StatResponder API");
        assert_eq!(openapi.info.version, "0.1.0");

        let tags = openapi.tags.as_ref().unwrap();
        assert!(tags.iter().any(|tag| tag.name == "contacts"));
        assert!(tags.iter().any(|tag| tag.name == "sos"));

        for path in [
            "/health",
            "/api/v1/user-data",
            "/api/v1/contacts",
            "/api/v1/contacts/{id}",
            "/api/v1/medical-info",
            "/api/v1/guidance/voice",
            "/api/v1/guidance/symptom",
            "/api/v1/guidance/symptoms",
            "/api/v1/guidance/checker",
            "/api/v1/hospitals/nearby",
            "/api/v1/sos",
            "/api/v1/sos/preparedness",
            "/api/v1/emergency-directory",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "missing path {}", path);
        }
    }
}
