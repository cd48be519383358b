use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::api::handlers::{contacts, guidance, health, hospitals, sos, user_data};
use crate::api::state::AppState;
use crate::openapi::configure_swagger_routes;

/// Recordings arrive base64-encoded inside JSON; two minutes of audio can
/// exceed axum's 2 MB default.
const VOICE_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    debug!("Creating application router");

    let api_routes = Router::new()
        .route("/user-data", get(user_data::get_user_data))
        .route("/contacts", get(contacts::list_contacts).post(contacts::create_contact))
        .route(
            "/contacts/:id",
            put(contacts::update_contact).delete(contacts::delete_contact),
        )
        .route(
            "/medical-info",
            get(user_data::get_medical_info).put(user_data::update_medical_info),
        )
        .route(
            "/guidance/voice",
            post(guidance::voice_guidance).layer(DefaultBodyLimit::max(VOICE_BODY_LIMIT)),
        )
        .route("/guidance/symptom", post(guidance::symptom_guidance))
        .route("/guidance/symptoms", get(guidance::list_common_symptoms))
        .route("/guidance/checker", get(guidance::check_symptoms))
        .route("/hospitals/nearby", post(hospitals::nearby_hospitals))
        .route("/sos", post(sos::trigger_sos))
        .route("/sos/preparedness", post(sos::preparedness_text))
        .route("/emergency-directory", get(sos::list_emergency_directory));

    debug!("API routes configured");

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_routes)
        .with_state(state);

    // Configure the Swagger UI using the helper function
    let app = add_swagger_ui(app);
    debug!("Swagger UI merged");

    // Initialize health check service startup time
    health::initialize_server_start_time();

    app.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
    .layer(TraceLayer::new_for_http())
}

/// Add Swagger UI to the router
pub fn add_swagger_ui(app: Router) -> Router {
    app.merge(configure_swagger_routes())
}
