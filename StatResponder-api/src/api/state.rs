use std::sync::Arc;

use axum::extract::FromRef;

use stat_responder_domain::health::HealthServiceTrait;
use stat_responder_domain::services::{GuidanceService, HospitalService, UserDataServiceTrait};

/// Service type for dependency injection
pub type UserDataService = Arc<dyn UserDataServiceTrait>;

/// Health service type for dependency injection
pub type HealthService = Arc<dyn HealthServiceTrait>;

/// Settings the handlers report back to clients
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Number the SOS flow prompts the user to call
    pub emergency_number: String,
    /// Deployment environment reported by the health check
    pub environment: String,
}

/// Everything the router hands to its handlers
#[derive(Clone, FromRef)]
pub struct AppState {
    pub user_data: UserDataService,
    pub guidance: Arc<GuidanceService>,
    pub hospitals: Arc<HospitalService>,
    pub health: HealthService,
    pub settings: Arc<ServerSettings>,
}

impl AppState {
    pub fn new(
        user_data: UserDataService,
        guidance: GuidanceService,
        hospitals: HospitalService,
        health: HealthService,
        settings: ServerSettings,
    ) -> Self {
        Self {
            user_data,
            guidance: Arc::new(guidance),
            hospitals: Arc::new(hospitals),
            health,
            settings: Arc::new(settings),
        }
    }
}
