//! Domain layer health check functionality
//! This module reports on storage, the user data store and external integrations

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use stat_responder_data::database;
use stat_responder_data::repository::PersistenceMode;

use crate::services::user_data::{SyncState, UserDataServiceTrait};

/// System health status
#[derive(Debug, Clone, PartialEq)]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentStatus {
    /// Component is functioning normally
    Healthy,
    /// Component is functioning but with reduced capability
    Degraded,
    /// Component is not functioning
    Unhealthy,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    /// Status of the component
    pub status: ComponentStatus,
    /// Optional details about the component status
    pub details: Option<String>,
}

impl HealthComponent {
    fn healthy(details: impl Into<String>) -> Self {
        Self { status: ComponentStatus::Healthy, details: Some(details.into()) }
    }

    fn degraded(details: impl Into<String>) -> Self {
        Self { status: ComponentStatus::Degraded, details: Some(details.into()) }
    }

    fn unhealthy(details: impl Into<String>) -> Self {
        Self { status: ComponentStatus::Unhealthy, details: Some(details.into()) }
    }
}

/// Represents the overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    /// Overall system status
    pub status: SystemStatus,
    /// Map of component names to their health status
    pub components: HashMap<String, HealthComponent>,
}

impl SystemHealth {
    /// Derive the overall status from the worst component
    pub fn from_components(components: HashMap<String, HealthComponent>) -> Self {
        let status = if components.values().any(|c| c.status == ComponentStatus::Unhealthy) {
            SystemStatus::Unhealthy
        } else if components.values().any(|c| c.status == ComponentStatus::Degraded) {
            SystemStatus::Degraded
        } else {
            SystemStatus::Healthy
        };

        Self { status, components }
    }
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;

    /// Check the status of the database
    /// Returns true if the database is healthy, false if it lost durability
    /// Returns an error if the check could not be performed
    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Check if the database is available and durable
///
/// Returns:
/// - Ok(true) if the database is fully operational
/// - Ok(false) if the pool fell back to an in-memory database
/// - Err if the database is unavailable
pub async fn check_database_status() -> Result<bool, String> {
    let pool = database::get_db_pool().map_err(|e| format!("Database connection error: {}", e))?;
    let info = pool.connection_info();

    if info.contains("connection error") {
        return Err(info);
    }
    Ok(!pool.is_in_memory())
}

/// Health service over the running store and integrations
pub struct HealthService {
    store: Arc<dyn UserDataServiceTrait>,
    uses_database: bool,
    ai_configured: bool,
    places_configured: bool,
}

impl HealthService {
    pub fn new(
        store: Arc<dyn UserDataServiceTrait>,
        uses_database: bool,
        ai_configured: bool,
        places_configured: bool,
    ) -> Self {
        Self { store, uses_database, ai_configured, places_configured }
    }

    async fn user_data_component(&self) -> HealthComponent {
        let (backend, mode) = self.store.backend_info();

        if self.store.is_loading() {
            return HealthComponent::degraded(format!("{} backend: still loading", backend));
        }

        let mode = match mode {
            PersistenceMode::OfflineCapable => "offline-capable",
            PersistenceMode::OnlineOnly => "online-only",
        };
        match self.store.sync_state().await {
            SyncState::Durable => HealthComponent::healthy(format!("{} backend, {}", backend, mode)),
            SyncState::Pending(n) => HealthComponent::degraded(format!(
                "{} backend, {}: {} change(s) not persisted",
                backend, mode, n
            )),
        }
    }

    fn integration_component(configured: bool, name: &str) -> HealthComponent {
        if configured {
            HealthComponent::healthy(format!("{} configured", name))
        } else {
            HealthComponent::degraded(format!("{} not configured", name))
        }
    }
}

#[async_trait]
impl HealthServiceTrait for HealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let mut components = HashMap::new();

        if self.uses_database {
            let database = match self.check_database_status().await {
                Ok(true) => HealthComponent { status: ComponentStatus::Healthy, details: None },
                Ok(false) => HealthComponent::degraded(
                    "Database fell back to in-memory storage; data will not survive a restart",
                ),
                Err(e) => HealthComponent::unhealthy(e),
            };
            components.insert("database".to_string(), database);
        }

        components.insert("user_data".to_string(), self.user_data_component().await);
        components.insert(
            "ai_guidance".to_string(),
            Self::integration_component(self.ai_configured, "Generative model"),
        );
        components.insert(
            "places".to_string(),
            Self::integration_component(self.places_configured, "Places API"),
        );

        SystemHealth::from_components(components)
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        check_database_status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{NewEmergencyContact, UserId};
    use crate::services::user_data::UserDataStore;
    use stat_responder_data::repository::tests::FailingRepository;

    fn store(repo: FailingRepository) -> Arc<dyn UserDataServiceTrait> {
        Arc::new(UserDataStore::new(Arc::new(repo), UserId::default()))
    }

    #[tokio::test]
    async fn test_loading_store_is_degraded() {
        let health = HealthService::new(store(FailingRepository::new()), false, true, true)
            .get_system_health()
            .await;

        assert_eq!(health.status, SystemStatus::Degraded);
        assert!(!health.components.contains_key("database"));
        assert_eq!(health.components["user_data"].status, ComponentStatus::Degraded);
    }

    #[tokio::test]
    async fn test_loaded_store_is_healthy() {
        let store = store(FailingRepository::new());
        store.load().await.unwrap();

        let health = HealthService::new(store, false, true, true).get_system_health().await;
        assert_eq!(health.status, SystemStatus::Healthy);
        assert!(health.components["user_data"]
            .details
            .as_deref()
            .unwrap()
            .contains("failing-test backend"));
    }

    #[tokio::test]
    async fn test_pending_writes_degrade_health() {
        let repo = FailingRepository::new();
        let store = store(repo.clone());
        store.load().await.unwrap();

        repo.set_fail_writes(true);
        let _ = store
            .add_contact(NewEmergencyContact {
                name: "Jane Doe".to_string(),
                relationship: "Spouse".to_string(),
                phone_number: "+1234567890".to_string(),
            })
            .await;

        let health = HealthService::new(store, false, true, true).get_system_health().await;
        assert_eq!(health.status, SystemStatus::Degraded);
        assert!(health.components["user_data"].details.as_deref().unwrap().contains("1 change(s)"));
    }

    #[tokio::test]
    async fn test_missing_integrations_are_degraded() {
        let store = store(FailingRepository::new());
        store.load().await.unwrap();

        let health = HealthService::new(store, false, false, false).get_system_health().await;
        assert_eq!(health.status, SystemStatus::Degraded);
        assert_eq!(health.components["ai_guidance"].status, ComponentStatus::Degraded);
        assert_eq!(health.components["places"].status, ComponentStatus::Degraded);
    }
}
