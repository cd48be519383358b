// Testing utilities and stand-in implementations for the domain layer
// This module is only available when the "mock" feature is enabled

// Re-export useful test doubles from the data layer
pub use stat_responder_data::repository::tests::FailingRepository;

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::entities::{GenerationRequest, Hospital, UserLocation};
use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth};
use crate::services::guidance::{GenerativeModel, GuidanceError};
use crate::services::hospitals::PlacesClient;

/// Generative model that answers from a script of canned replies.
///
/// Replies are consumed in order; once the script is exhausted the fallback
/// reply is returned for every further request.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, String>>>,
    fallback: Result<String, String>,
    prompts: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedModel {
    /// A model that always answers with `reply`
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Ok(reply.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A model whose every call fails upstream with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Err(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply ahead of the fallback
    pub fn then_reply(self, reply: impl Into<String>) -> Self {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).push_back(Ok(reply.into()));
        self
    }

    /// Every request the model has received
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GuidanceError> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).push(request);

        let next = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        next.map_err(GuidanceError::Upstream)
    }
}

/// Places client returning a fixed list, or a fixed error
pub struct StaticPlacesClient {
    result: Result<Vec<Hospital>, String>,
}

impl StaticPlacesClient {
    pub fn with_hospitals(hospitals: Vec<Hospital>) -> Self {
        Self { result: Ok(hospitals) }
    }

    /// A client failing the way the Places API does for a non-OK status
    pub fn with_status(status: &str) -> Self {
        Self {
            result: Err(format!("Places API request failed with status: {}.", status)),
        }
    }
}

#[async_trait]
impl PlacesClient for StaticPlacesClient {
    async fn nearby_hospitals(&self, _location: UserLocation) -> Result<Vec<Hospital>, GuidanceError> {
        self.result.clone().map_err(GuidanceError::Upstream)
    }
}

/// Stand-in health service with a configurable report
#[derive(Debug)]
pub struct MockHealthService {
    /// Database component status
    database_status: ComponentStatus,
    /// Additional components
    components: HashMap<String, HealthComponent>,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// Create a new mock health service with all components healthy
    pub fn new() -> Self {
        Self {
            database_status: ComponentStatus::Healthy,
            components: HashMap::new(),
        }
    }

    /// Configure the mock with an unhealthy database
    pub fn with_unhealthy_database(mut self) -> Self {
        self.database_status = ComponentStatus::Unhealthy;
        self
    }

    /// Add a custom component with a specific status
    pub fn with_component(mut self, name: &str, status: ComponentStatus, details: Option<String>) -> Self {
        self.components.insert(name.to_string(), HealthComponent { status, details });
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let mut components = self.components.clone();
        components.insert(
            "database".to_string(),
            HealthComponent {
                status: self.database_status.clone(),
                details: match self.database_status {
                    ComponentStatus::Unhealthy => Some("Database connection failed".to_string()),
                    _ => None,
                },
            },
        );

        SystemHealth::from_components(components)
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.database_status {
            ComponentStatus::Healthy => Ok(true),
            ComponentStatus::Degraded => Ok(false),
            ComponentStatus::Unhealthy => Err("Database connection failed".to_string()),
        }
    }
}

