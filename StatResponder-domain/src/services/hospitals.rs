//! Nearby hospital lookup through the Google Places nearby search

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::GuidanceConfig;
use crate::entities::{Hospital, UserLocation};
use crate::services::guidance::GuidanceError;

/// Default Places nearby search endpoint
pub const PLACES_NEARBY_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// Search radius in meters
pub const SEARCH_RADIUS_METERS: u32 = 30_000;

/// Source of nearby places
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlacesClient: Send + Sync {
    /// Hospitals within the search radius of `location`
    async fn nearby_hospitals(&self, location: UserLocation) -> Result<Vec<Hospital>, GuidanceError>;
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    name: String,
    #[serde(default)]
    vicinity: String,
    place_id: String,
}

/// Parse a nearby search reply. Any status other than `OK` is an error,
/// including `ZERO_RESULTS`.
pub fn parse_places_response(body: &str) -> Result<Vec<Hospital>, GuidanceError> {
    let response: PlacesResponse = serde_json::from_str(body)
        .map_err(|e| GuidanceError::MalformedResponse(format!("Places API reply: {}", e)))?;

    if response.status != "OK" {
        return Err(GuidanceError::Upstream(format!(
            "Places API request failed with status: {}. {}",
            response.status,
            response.error_message.unwrap_or_default()
        ).trim_end().to_string()));
    }

    Ok(response
        .results
        .into_iter()
        .map(|place| Hospital {
            name: place.name,
            vicinity: place.vicinity,
            place_id: place.place_id,
        })
        .collect())
}

/// [`PlacesClient`] calling the Google Places API
#[derive(Debug, Clone)]
pub struct GooglePlacesClient {
    client: Client,
    api_key: String,
    url: String,
}

impl GooglePlacesClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, GuidanceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            url: PLACES_NEARBY_URL.to_string(),
        })
    }

    /// Use a different nearby search endpoint
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl PlacesClient for GooglePlacesClient {
    async fn nearby_hospitals(&self, location: UserLocation) -> Result<Vec<Hospital>, GuidanceError> {
        let location_param = format!("{},{}", location.latitude, location.longitude);
        let radius = SEARCH_RADIUS_METERS.to_string();

        debug!("Searching hospitals near {}", location);
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("location", location_param.as_str()),
                ("radius", radius.as_str()),
                ("type", "hospital"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let body = response.text().await?;
        parse_places_response(&body).map_err(|e| {
            error!("Error fetching nearby hospitals: {}", e);
            e
        })
    }
}

/// Hospital lookup with input checks in front of a places client
pub struct HospitalService {
    client: Option<Arc<dyn PlacesClient>>,
}

impl HospitalService {
    pub fn new(client: Option<Arc<dyn PlacesClient>>) -> Self {
        Self { client }
    }

    /// Whether lookups can be made
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Hospitals near the given coordinates
    pub async fn find_nearby(&self, latitude: f64, longitude: f64) -> Result<Vec<Hospital>, GuidanceError> {
        let location = UserLocation::new(latitude, longitude)
            .map_err(|e| GuidanceError::Validation(e.to_string()))?;

        let client = self.client.as_ref().ok_or_else(|| {
            GuidanceError::Configuration("GOOGLE_API_KEY environment variable is not set.".to_string())
        })?;

        let hospitals = client.nearby_hospitals(location).await?;
        info!("Found {} hospitals near {}", hospitals.len(), location);
        Ok(hospitals)
    }
}

/// Build the hospital service, wiring the Places client when a key is configured
pub fn create_hospital_service(config: &GuidanceConfig) -> Result<HospitalService, GuidanceError> {
    let client: Option<Arc<dyn PlacesClient>> = match &config.places_api_key {
        Some(key) => Some(Arc::new(GooglePlacesClient::new(key.clone(), config.http_timeout)?)),
        None => None,
    };
    Ok(HospitalService::new(client))
}
