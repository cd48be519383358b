use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use stat_responder_domain::entities::{LocationStatus, UserLocation};
use stat_responder_domain::services::{DirectoryEntry, SosReport};

/// What the client knows about its position.
///
/// Send both coordinates when a fix is available, or `locationError` when
/// the device could not determine one. An empty object means the fix is
/// still pending.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationRequest {
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    #[schema(example = 40.712776)]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    #[schema(example = -74.005974)]
    pub longitude: Option<f64>,

    /// Why the device could not determine a position
    #[schema(example = "User denied Geolocation")]
    pub location_error: Option<String>,
}

impl LocationRequest {
    /// Interpret the request as a location status
    pub fn to_status(&self) -> Result<LocationStatus, String> {
        let location = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                Some(UserLocation::new(latitude, longitude).map_err(|e| e.to_string())?)
            }
            (None, None) => None,
            _ => return Err("Latitude and longitude must be provided together".to_string()),
        };

        Ok(LocationStatus::from_parts(location, self.location_error.clone()))
    }
}

/// What the SOS button reports when triggered
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SosResponse {
    /// Multi-line alert text
    pub message: String,
    #[schema(example = "911")]
    pub emergency_number: String,
    #[schema(example = "tel:911")]
    pub tel_uri: String,
    /// Contact that would be notified first
    pub primary_contact: Option<String>,
    pub medical_info_available: bool,
}

/// Plain-text summary for copying
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PreparednessResponse {
    pub text: String,
}

/// A local emergency service with a dialable link
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntryResponse {
    #[schema(example = "City General Hospital")]
    pub name: String,
    #[schema(example = "555-0101")]
    pub number: String,
    #[schema(example = "tel:555-0101")]
    pub tel_uri: String,
}

/// Hospitals and ambulance services to call directly
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyDirectoryResponse {
    pub hospitals: Vec<DirectoryEntryResponse>,
    pub ambulance_services: Vec<DirectoryEntryResponse>,
}

pub fn convert_to_directory_entry(entry: &DirectoryEntry) -> DirectoryEntryResponse {
    DirectoryEntryResponse {
        name: entry.name.to_string(),
        number: entry.number.to_string(),
        tel_uri: entry.tel_uri(),
    }
}

pub fn convert_to_sos_response(report: SosReport) -> SosResponse {
    SosResponse {
        message: report.message,
        emergency_number: report.emergency_number,
        tel_uri: report.tel_uri,
        primary_contact: report.primary_contact,
        medical_info_available: report.medical_info_available,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_request_is_pending() {
        let request: LocationRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.to_status().unwrap(), LocationStatus::Pending);
    }

    #[test]
    fn test_coordinates_win_over_error() {
        let request = LocationRequest {
            latitude: Some(40.0),
            longitude: Some(-75.0),
            location_error: Some("timeout".to_string()),
        };
        assert!(matches!(request.to_status().unwrap(), LocationStatus::Known(_)));
    }

    #[test]
    fn test_location_error_only() {
        let request: LocationRequest =
            serde_json::from_str(r#"{"locationError":"User denied Geolocation"}"#).unwrap();
        assert_eq!(
            request.to_status().unwrap(),
            LocationStatus::Unavailable("User denied Geolocation".to_string())
        );
    }

    #[test]
    fn test_half_a_location_is_rejected() {
        let request = LocationRequest { latitude: Some(40.0), ..Default::default() };
        assert!(request.to_status().is_err());
    }
}
