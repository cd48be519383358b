use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coordinates outside the valid latitude/longitude ranges
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid coordinates: latitude {latitude}, longitude {longitude}")]
pub struct InvalidLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// A position reported by the client device. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl UserLocation {
    /// Build a location, rejecting values outside ±90 / ±180
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidLocation> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if valid {
            Ok(Self { latitude, longitude })
        } else {
            Err(InvalidLocation { latitude, longitude })
        }
    }
}

impl fmt::Display for UserLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lat {:.4}, Lon {:.4}", self.latitude, self.longitude)
    }
}

/// What the client knows about its position at the time of a request
#[derive(Debug, Clone, PartialEq)]
pub enum LocationStatus {
    /// A fix is available
    Known(UserLocation),
    /// Location could not be determined, with the reason
    Unavailable(String),
    /// Still waiting for a fix
    Pending,
}

impl LocationStatus {
    /// Combine the optional pieces a client sends into a status
    pub fn from_parts(location: Option<UserLocation>, error: Option<String>) -> Self {
        match (location, error) {
            (Some(location), _) => LocationStatus::Known(location),
            (None, Some(error)) => LocationStatus::Unavailable(error),
            (None, None) => LocationStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_formatting() {
        let location = UserLocation::new(40.712776, -74.005974).unwrap();
        assert_eq!(location.to_string(), "Lat 40.7128, Lon -74.0060");
    }

    #[test]
    fn test_location_range_checks() {
        assert!(UserLocation::new(90.0, 180.0).is_ok());
        assert!(UserLocation::new(-90.0, -180.0).is_ok());
        assert!(UserLocation::new(90.5, 0.0).is_err());
        assert!(UserLocation::new(0.0, -180.1).is_err());
        assert!(UserLocation::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_status_prefers_known_location() {
        let location = UserLocation::new(1.0, 2.0).unwrap();
        assert_eq!(
            LocationStatus::from_parts(Some(location), Some("ignored".to_string())),
            LocationStatus::Known(location)
        );
        assert_eq!(
            LocationStatus::from_parts(None, Some("denied".to_string())),
            LocationStatus::Unavailable("denied".to_string())
        );
        assert_eq!(LocationStatus::from_parts(None, None), LocationStatus::Pending);
    }
}
