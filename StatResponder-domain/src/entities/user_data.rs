use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Digits, spaces and dashes with an optional leading plus
pub static PHONE_NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9\s-]+$").expect("Invalid phone number pattern"));

/// Identity that scopes all stored user data
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Identity used when none is configured
    pub const DEFAULT: &'static str = "default-user";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A person to notify in an emergency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    /// Opaque identifier, unique within the user's contact list
    pub id: String,

    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Relationship is required"))]
    pub relationship: String,

    #[validate(
        length(min = 10, message = "Phone number must be at least 10 digits"),
        regex(path = "PHONE_NUMBER_REGEX", message = "Invalid phone number format")
    )]
    pub phone_number: String,
}

/// Contact details submitted before an id has been assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEmergencyContact {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Relationship is required"))]
    pub relationship: String,

    #[validate(
        length(min = 10, message = "Phone number must be at least 10 digits"),
        regex(path = "PHONE_NUMBER_REGEX", message = "Invalid phone number format")
    )]
    pub phone_number: String,
}

impl NewEmergencyContact {
    /// Attach an identifier, producing a storable contact
    pub fn with_id(self, id: String) -> EmergencyContact {
        EmergencyContact {
            id,
            name: self.name,
            relationship: self.relationship,
            phone_number: self.phone_number,
        }
    }
}

/// Medical details shared with responders. Each field is free text and may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalInfo {
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub medications: String,
    #[serde(default)]
    pub conditions: String,
}

impl MedicalInfo {
    /// Whether any field holds information worth sharing
    pub fn has_content(&self) -> bool {
        !(self.allergies.is_empty() && self.medications.is_empty() && self.conditions.is_empty())
    }
}

/// Consistent view of everything stored for a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataSnapshot {
    pub emergency_contacts: Vec<EmergencyContact>,
    pub medical_info: Option<MedicalInfo>,
}

/// Join validator field errors into a single readable message
pub fn describe_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    fields
        .iter()
        .map(|(field, errs)| {
            let messages: Vec<String> = errs
                .iter()
                .map(|err| match &err.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {}", field),
                })
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect::<Vec<String>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_contact(phone: &str) -> NewEmergencyContact {
        NewEmergencyContact {
            name: "Jane Doe".to_string(),
            relationship: "Spouse".to_string(),
            phone_number: phone.to_string(),
        }
    }

    #[test]
    fn test_valid_phone_numbers() {
        for phone in ["+1234567890", "555-010-1234", "+44 20 7946 0958"] {
            assert!(new_contact(phone).validate().is_ok(), "{} should be valid", phone);
        }
    }

    #[test]
    fn test_short_phone_number_rejected() {
        let errors = new_contact("12345").validate().unwrap_err();
        assert!(describe_validation_errors(&errors).contains("at least 10 digits"));
    }

    #[test]
    fn test_phone_with_letters_rejected() {
        let errors = new_contact("555-CALL-NOW").validate().unwrap_err();
        assert!(describe_validation_errors(&errors).contains("Invalid phone number format"));
    }

    #[test]
    fn test_missing_name_and_relationship() {
        let contact = NewEmergencyContact {
            name: String::new(),
            relationship: String::new(),
            phone_number: "+1234567890".to_string(),
        };
        let message = describe_validation_errors(&contact.validate().unwrap_err());
        assert_eq!(message, "name: Name is required; relationship: Relationship is required");
    }

    #[test]
    fn test_medical_info_content() {
        assert!(!MedicalInfo::default().has_content());
        assert!(MedicalInfo { conditions: "Asthma".to_string(), ..Default::default() }.has_content());
    }

    #[test]
    fn test_default_user_id() {
        assert_eq!(UserId::default().as_str(), "default-user");
        assert_eq!(UserId::new("alice").to_string(), "alice");
    }
}
