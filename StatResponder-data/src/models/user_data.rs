use serde::{Deserialize, Serialize};

/// Storage model for an emergency contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    /// Opaque unique identifier (generated from the creation timestamp)
    pub id: String,

    /// Contact's display name
    pub name: String,

    /// Relationship to the user (e.g., Spouse, Parent)
    pub relationship: String,

    /// Phone number as entered by the user
    pub phone_number: String,
}

/// Storage model for the medical information record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalInfo {
    /// Known allergies, free text
    #[serde(default)]
    pub allergies: String,

    /// Current medications, free text
    #[serde(default)]
    pub medications: String,

    /// Medical conditions, free text
    #[serde(default)]
    pub conditions: String,
}

/// The full persisted record of a single user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    /// Emergency contacts in insertion order
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,

    /// Medical information, absent until first saved
    #[serde(default)]
    pub medical_info: Option<MedicalInfo>,
}

impl UserDocument {
    /// Position of the contact with the given id, if present
    pub fn contact_index(&self, id: &str) -> Option<usize> {
        self.emergency_contacts.iter().position(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_uses_camel_case_phone_field() {
        let contact = EmergencyContact {
            id: "1700000000000".to_string(),
            name: "Jane Doe".to_string(),
            relationship: "Spouse".to_string(),
            phone_number: "+1234567890".to_string(),
        };

        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["phoneNumber"], "+1234567890");
        assert!(json.get("phone_number").is_none());
    }

    #[test]
    fn test_document_tolerates_missing_fields() {
        // A freshly created remote record may only carry one of the two fields
        let doc: UserDocument = serde_json::from_str(r#"{"medicalInfo": null}"#).unwrap();
        assert!(doc.emergency_contacts.is_empty());
        assert!(doc.medical_info.is_none());

        let info: MedicalInfo = serde_json::from_str(r#"{"allergies": "Peanuts"}"#).unwrap();
        assert_eq!(info.allergies, "Peanuts");
        assert_eq!(info.medications, "");
        assert_eq!(info.conditions, "");
    }
}
