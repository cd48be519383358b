use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use stat_responder_domain::entities::{
    EmergencyContact as DomainEmergencyContact, MedicalInfo as DomainMedicalInfo,
    NewEmergencyContact, UserDataSnapshot,
};
use stat_responder_domain::services::SyncState;

/// Public representation of an emergency contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    /// Unique identifier for the contact
    #[schema(example = "1718040000000")]
    pub id: String,

    #[schema(example = "Jane Doe")]
    pub name: String,

    #[schema(example = "Spouse")]
    pub relationship: String,

    /// At least 10 characters of digits, spaces or dashes, optionally starting with +
    #[schema(example = "+1234567890")]
    pub phone_number: String,
}

/// Request payload for creating or replacing a contact
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[schema(example = "Jane Doe")]
    pub name: String,

    #[schema(example = "Spouse")]
    pub relationship: String,

    #[schema(example = "+1234567890")]
    pub phone_number: String,
}

/// Medical details shared with responders. Empty strings mean "not provided".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicalInfo {
    #[schema(example = "Penicillin")]
    pub allergies: String,

    #[schema(example = "Insulin")]
    pub medications: String,

    #[schema(example = "Type 1 diabetes")]
    pub conditions: String,
}

/// Everything the store holds for the user, plus its state
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDataResponse {
    pub emergency_contacts: Vec<EmergencyContact>,

    /// `null` until medical info has been saved
    pub medical_info: Option<MedicalInfo>,

    /// True until the initial load from storage has finished
    pub is_loading: bool,

    /// "durable" or "pending"
    #[schema(example = "durable")]
    pub sync_state: String,

    /// Number of changes applied in memory but not yet persisted
    pub pending_changes: usize,
}

/// Convert a domain contact to its public form
pub fn convert_to_public_contact(contact: DomainEmergencyContact) -> EmergencyContact {
    EmergencyContact {
        id: contact.id,
        name: contact.name,
        relationship: contact.relationship,
        phone_number: contact.phone_number,
    }
}

/// Convert a create request to the domain's id-less contact
pub fn convert_to_new_contact(request: ContactRequest) -> NewEmergencyContact {
    NewEmergencyContact {
        name: request.name,
        relationship: request.relationship,
        phone_number: request.phone_number,
    }
}

/// Convert a replace request for `id` to a domain contact
pub fn convert_to_domain_contact(id: String, request: ContactRequest) -> DomainEmergencyContact {
    convert_to_new_contact(request).with_id(id)
}

pub fn convert_to_public_medical_info(info: DomainMedicalInfo) -> MedicalInfo {
    MedicalInfo {
        allergies: info.allergies,
        medications: info.medications,
        conditions: info.conditions,
    }
}

pub fn convert_to_domain_medical_info(info: MedicalInfo) -> DomainMedicalInfo {
    DomainMedicalInfo {
        allergies: info.allergies,
        medications: info.medications,
        conditions: info.conditions,
    }
}

/// Build the full user data response
pub fn build_user_data_response(
    snapshot: UserDataSnapshot,
    is_loading: bool,
    sync_state: SyncState,
) -> UserDataResponse {
    let (sync_state, pending_changes) = match sync_state {
        SyncState::Durable => ("durable", 0),
        SyncState::Pending(n) => ("pending", n),
    };

    UserDataResponse {
        emergency_contacts: snapshot
            .emergency_contacts
            .into_iter()
            .map(convert_to_public_contact)
            .collect(),
        medical_info: snapshot.medical_info.map(convert_to_public_medical_info),
        is_loading,
        sync_state: sync_state.to_string(),
        pending_changes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_uses_camel_case() {
        let contact = EmergencyContact {
            id: "1".to_string(),
            name: "Jane Doe".to_string(),
            relationship: "Spouse".to_string(),
            phone_number: "+1234567890".to_string(),
        };

        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["phoneNumber"], "+1234567890");
        assert!(json.get("phone_number").is_none());
    }

    #[test]
    fn test_medical_info_missing_fields_default_to_empty() {
        let info: MedicalInfo = serde_json::from_str(r#"{"allergies":"Peanuts"}"#).unwrap();
        assert_eq!(info.allergies, "Peanuts");
        assert_eq!(info.medications, "");
        assert_eq!(info.conditions, "");
    }

    #[test]
    fn test_pending_sync_state() {
        let response = build_user_data_response(UserDataSnapshot::default(), false, SyncState::Pending(2));
        assert_eq!(response.sync_state, "pending");
        assert_eq!(response.pending_changes, 2);
        assert!(response.medical_info.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["medicalInfo"].is_null());
        assert_eq!(json["isLoading"], false);
    }
}
