use crate::entities::user_data::{EmergencyContact, MedicalInfo, UserDataSnapshot};
use stat_responder_data::models::user_data as data;

/// Conversion functions between domain entities and data models
/// These functions follow the pattern convert_to_[target_layer]_[model_name]

/// Convert from data model to domain entity for an emergency contact
pub fn convert_to_domain_contact(data_contact: data::EmergencyContact) -> EmergencyContact {
    EmergencyContact {
        id: data_contact.id,
        name: data_contact.name,
        relationship: data_contact.relationship,
        phone_number: data_contact.phone_number,
    }
}

/// Convert from domain entity to data model for an emergency contact
pub fn convert_to_data_contact(contact: &EmergencyContact) -> data::EmergencyContact {
    data::EmergencyContact {
        id: contact.id.clone(),
        name: contact.name.clone(),
        relationship: contact.relationship.clone(),
        phone_number: contact.phone_number.clone(),
    }
}

/// Convert from data model to domain entity for medical info
pub fn convert_to_domain_medical_info(data_info: data::MedicalInfo) -> MedicalInfo {
    MedicalInfo {
        allergies: data_info.allergies,
        medications: data_info.medications,
        conditions: data_info.conditions,
    }
}

/// Convert from domain entity to data model for medical info
pub fn convert_to_data_medical_info(info: &MedicalInfo) -> data::MedicalInfo {
    data::MedicalInfo {
        allergies: info.allergies.clone(),
        medications: info.medications.clone(),
        conditions: info.conditions.clone(),
    }
}

/// Convert a stored user document into the domain snapshot
pub fn convert_to_domain_snapshot(document: data::UserDocument) -> UserDataSnapshot {
    UserDataSnapshot {
        emergency_contacts: document
            .emergency_contacts
            .into_iter()
            .map(convert_to_domain_contact)
            .collect(),
        medical_info: document.medical_info.map(convert_to_domain_medical_info),
    }
}
