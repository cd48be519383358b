pub mod health;
pub mod user_data;
pub mod contacts;
pub mod guidance;
pub mod hospitals;
pub mod sos;

// Tests module
#[cfg(test)]
mod tests;

// Re-export handlers for easier imports
pub use contacts::{create_contact, delete_contact, list_contacts, update_contact};
pub use guidance::{check_symptoms, list_common_symptoms, symptom_guidance, voice_guidance};
pub use health::health_check;
pub use hospitals::nearby_hospitals;
pub use sos::{list_emergency_directory, preparedness_text, trigger_sos};
pub use user_data::{get_medical_info, get_user_data, update_medical_info};
