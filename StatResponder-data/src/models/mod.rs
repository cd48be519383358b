// Storage models
pub mod user_data;

pub use user_data::{EmergencyContact, MedicalInfo, UserDocument};
