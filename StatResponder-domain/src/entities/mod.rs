// Domain entities and value objects
pub mod user_data;
pub mod location;
pub mod guidance;
pub mod conversions;

// Re-export common types for easier imports
pub use user_data::{EmergencyContact, MedicalInfo, NewEmergencyContact, UserDataSnapshot, UserId};
pub use location::{InvalidLocation, LocationStatus, UserLocation};
pub use guidance::{GenerationRequest, Hospital, InlineMedia, SymptomAdvice, SymptomGuidance, VoiceGuidance};
