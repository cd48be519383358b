pub mod user_data;
pub mod symptoms;
pub mod guidance;
pub mod gemini;
pub mod hospitals;
pub mod sos;
pub mod recording;

// Domain services
// This module contains business logic implementations.

// Re-export service traits and factory functions
pub use user_data::{
    create_in_memory_user_data_store, create_user_data_store, Rollback, StoreError, SyncState,
    UserDataServiceTrait, UserDataStore,
};
pub use guidance::{create_guidance_service, GenerativeModel, GuidanceError, GuidanceService};
pub use gemini::GeminiClient;
pub use hospitals::{create_hospital_service, GooglePlacesClient, HospitalService, PlacesClient};
pub use sos::{emergency_directory, format_emergency_info, DirectoryCategory, DirectoryEntry, SosReport};
pub use recording::{RecordingTimer, StopReason, SOS_RECORDING_LIMIT, VOICE_RECORDING_LIMIT};
