// Public entities for the StatResponder API
// This module contains data structures that are shared across the application boundary

// Emergency contacts and medical info
pub mod user_data;

// AI guidance, symptom checker and hospital lookups
pub mod guidance;

// SOS and preparedness
pub mod sos;
