// StatResponder Domain
// This crate contains the business logic for the StatResponder emergency assistant

// Services that implement business logic
pub mod services;

// Domain entities
pub mod entities;

// Runtime configuration
pub mod config;

// Health checks and system status
pub mod health;

// Re-export the database module from stat_responder_data for convenience
pub use stat_responder_data::database;

// Testing utilities - only available with mock feature
#[cfg(feature = "mock")]
pub mod testing;
