// StatResponder Data
// This crate owns persistence of the user's emergency data

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Data storage models
pub mod models;
