// StatResponder-api lib.rs
//
// This is the main library file for the StatResponder API.
// It re-exports the APIs from the various modules.

// Public modules
pub mod api;
pub mod bootstrap;
pub mod entities;
pub mod openapi;

pub use api::{create_app, AppState, ServerSettings};
