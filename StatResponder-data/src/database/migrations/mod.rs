// Database migrations module
// Schema for the user document store: one row per user plus a keyed contacts sub-collection

mod sqlite;
pub use sqlite::run_migrations as run_sqlite_migrations;
