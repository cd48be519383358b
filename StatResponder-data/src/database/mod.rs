// Database modules
pub mod connection;
pub mod migrations;

// Re-export database connection types and functions
pub use connection::{
    get_db_pool, initialize_database_pool, DatabaseConfig, DatabaseError,
    DatabasePool, DEFAULT_SQLITE_PATH,
};
