//! Database connection module for the StatResponder application
//!
//! The hosted document store is backed by SQLite through an r2d2 connection pool.
//! When the database file cannot be opened the pool falls back to an in-memory
//! database so the service keeps running without durable storage.

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use thiserror::Error;
use tracing::{error, info, warn};

use super::migrations::run_sqlite_migrations;

/// Global database pool used by the server binary
static DB_POOL: OnceCell<DatabasePool> = OnceCell::new();

/// Default location of the SQLite database file
pub const DEFAULT_SQLITE_PATH: &str = "data/stat_responder.db";

/// Database error
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// SQLite connection pool error
    #[error("SQLite connection pool error: {0}")]
    SqlitePoolError(#[from] r2d2::Error),

    /// Database pool already initialized
    #[error("Database pool is already initialized")]
    PoolAlreadyInitialized,

    /// Database pool not initialized
    #[error("Database pool is not initialized")]
    PoolNotInitialized,

    /// Configuration error
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Migration error
    #[error("Database migration error: {0}")]
    MigrationError(String),
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to SQLite database file, `None` for an in-memory database
    pub sqlite_path: Option<String>,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: Some(DEFAULT_SQLITE_PATH.to_string()),
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration from environment variables
    pub fn from_env() -> Result<Self, DatabaseError> {
        Self::from_lookup(|name| env::var(name).ok(), DEFAULT_SQLITE_PATH)
    }

    /// Build a configuration from an arbitrary variable source.
    /// `default_path` is used when `DB_SQLITE_PATH` is not set.
    pub fn from_lookup<F>(lookup: F, default_path: &str) -> Result<Self, DatabaseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let sqlite_path = match lookup("DB_SQLITE_PATH") {
            Some(path) => {
                info!("Using SQLite database at: {}", path);
                path
            }
            None => {
                info!("No DB_SQLITE_PATH provided, will use default path: {}", default_path);
                default_path.to_string()
            }
        };

        let max_connections = parse_var(&lookup, "DB_MAX_CONNECTIONS", 10)?;
        let timeout_seconds = parse_var(&lookup, "DB_TIMEOUT_SECONDS", 30)?;

        if max_connections == 0 {
            return Err(DatabaseError::ConfigError(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        info!("Database configuration: max_connections={}, timeout={}s",
            max_connections, timeout_seconds);

        Ok(DatabaseConfig {
            sqlite_path: Some(sqlite_path),
            max_connections,
            timeout_seconds,
        })
    }

    /// A configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            sqlite_path: None,
            max_connections: 1,
            timeout_seconds: 5,
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, DatabaseError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| DatabaseError::ConfigError(format!("{} has an invalid value: {}", name, value))),
        None => Ok(default),
    }
}

/// SQLite connection pool shared by the document store and health checks
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: Arc<r2d2::Pool<SqliteConnectionManager>>,
    in_memory: bool,
}

impl DatabasePool {
    /// Open a pool for the configured database file and run migrations.
    /// Falls back to an in-memory database if the file cannot be used.
    pub fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = match config.sqlite_path.as_deref() {
            Some(path) => open_file_pool(path, config)?,
            None => open_in_memory_pool(config)?,
        };

        pool.run_migrations()?;
        Ok(pool)
    }

    /// Open a fresh in-memory database, mostly useful for tests
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Self::open(&DatabaseConfig::in_memory())
    }

    /// Get a pooled connection
    pub fn get(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, r2d2::Error> {
        self.pool.get()
    }

    /// Whether this pool lost durability by falling back to memory
    pub fn is_in_memory(&self) -> bool {
        self.in_memory
    }

    fn run_migrations(&self) -> Result<(), DatabaseError> {
        info!("Running database migrations");

        let conn = self.pool.get()?;
        run_sqlite_migrations(&conn).map_err(DatabaseError::MigrationError)?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Describe the current connection for health reporting
    pub fn connection_info(&self) -> String {
        let conn = match self.pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to get SQLite connection: {}", e);
                return format!("SQLite connection error: {}", e);
            }
        };

        let location = match conn.query_row("PRAGMA database_list", [], |row| row.get::<_, String>(2)) {
            Ok(path) if path.is_empty() || path == ":memory:" => "SQLite in-memory database".to_string(),
            Ok(path) => format!("SQLite database at {}", path),
            Err(_) => "SQLite database (path unknown)".to_string(),
        };

        let state = self.pool.state();
        format!("{} (connections: active={}, idle={})",
            location,
            state.connections,
            state.idle_connections
        )
    }
}

/// Open a pool backed by a database file
fn open_file_pool(sqlite_path: &str, config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!("Initializing SQLite database at: {}", sqlite_path);

    if let Some(parent) = Path::new(sqlite_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating parent directory: {:?}", parent);
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create directory: {}, falling back to in-memory database", e);
                return open_in_memory_pool(config);
            }
        }
    }

    let manager = SqliteConnectionManager::file(sqlite_path)
        .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;"));

    let pool = match r2d2::Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(Duration::from_secs(config.timeout_seconds))
        .build(manager)
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to create SQLite connection pool: {}", e);
            warn!("Falling back to in-memory SQLite database");
            return open_in_memory_pool(config);
        }
    };

    match pool.get() {
        Ok(_) => {
            info!("SQLite connection pool created successfully");
            Ok(DatabasePool { pool: Arc::new(pool), in_memory: false })
        }
        Err(e) => {
            error!("Failed to connect to SQLite database: {}", e);
            warn!("Falling back to in-memory SQLite database");
            open_in_memory_pool(config)
        }
    }
}

/// Open an in-memory database.
/// Every SQLite memory connection is its own database, so the pool holds exactly one.
fn open_in_memory_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!("Initializing in-memory SQLite database");

    let manager = SqliteConnectionManager::memory()
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

    let pool = r2d2::Pool::builder()
        .max_size(1)
        .connection_timeout(Duration::from_secs(config.timeout_seconds))
        .build(manager)?;

    Ok(DatabasePool { pool: Arc::new(pool), in_memory: true })
}

/// Initialize the global database connection pool
pub fn initialize_database_pool(config: &DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    if DB_POOL.get().is_some() {
        return Err(DatabaseError::PoolAlreadyInitialized);
    }

    let pool = DatabasePool::open(config)?;

    DB_POOL
        .set(pool.clone())
        .map_err(|_| DatabaseError::PoolAlreadyInitialized)?;

    Ok(pool)
}

/// Get the global database connection pool
pub fn get_db_pool() -> Result<DatabasePool, DatabaseError> {
    DB_POOL.get()
        .cloned()
        .ok_or(DatabaseError::PoolNotInitialized)
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.sqlite_path.as_deref(), Some(DEFAULT_SQLITE_PATH));
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_config_from_lookup() {
        let config = DatabaseConfig::from_lookup(
            |name| match name {
                "DB_MAX_CONNECTIONS" => Some("4".to_string()),
                _ => None,
            },
            "/tmp/custom.db",
        )
        .unwrap();
        assert_eq!(config.sqlite_path.as_deref(), Some("/tmp/custom.db"));
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.timeout_seconds, 30);

        let invalid = DatabaseConfig::from_lookup(
            |name| (name == "DB_MAX_CONNECTIONS").then(|| "0".to_string()),
            DEFAULT_SQLITE_PATH,
        );
        assert!(matches!(invalid, Err(DatabaseError::ConfigError(_))));
    }

    #[test]
    fn test_in_memory_pool_runs_migrations() {
        let pool = DatabasePool::in_memory().unwrap();
        assert!(pool.is_in_memory());

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM emergency_contacts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
        drop(conn);

        assert!(pool.connection_info().contains("in-memory"));
    }

    #[test]
    fn test_file_pool_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stat.db");
        let config = DatabaseConfig {
            sqlite_path: Some(path.to_string_lossy().to_string()),
            max_connections: 2,
            timeout_seconds: 5,
        };

        let pool = DatabasePool::open(&config).unwrap();
        assert!(!pool.is_in_memory());
        assert!(path.exists());
        assert!(pool.connection_info().contains("stat.db"));
    }
}
