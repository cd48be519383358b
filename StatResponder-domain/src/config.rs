//! Application configuration read from environment variables

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use stat_responder_data::database::{DatabaseConfig, DatabaseError};
use thiserror::Error;
use tracing::{info, warn};

use crate::entities::UserId;

/// Default generative model
pub const DEFAULT_AI_MODEL: &str = "gemini-2.0-flash";

/// Default emergency number dialled from the SOS flow
pub const DEFAULT_EMERGENCY_NUMBER: &str = "911";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be used
    #[error("{name} has an invalid value: {value}")]
    InvalidValue { name: String, value: String },

    /// Database settings are inconsistent
    #[error("Database configuration error: {0}")]
    Database(#[from] DatabaseError),
}

/// Where user data is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Hosted document store on SQLite
    Sqlite,
    /// Local key-value file
    File,
    /// Volatile, lost on restart
    Memory,
}

impl FromStr for StorageKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageKind::Sqlite),
            "file" => Ok(StorageKind::File),
            "memory" => Ok(StorageKind::Memory),
            _ => Err(()),
        }
    }
}

/// Settings for the generative model and places lookups
#[derive(Debug, Clone)]
pub struct GuidanceConfig {
    pub genai_api_key: Option<String>,
    pub places_api_key: Option<String>,
    pub model: String,
    pub http_timeout: Duration,
}

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub storage: StorageKind,
    pub database: DatabaseConfig,
    pub kv_path: PathBuf,
    pub offline_cache: bool,
    pub cache_path: PathBuf,
    pub user_id: UserId,
    pub emergency_number: String,
    pub guidance: GuidanceConfig,
    pub app_env: String,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = parse(&get, "PORT", 3000u16)?;
        let data_dir = PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "data".to_string()));

        let storage = match get("STAT_STORAGE") {
            Some(value) => value.parse::<StorageKind>().map_err(|_| ConfigError::InvalidValue {
                name: "STAT_STORAGE".to_string(),
                value,
            })?,
            None => StorageKind::Sqlite,
        };

        let default_db = data_dir.join("stat_responder.db");
        let database = DatabaseConfig::from_lookup(&get, &default_db.to_string_lossy())?;

        let kv_path = get("STAT_KV_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("local_storage.json"));
        let cache_path = get("STAT_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("offline_cache.json"));
        let offline_cache = parse_flag(&get, "STAT_OFFLINE_CACHE", true)?;

        let user_id = get("STAT_USER_ID").map(UserId::new).unwrap_or_default();
        let emergency_number = get("STAT_EMERGENCY_NUMBER")
            .unwrap_or_else(|| DEFAULT_EMERGENCY_NUMBER.to_string());

        let genai_api_key = get("GOOGLE_GENAI_API_KEY").or_else(|| get("GEMINI_API_KEY"));
        let places_api_key = get("GOOGLE_API_KEY");
        if genai_api_key.is_none() {
            warn!("No generative model API key configured, AI guidance will be unavailable");
        }
        if places_api_key.is_none() {
            warn!("GOOGLE_API_KEY is not set, nearby hospital lookup will be unavailable");
        }

        let guidance = GuidanceConfig {
            genai_api_key,
            places_api_key,
            model: get("STAT_AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            http_timeout: Duration::from_secs(parse(&get, "STAT_HTTP_TIMEOUT_SECONDS", 30u64)?),
        };

        let app_env = get("APP_ENV").unwrap_or_else(|| "development".to_string());

        info!(
            "Configuration loaded: storage={:?}, user={}, environment={}",
            storage, user_id, app_env
        );

        Ok(Self {
            port,
            data_dir,
            storage,
            database,
            kv_path,
            offline_cache,
            cache_path,
            user_id,
            emergency_number,
            guidance,
            app_env,
        })
    }
}

fn parse<F, T>(get: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(name) {
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn parse_flag<F>(get: &F, name: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { name: name.to_string(), value }),
        },
        None => Ok(default),
    }
}
