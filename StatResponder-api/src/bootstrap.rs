//! Startup wiring: pick the storage backend from configuration and assemble
//! the application state.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};

use stat_responder_data::database::DatabasePool;
use stat_responder_data::repository::{
    with_offline_cache, FileKeyValueStorage, InMemoryRepository, KeyValueRepository, PersistenceMode,
    SqliteDocumentStore, UserDataRepositoryTrait,
};
use stat_responder_domain::config::{AppConfig, StorageKind};
use stat_responder_domain::database;
use stat_responder_domain::health::HealthService as DomainHealthService;
use stat_responder_domain::services::{
    create_guidance_service, create_hospital_service, create_user_data_store, UserDataServiceTrait,
};

use crate::api::state::{AppState, ServerSettings};

/// Attempts made at the initial load before giving up
const LOAD_ATTEMPTS: u32 = 5;

/// The storage backend chosen at startup
pub struct Backend {
    pub repository: Arc<dyn UserDataRepositoryTrait>,
    pub mode: PersistenceMode,
    /// Whether the SQLite pool backs this deployment
    pub uses_database: bool,
}

/// Open the storage backend named by `STAT_STORAGE`
pub fn build_backend(config: &AppConfig) -> anyhow::Result<Backend> {
    match config.storage {
        StorageKind::Sqlite => {
            let pool = database::initialize_database_pool(&config.database)
                .context("Failed to initialize database pool")?;
            info!("Using {}", pool.connection_info());
            Ok(sqlite_backend(pool, config))
        }
        StorageKind::File => {
            let storage = FileKeyValueStorage::open(config.kv_path.clone()).with_context(|| {
                format!("Failed to open key-value storage at {}", config.kv_path.display())
            })?;
            info!("Using key-value storage at {}", config.kv_path.display());

            Ok(Backend {
                repository: Arc::new(KeyValueRepository::new(storage)),
                mode: PersistenceMode::OfflineCapable,
                uses_database: false,
            })
        }
        StorageKind::Memory => {
            warn!("Using in-memory storage, data will not survive a restart");
            Ok(Backend {
                repository: Arc::new(InMemoryRepository::new()),
                mode: PersistenceMode::OnlineOnly,
                uses_database: false,
            })
        }
    }
}

/// Wrap the document store with the offline cache when it is enabled. A pool
/// that fell back to memory starts empty, and mirroring it would overwrite
/// the cached copy of the user's data, so it never gets the cache.
fn sqlite_backend(pool: DatabasePool, config: &AppConfig) -> Backend {
    let in_memory = pool.is_in_memory();
    let store = SqliteDocumentStore::new(pool);

    let (repository, mode) = if in_memory {
        warn!("SQLite is running in memory, data will not survive a restart");
        if config.offline_cache {
            error!(
                "Offline cache at {} left untouched: the database is not durable",
                config.cache_path.display()
            );
        }
        let repository: Arc<dyn UserDataRepositoryTrait> = Arc::new(store);
        (repository, PersistenceMode::OnlineOnly)
    } else if config.offline_cache {
        with_offline_cache(store, config.cache_path.clone())
    } else {
        let repository: Arc<dyn UserDataRepositoryTrait> = Arc::new(store);
        (repository, PersistenceMode::OnlineOnly)
    };

    Backend { repository, mode, uses_database: true }
}

/// Assemble every service the router needs
pub fn build_state(config: &AppConfig, backend: Backend) -> anyhow::Result<AppState> {
    let store = create_user_data_store(backend.repository, config.user_id.clone(), backend.mode);

    let guidance = create_guidance_service(&config.guidance, &config.emergency_number)
        .context("Failed to create the generative model client")?;
    let hospitals =
        create_hospital_service(&config.guidance).context("Failed to create the places client")?;

    let health = DomainHealthService::new(
        store.clone(),
        backend.uses_database,
        guidance.has_model(),
        hospitals.is_configured(),
    );

    Ok(AppState::new(
        store,
        guidance,
        hospitals,
        Arc::new(health),
        ServerSettings {
            emergency_number: config.emergency_number.clone(),
            environment: config.app_env.clone(),
        },
    ))
}

/// Run the initial load, retrying with a doubling delay. The store stays in
/// its loading state (and refuses writes) until one attempt succeeds.
pub async fn load_user_data(store: Arc<dyn UserDataServiceTrait>, first_delay: Duration) -> bool {
    let mut delay = first_delay;

    for attempt in 1..=LOAD_ATTEMPTS {
        match store.load().await {
            Ok(snapshot) => {
                info!(
                    "Loaded user data for {}: {} contact(s), medical info {}",
                    store.user_id(),
                    snapshot.emergency_contacts.len(),
                    if snapshot.medical_info.is_some() { "present" } else { "absent" }
                );
                return true;
            }
            Err(e) if attempt < LOAD_ATTEMPTS => {
                warn!("Loading user data failed (attempt {}/{}): {}", attempt, LOAD_ATTEMPTS, e);
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => {
                error!("Giving up loading user data after {} attempts: {}", LOAD_ATTEMPTS, e);
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use stat_responder_data::database::DatabaseConfig;
    use stat_responder_domain::entities::UserId;
    use stat_responder_domain::services::user_data::UserDataStore;
    use stat_responder_domain::testing::FailingRepository;

    fn config_for(storage: &str, dir: &std::path::Path) -> AppConfig {
        let dir = dir.to_string_lossy().to_string();
        let storage = storage.to_string();
        AppConfig::from_lookup(move |name| match name {
            "STAT_STORAGE" => Some(storage.clone()),
            "DATA_DIR" => Some(dir.clone()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_memory_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = build_backend(&config_for("memory", dir.path())).unwrap();

        assert_eq!(backend.repository.backend_name(), "memory");
        assert_eq!(backend.mode, PersistenceMode::OnlineOnly);
        assert!(!backend.uses_database);
    }

    #[test]
    fn test_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = build_backend(&config_for("file", dir.path())).unwrap();

        assert_eq!(backend.repository.backend_name(), "key-value");
        assert_eq!(backend.mode, PersistenceMode::OfflineCapable);
    }

    #[test]
    fn test_in_memory_pool_skips_offline_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for("sqlite", dir.path());
        assert!(config.offline_cache);

        let backend = sqlite_backend(DatabasePool::in_memory().unwrap(), &config);
        assert_eq!(backend.repository.backend_name(), "sqlite");
        assert_eq!(backend.mode, PersistenceMode::OnlineOnly);
        assert!(backend.uses_database);
        assert!(!config.cache_path.exists());
        assert!(!config.cache_path.with_extension("lock").exists());
    }

    #[test]
    fn test_file_pool_gets_offline_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for("sqlite", dir.path());
        let db_config = DatabaseConfig {
            sqlite_path: Some(dir.path().join("stat.db").to_string_lossy().to_string()),
            ..DatabaseConfig::default()
        };

        let backend = sqlite_backend(DatabasePool::open(&db_config).unwrap(), &config);
        assert_eq!(backend.mode, PersistenceMode::OfflineCapable);
        assert!(config.cache_path.with_extension("lock").exists());
    }

    #[tokio::test]
    async fn test_state_without_keys_has_no_integrations() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for("memory", dir.path());
        let state = build_state(&config, build_backend(&config).unwrap()).unwrap();

        assert!(!state.guidance.has_model());
        assert!(!state.hospitals.is_configured());
        assert_eq!(state.settings.emergency_number, "911");
        assert!(state.user_data.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_retries_until_backend_recovers() {
        let repository = FailingRepository::new();
        repository.set_fail_reads(true);
        let store: Arc<dyn UserDataServiceTrait> =
            Arc::new(UserDataStore::new(Arc::new(repository.clone()), UserId::default()));

        let loader = tokio::spawn(load_user_data(store.clone(), Duration::from_secs(1)));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(store.is_loading());

        repository.set_fail_reads(false);
        assert!(loader.await.unwrap());
        assert!(!store.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_gives_up() {
        let repository = FailingRepository::new();
        repository.set_fail_reads(true);
        let store: Arc<dyn UserDataServiceTrait> =
            Arc::new(UserDataStore::new(Arc::new(repository), UserId::default()));

        assert!(!load_user_data(store.clone(), Duration::from_millis(10)).await);
        assert!(store.is_loading());
    }
}
