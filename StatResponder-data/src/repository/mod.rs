// Repository module structure
pub mod errors;
pub mod user_data;
mod in_memory;
mod key_value;
mod document;
mod cached;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use user_data::UserDataRepositoryTrait;
pub use in_memory::InMemoryRepository;
pub use key_value::{
    FileKeyValueStorage, KeyValueRepository, KeyValueStorage, MemoryKeyValueStorage,
    EMERGENCY_CONTACTS_KEY, MEDICAL_INFO_KEY,
};
pub use document::SqliteDocumentStore;
pub use cached::{with_offline_cache, CacheInitError, CachedBackend, OfflineCache, PersistenceMode};

// Re-export test doubles for both testing and when mock feature is enabled
#[cfg(any(test, feature = "mock"))]
pub use user_data::tests;
