//! Offline persistence layer for the hosted document store.
//!
//! The cache keeps the last known copy of every user document on local disk.
//! Reads are served from it when the primary store is unreachable, and every
//! successful write is mirrored into it. Only one process may own a cache
//! file at a time; a second opener gets [`CacheInitError::InUse`]. The lock
//! file records the owner's PID, and a lock whose owner is no longer running
//! is taken over.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sysinfo::{Pid, ProcessesToUpdate, System};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::models::user_data::{EmergencyContact, MedicalInfo, UserDocument};
use super::errors::RepositoryError;
use super::user_data::UserDataRepositoryTrait;

/// Why the offline cache could not be enabled
#[derive(Error, Debug)]
pub enum CacheInitError {
    /// Another process holds the cache
    #[error("offline cache at {0} is already in use by another process")]
    InUse(String),

    /// The environment cannot host the cache (read-only or unsupported filesystem)
    #[error("offline cache is not supported here: {0}")]
    Unsupported(String),

    /// Any other failure
    #[error("offline cache could not be opened: {0}")]
    Other(String),
}

/// Whether reads can be served offline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceMode {
    /// Reads fall back to the local cache
    OfflineCapable,
    /// Every operation requires the primary store
    OnlineOnly,
}

impl PersistenceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistenceMode::OfflineCapable => "offline-capable",
            PersistenceMode::OnlineOnly => "online-only",
        }
    }
}

/// Exclusive on-disk cache of user documents
#[derive(Debug)]
pub struct OfflineCache {
    path: PathBuf,
    lock_path: PathBuf,
    documents: Mutex<HashMap<String, UserDocument>>,
}

impl OfflineCache {
    /// Open the cache at `path`, taking the exclusive lock
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheInitError> {
        let path = path.into();
        let lock_path = path.with_extension("lock");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| classify(&path, e))?;
            }
        }

        let mut lock = acquire_lock(&path, &lock_path)?;
        // Best effort; the lock file's existence is what matters
        let _ = writeln!(lock, "{}", std::process::id());

        let documents = match read_documents(&path) {
            Ok(documents) => documents,
            Err(e) => {
                let _ = fs::remove_file(&lock_path);
                return Err(CacheInitError::Other(e.to_string()));
            }
        };

        info!("Offline cache opened at {:?} with {} documents", path, documents.len());

        Ok(Self {
            path,
            lock_path,
            documents: Mutex::new(documents),
        })
    }

    /// Location of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last known copy of a user's document
    pub fn get(&self, user_id: &str) -> Result<Option<UserDocument>, RepositoryError> {
        Ok(self.documents.lock()?.get(user_id).cloned())
    }

    /// Apply `update` to the cached copy of a user's document and flush to disk
    pub fn update<F>(&self, user_id: &str, update: F) -> Result<(), RepositoryError>
    where
        F: FnOnce(&mut UserDocument),
    {
        let mut documents = self.documents.lock()?;
        update(documents.entry(user_id.to_string()).or_default());

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(&*documents)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Drop for OfflineCache {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.lock_path) {
            warn!("Failed to release offline cache lock {:?}: {}", self.lock_path, e);
        }
    }
}

fn create_lock(lock_path: &Path) -> std::io::Result<fs::File> {
    OpenOptions::new().write(true).create_new(true).open(lock_path)
}

fn acquire_lock(path: &Path, lock_path: &Path) -> Result<fs::File, CacheInitError> {
    match create_lock(lock_path) {
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let Some(owner) = stale_owner(lock_path) else {
                return Err(classify(path, e));
            };
            warn!("Taking over offline cache lock {:?} left by exited process {}", lock_path, owner);
            match fs::remove_file(lock_path) {
                Err(e) if e.kind() != ErrorKind::NotFound => return Err(classify(path, e)),
                _ => {}
            }
            // Losing a race here to another opener reports InUse
            create_lock(lock_path).map_err(|e| classify(path, e))
        }
        other => other.map_err(|e| classify(path, e)),
    }
}

/// PID recorded in a lock whose owner has exited. An unreadable lock is
/// treated as held, since its owner may still be writing the PID.
fn stale_owner(lock_path: &Path) -> Option<u32> {
    let owner: u32 = fs::read_to_string(lock_path).ok()?.trim().parse().ok()?;
    if owner == std::process::id() || process_is_running(owner) {
        return None;
    }
    Some(owner)
}

fn process_is_running(pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).is_some()
}

fn classify(path: &Path, e: std::io::Error) -> CacheInitError {
    match e.kind() {
        ErrorKind::AlreadyExists => CacheInitError::InUse(path.display().to_string()),
        ErrorKind::PermissionDenied | ErrorKind::Unsupported => CacheInitError::Unsupported(e.to_string()),
        _ => CacheInitError::Other(e.to_string()),
    }
}

fn read_documents(path: &Path) -> Result<HashMap<String, UserDocument>, RepositoryError> {
    match fs::read(path) {
        Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(e.into()),
    }
}

/// Repository wrapper that adds offline reads to a primary store
#[derive(Debug)]
pub struct CachedBackend<B> {
    primary: B,
    cache: OfflineCache,
}

impl<B: UserDataRepositoryTrait> CachedBackend<B> {
    pub fn new(primary: B, cache: OfflineCache) -> Self {
        Self { primary, cache }
    }

    /// The offline cache
    pub fn cache(&self) -> &OfflineCache {
        &self.cache
    }

    fn mirror<F>(&self, user_id: &str, update: F)
    where
        F: FnOnce(&mut UserDocument),
    {
        // The primary write already succeeded; a stale cache only affects offline reads
        if let Err(e) = self.cache.update(user_id, update) {
            warn!("Failed to mirror write into offline cache: {}", e);
        }
    }
}

#[async_trait]
impl<B: UserDataRepositoryTrait> UserDataRepositoryTrait for CachedBackend<B> {
    async fn load_or_create(&self, user_id: &str) -> Result<UserDocument, RepositoryError> {
        match self.primary.load_or_create(user_id).await {
            Ok(doc) => {
                let snapshot = doc.clone();
                self.mirror(user_id, move |cached| *cached = snapshot);
                Ok(doc)
            }
            Err(e) => match self.cache.get(user_id)? {
                Some(doc) => {
                    warn!("Primary store unavailable ({}), serving cached document", e);
                    Ok(doc)
                }
                None => Err(e),
            },
        }
    }

    async fn insert_contact(&self, user_id: &str, contact: &EmergencyContact) -> Result<(), RepositoryError> {
        self.primary.insert_contact(user_id, contact).await?;
        self.mirror(user_id, |doc| doc.emergency_contacts.push(contact.clone()));
        Ok(())
    }

    async fn replace_contact(&self, user_id: &str, contact: &EmergencyContact) -> Result<bool, RepositoryError> {
        let replaced = self.primary.replace_contact(user_id, contact).await?;
        if replaced {
            self.mirror(user_id, |doc| {
                if let Some(index) = doc.contact_index(&contact.id) {
                    doc.emergency_contacts[index] = contact.clone();
                }
            });
        }
        Ok(replaced)
    }

    async fn remove_contact(&self, user_id: &str, contact_id: &str) -> Result<bool, RepositoryError> {
        let removed = self.primary.remove_contact(user_id, contact_id).await?;
        if removed {
            self.mirror(user_id, |doc| doc.emergency_contacts.retain(|c| c.id != contact_id));
        }
        Ok(removed)
    }

    async fn save_medical_info(&self, user_id: &str, info: &MedicalInfo) -> Result<(), RepositoryError> {
        self.primary.save_medical_info(user_id, info).await?;
        self.mirror(user_id, |doc| doc.medical_info = Some(info.clone()));
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        self.primary.backend_name()
    }
}

/// Wrap `primary` with an offline cache at `path`.
///
/// Failing to enable the cache is never fatal: the primary store is returned
/// unwrapped and the service runs online-only.
pub fn with_offline_cache<B>(
    primary: B,
    path: impl Into<PathBuf>,
) -> (Arc<dyn UserDataRepositoryTrait>, PersistenceMode)
where
    B: UserDataRepositoryTrait + 'static,
{
    match OfflineCache::open(path) {
        Ok(cache) => {
            debug!("Offline persistence enabled for {} backend", primary.backend_name());
            (Arc::new(CachedBackend::new(primary, cache)), PersistenceMode::OfflineCapable)
        }
        Err(e @ CacheInitError::InUse(_)) => {
            warn!("Offline persistence disabled, running online-only: {}", e);
            (Arc::new(primary), PersistenceMode::OnlineOnly)
        }
        Err(e @ CacheInitError::Unsupported(_)) => {
            warn!("Offline persistence disabled, running online-only: {}", e);
            (Arc::new(primary), PersistenceMode::OnlineOnly)
        }
        Err(e @ CacheInitError::Other(_)) => {
            error!("Offline persistence failed to initialize, running online-only: {}", e);
            (Arc::new(primary), PersistenceMode::OnlineOnly)
        }
    }
}
