//! Local key-value persistence, the equivalent of browser local storage.
//!
//! Each collection is serialized to a JSON string and written back whole under
//! a fixed key. Keys are suffixed with the user identifier so several users can
//! share one storage file.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::models::user_data::{EmergencyContact, MedicalInfo, UserDocument};
use super::errors::RepositoryError;
use super::user_data::UserDataRepositoryTrait;

/// Storage key for the serialized contact list
pub const EMERGENCY_CONTACTS_KEY: &str = "statresponder_emergency_contacts";

/// Storage key for the serialized medical info record
pub const MEDICAL_INFO_KEY: &str = "statresponder_medical_info";

/// Synchronous string-keyed storage
pub trait KeyValueStorage: Send + Sync + std::fmt::Debug {
    /// Read the value stored under `key`
    fn get_item(&self, key: &str) -> Result<Option<String>, RepositoryError>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<(), RepositoryError>;

    /// Delete the value stored under `key`
    fn remove_item(&self, key: &str) -> Result<(), RepositoryError>;
}

/// Volatile key-value storage
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryKeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.items.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        self.items.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), RepositoryError> {
        self.items.lock()?.remove(key);
        Ok(())
    }
}

/// Key-value storage persisted as a single JSON object on disk.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash never leaves a half-written file behind.
#[derive(Debug)]
pub struct FileKeyValueStorage {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileKeyValueStorage {
    /// Open storage at `path`, creating parent directories as needed
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path, guard: Mutex::new(()) })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, RepositoryError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), RepositoryError> {
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(serde_json::to_string_pretty(items)?.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStorage for FileKeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let _guard = self.guard.lock()?;
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        let _guard = self.guard.lock()?;
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), RepositoryError> {
        let _guard = self.guard.lock()?;
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

/// Repository that serializes whole collections into key-value storage
#[derive(Debug)]
pub struct KeyValueRepository<S: KeyValueStorage> {
    storage: S,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl<S: KeyValueStorage> KeyValueRepository<S> {
    pub fn new(storage: S) -> Self {
        Self { storage, write_lock: Mutex::new(()) }
    }

    /// The underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn contacts_key(user_id: &str) -> String {
        format!("{}:{}", EMERGENCY_CONTACTS_KEY, user_id)
    }

    fn medical_info_key(user_id: &str) -> String {
        format!("{}:{}", MEDICAL_INFO_KEY, user_id)
    }

    fn read_contacts(&self, user_id: &str) -> Result<Vec<EmergencyContact>, RepositoryError> {
        match self.storage.get_item(&Self::contacts_key(user_id))? {
            Some(data) => Ok(serde_json::from_str(&data)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_contacts(&self, user_id: &str, contacts: &[EmergencyContact]) -> Result<(), RepositoryError> {
        let data = serde_json::to_string(contacts)?;
        self.storage.set_item(&Self::contacts_key(user_id), &data)
    }

    fn read_medical_info(&self, user_id: &str) -> Result<Option<MedicalInfo>, RepositoryError> {
        match self.storage.get_item(&Self::medical_info_key(user_id))? {
            Some(data) => Ok(serde_json::from_str(&data)?),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<S: KeyValueStorage> UserDataRepositoryTrait for KeyValueRepository<S> {
    async fn load_or_create(&self, user_id: &str) -> Result<UserDocument, RepositoryError> {
        // Local storage has nothing to create; absent keys read as defaults
        Ok(UserDocument {
            emergency_contacts: self.read_contacts(user_id)?,
            medical_info: self.read_medical_info(user_id)?,
        })
    }

    async fn insert_contact(&self, user_id: &str, contact: &EmergencyContact) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock()?;
        let mut contacts = self.read_contacts(user_id)?;

        if contacts.iter().any(|c| c.id == contact.id) {
            return Err(RepositoryError::Validation(format!("duplicate contact id {}", contact.id)));
        }

        contacts.push(contact.clone());
        debug!("Writing {} contacts to key-value storage", contacts.len());
        self.write_contacts(user_id, &contacts)
    }

    async fn replace_contact(&self, user_id: &str, contact: &EmergencyContact) -> Result<bool, RepositoryError> {
        let _guard = self.write_lock.lock()?;
        let mut contacts = self.read_contacts(user_id)?;

        let Some(existing) = contacts.iter_mut().find(|c| c.id == contact.id) else {
            return Ok(false);
        };
        *existing = contact.clone();

        self.write_contacts(user_id, &contacts)?;
        Ok(true)
    }

    async fn remove_contact(&self, user_id: &str, contact_id: &str) -> Result<bool, RepositoryError> {
        let _guard = self.write_lock.lock()?;
        let mut contacts = self.read_contacts(user_id)?;

        let before = contacts.len();
        contacts.retain(|c| c.id != contact_id);
        if contacts.len() == before {
            return Ok(false);
        }

        self.write_contacts(user_id, &contacts)?;
        Ok(true)
    }

    async fn save_medical_info(&self, user_id: &str, info: &MedicalInfo) -> Result<(), RepositoryError> {
        let data = serde_json::to_string(info)?;
        self.storage.set_item(&Self::medical_info_key(user_id), &data)
    }

    fn backend_name(&self) -> &'static str {
        "key-value"
    }
}
