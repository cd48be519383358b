//! The user data store: single source of truth for emergency contacts and
//! medical info.
//!
//! Every mutation is applied to the in-memory state first and then written to
//! the backing repository. A failed write is never silent: the caller gets
//! [`StoreError::Persistence`] carrying a [`Rollback`] token, and the store
//! reports [`SyncState::Pending`] until the change is rolled back or retried.
//!
//! Mutations are serialized: the in-memory change and its write happen under
//! one lock, so storage sees writes in the same order as memory. Each record
//! has at most one pending change, whose undo holds the record's last durable
//! value; a later successful write of the record settles it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use stat_responder_data::repository::{PersistenceMode, RepositoryError, UserDataRepositoryTrait};
use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::entities::conversions;
use crate::entities::user_data::describe_validation_errors;
use crate::entities::{EmergencyContact, MedicalInfo, NewEmergencyContact, UserDataSnapshot, UserId};

/// User data store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input rejected before anything changed
    #[error("Validation error: {0}")]
    Validation(String),

    /// The in-memory change was applied but could not be written durably
    #[error("Failed to persist change: {message}")]
    Persistence { message: String, rollback: Rollback },

    /// Mutations are refused until the first load has completed
    #[error("User data has not been loaded yet")]
    NotLoaded,

    /// The backing store could not be read
    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// The rollback token of a persistence failure
    pub fn rollback(&self) -> Option<&Rollback> {
        match self {
            StoreError::Persistence { rollback, .. } => Some(rollback),
            _ => None,
        }
    }
}

/// Whether the in-memory view matches durable storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Everything in memory has been persisted
    Durable,
    /// This many changes failed to persist and are still applied in memory
    Pending(usize),
}

/// Handle for undoing a change whose write failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rollback {
    id: u64,
    undo: Undo,
}

impl Rollback {
    /// Identifier of the pending change
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Previous state of the record a mutation touched
#[derive(Debug, Clone, PartialEq, Eq)]
enum Undo {
    RemoveAdded(String),
    RestoreUpdated(EmergencyContact),
    ReinsertDeleted { index: usize, contact: EmergencyContact },
    RestoreMedicalInfo(Option<MedicalInfo>),
}

/// The record a mutation writes
#[derive(Debug, Clone, PartialEq, Eq)]
enum Record {
    Contact(String),
    MedicalInfo,
}

impl Undo {
    fn record(&self) -> Record {
        match self {
            Undo::RemoveAdded(id) => Record::Contact(id.clone()),
            Undo::RestoreUpdated(contact) => Record::Contact(contact.id.clone()),
            Undo::ReinsertDeleted { contact, .. } => Record::Contact(contact.id.clone()),
            Undo::RestoreMedicalInfo(_) => Record::MedicalInfo,
        }
    }

    /// Combine this undo, which holds the record's durable value, with the
    /// undo of a newer failed write, which tells whether the record is still
    /// in memory.
    fn superseded_by(self, newer: Undo) -> Undo {
        match (self, newer) {
            (Undo::RestoreMedicalInfo(durable), _) => Undo::RestoreMedicalInfo(durable),
            // Never stored, so undoing means making sure it is gone
            (Undo::RemoveAdded(id), _) => Undo::RemoveAdded(id),
            (
                Undo::RestoreUpdated(durable) | Undo::ReinsertDeleted { contact: durable, .. },
                Undo::ReinsertDeleted { index, .. },
            ) => Undo::ReinsertDeleted { index, contact: durable },
            (Undo::RestoreUpdated(durable) | Undo::ReinsertDeleted { contact: durable, .. }, _) => {
                Undo::RestoreUpdated(durable)
            }
        }
    }
}

/// Millisecond timestamp ids that never repeat within a process
#[derive(Debug, Default)]
pub struct TimestampIdGenerator {
    last: AtomicU64,
}

impl TimestampIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current wall-clock milliseconds, bumped past the previous id if needed
    pub fn next_id(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut last = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(last + 1);
            match self.last.compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    contacts: Vec<EmergencyContact>,
    medical_info: Option<MedicalInfo>,
    // Changes whose write failed, keyed by rollback id
    pending: BTreeMap<u64, Undo>,
}

impl StoreState {
    fn contact_index(&self, id: &str) -> Option<usize> {
        self.contacts.iter().position(|c| c.id == id)
    }

    fn snapshot(&self) -> UserDataSnapshot {
        UserDataSnapshot {
            emergency_contacts: self.contacts.clone(),
            medical_info: self.medical_info.clone(),
        }
    }

    fn sync_state(&self) -> SyncState {
        if self.pending.is_empty() {
            SyncState::Durable
        } else {
            SyncState::Pending(self.pending.len())
        }
    }

    /// Storage now holds the in-memory value of `record`
    fn settle(&mut self, record: &Record) {
        self.pending.retain(|_, undo| undo.record() != *record);
    }

    /// Register a failed write. An older pending change of the same record
    /// already knows the last durable value, so it is re-keyed instead.
    fn register_failure(&mut self, id: u64, undo: Undo) -> Undo {
        let record = undo.record();
        let earlier = self
            .pending
            .iter()
            .find(|(_, pending)| pending.record() == record)
            .map(|(earlier_id, _)| *earlier_id);

        let undo = match earlier.and_then(|earlier_id| self.pending.remove(&earlier_id)) {
            Some(durable) => durable.superseded_by(undo),
            None => undo,
        };
        self.pending.insert(id, undo.clone());
        undo
    }

    fn apply_undo(&mut self, undo: Undo) {
        match undo {
            Undo::RemoveAdded(id) => self.contacts.retain(|c| c.id != id),
            Undo::RestoreUpdated(previous) => {
                if let Some(index) = self.contact_index(&previous.id) {
                    self.contacts[index] = previous;
                }
            }
            Undo::ReinsertDeleted { index, contact } => {
                if self.contact_index(&contact.id).is_none() {
                    let index = index.min(self.contacts.len());
                    self.contacts.insert(index, contact);
                }
            }
            Undo::RestoreMedicalInfo(previous) => self.medical_info = previous,
        }
    }
}

/// Trait for user data operations
#[async_trait]
pub trait UserDataServiceTrait: Send + Sync {
    /// Fetch contacts and medical info from the backing store. Completes the
    /// loading state on first success; later calls return the in-memory view.
    async fn load(&self) -> Result<UserDataSnapshot, StoreError>;

    /// Add a contact with a freshly generated id
    async fn add_contact(&self, contact: NewEmergencyContact) -> Result<EmergencyContact, StoreError>;

    /// Replace the contact with the same id. Returns false if there is none.
    async fn update_contact(&self, contact: EmergencyContact) -> Result<bool, StoreError>;

    /// Remove the contact with the given id. Returns false if there is none.
    async fn delete_contact(&self, id: &str) -> Result<bool, StoreError>;

    /// Replace the medical info record wholesale
    async fn update_medical_info(&self, info: MedicalInfo) -> Result<MedicalInfo, StoreError>;

    /// Undo a change whose write failed. Returns false if the token is no longer pending.
    async fn rollback(&self, token: &Rollback) -> bool;

    /// Write the current state of a pending change again
    async fn retry(&self, token: &Rollback) -> Result<bool, StoreError>;

    /// Consistent copy of the in-memory state
    async fn snapshot(&self) -> UserDataSnapshot;

    async fn sync_state(&self) -> SyncState;

    /// True until the first successful load
    fn is_loading(&self) -> bool;

    /// Resolve once the first load has completed
    async fn wait_until_loaded(&self);

    /// Identity this store is scoped to
    fn user_id(&self) -> &UserId;

    /// Backend name and offline capability, for health reporting
    fn backend_info(&self) -> (&'static str, PersistenceMode);
}

/// User data store over a pluggable repository
pub struct UserDataStore {
    repository: Arc<dyn UserDataRepositoryTrait>,
    user_id: UserId,
    mode: PersistenceMode,
    state: RwLock<StoreState>,
    // Held from the in-memory change until its write completes
    writes: Mutex<()>,
    loading: watch::Sender<bool>,
    ids: TimestampIdGenerator,
    rollback_ids: AtomicU64,
}

impl std::fmt::Debug for UserDataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDataStore")
            .field("backend", &self.repository.backend_name())
            .field("user_id", &self.user_id)
            .field("mode", &self.mode)
            .finish()
    }
}

impl UserDataStore {
    /// Create a store for `user_id`. Nothing is read until [`load`](UserDataServiceTrait::load).
    pub fn new(repository: Arc<dyn UserDataRepositoryTrait>, user_id: UserId) -> Self {
        let (loading, _) = watch::channel(true);
        Self {
            repository,
            user_id,
            mode: PersistenceMode::OnlineOnly,
            state: RwLock::new(StoreState::default()),
            writes: Mutex::new(()),
            loading,
            ids: TimestampIdGenerator::new(),
            rollback_ids: AtomicU64::new(1),
        }
    }

    /// Record whether the repository can serve reads offline
    pub fn with_persistence_mode(mut self, mode: PersistenceMode) -> Self {
        self.mode = mode;
        self
    }

    fn loading_now(&self) -> bool {
        *self.loading.borrow()
    }

    fn ensure_loaded(&self) -> Result<(), StoreError> {
        if self.loading_now() {
            return Err(StoreError::NotLoaded);
        }
        Ok(())
    }

    /// Register a failed write and build the error handed to the caller
    async fn record_failure(&self, err: RepositoryError, undo: Undo) -> StoreError {
        let id = self.rollback_ids.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.write().await;
        let undo = state.register_failure(id, undo);
        let rollback = Rollback { id, undo };
        warn!(
            "Write for user {} failed, {} change(s) pending: {}",
            self.user_id,
            state.pending.len(),
            err
        );

        StoreError::Persistence { message: err.to_string(), rollback }
    }

    /// Mark `record` durable after a successful write
    async fn record_success(&self, record: Record) {
        let mut state = self.state.write().await;
        let before = state.pending.len();
        state.settle(&record);
        if state.pending.len() < before {
            debug!("Write of {:?} superseded {} pending change(s)", record, before - state.pending.len());
        }
    }

    async fn persist_contact_upsert(&self, contact: &EmergencyContact) -> Result<(), RepositoryError> {
        let data_contact = conversions::convert_to_data_contact(contact);
        let user = self.user_id.as_str();
        if !self.repository.replace_contact(user, &data_contact).await? {
            debug!("Contact {} missing from backend, inserting", contact.id);
            self.repository.insert_contact(user, &data_contact).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserDataServiceTrait for UserDataStore {
    async fn load(&self) -> Result<UserDataSnapshot, StoreError> {
        if !self.loading_now() {
            return Ok(self.snapshot().await);
        }

        let document = self
            .repository
            .load_or_create(self.user_id.as_str())
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let loaded = conversions::convert_to_domain_snapshot(document);

        let mut state = self.state.write().await;
        // Another caller may have finished loading while we were reading
        if self.loading_now() {
            state.contacts = loaded.emergency_contacts;
            state.medical_info = loaded.medical_info;
            self.loading.send_replace(false);
            info!(
                "Loaded {} contacts for user {} from {} backend",
                state.contacts.len(),
                self.user_id,
                self.repository.backend_name()
            );
        }

        Ok(state.snapshot())
    }

    async fn add_contact(&self, contact: NewEmergencyContact) -> Result<EmergencyContact, StoreError> {
        contact
            .validate()
            .map_err(|e| StoreError::Validation(describe_validation_errors(&e)))?;
        self.ensure_loaded()?;
        let _writing = self.writes.lock().await;

        let created = {
            let mut state = self.state.write().await;
            let mut id = self.ids.next_id();
            while state.contact_index(&id.to_string()).is_some() {
                id = self.ids.next_id();
            }
            let created = contact.with_id(id.to_string());
            state.contacts.push(created.clone());
            created
        };

        debug!("Persisting new contact {}", created.id);
        let data_contact = conversions::convert_to_data_contact(&created);
        if let Err(e) = self.repository.insert_contact(self.user_id.as_str(), &data_contact).await {
            return Err(self.record_failure(e, Undo::RemoveAdded(created.id.clone())).await);
        }

        self.record_success(Record::Contact(created.id.clone())).await;
        Ok(created)
    }

    async fn update_contact(&self, contact: EmergencyContact) -> Result<bool, StoreError> {
        contact
            .validate()
            .map_err(|e| StoreError::Validation(describe_validation_errors(&e)))?;
        self.ensure_loaded()?;
        let _writing = self.writes.lock().await;

        let previous = {
            let mut state = self.state.write().await;
            let Some(index) = state.contact_index(&contact.id) else {
                debug!("Update for unknown contact {} ignored", contact.id);
                return Ok(false);
            };
            std::mem::replace(&mut state.contacts[index], contact.clone())
        };

        if let Err(e) = self.persist_contact_upsert(&contact).await {
            return Err(self.record_failure(e, Undo::RestoreUpdated(previous)).await);
        }

        self.record_success(Record::Contact(contact.id.clone())).await;
        Ok(true)
    }

    async fn delete_contact(&self, id: &str) -> Result<bool, StoreError> {
        self.ensure_loaded()?;
        let _writing = self.writes.lock().await;

        let (index, removed) = {
            let mut state = self.state.write().await;
            let Some(index) = state.contact_index(id) else {
                debug!("Delete for unknown contact {} ignored", id);
                return Ok(false);
            };
            (index, state.contacts.remove(index))
        };

        match self.repository.remove_contact(self.user_id.as_str(), id).await {
            Ok(removed) => {
                if !removed {
                    debug!("Contact {} was already absent from backend", id);
                }
                self.record_success(Record::Contact(id.to_string())).await;
                Ok(true)
            }
            Err(e) => Err(self
                .record_failure(e, Undo::ReinsertDeleted { index, contact: removed })
                .await),
        }
    }

    async fn update_medical_info(&self, info: MedicalInfo) -> Result<MedicalInfo, StoreError> {
        self.ensure_loaded()?;
        let _writing = self.writes.lock().await;

        let previous = {
            let mut state = self.state.write().await;
            state.medical_info.replace(info.clone())
        };

        let data_info = conversions::convert_to_data_medical_info(&info);
        if let Err(e) = self.repository.save_medical_info(self.user_id.as_str(), &data_info).await {
            return Err(self.record_failure(e, Undo::RestoreMedicalInfo(previous)).await);
        }

        self.record_success(Record::MedicalInfo).await;
        Ok(info)
    }

    async fn rollback(&self, token: &Rollback) -> bool {
        let _writing = self.writes.lock().await;
        let mut state = self.state.write().await;
        let Some(undo) = state.pending.remove(&token.id) else {
            return false;
        };

        state.apply_undo(undo);
        info!("Rolled back pending change {} for user {}", token.id, self.user_id);
        true
    }

    async fn retry(&self, token: &Rollback) -> Result<bool, StoreError> {
        let _writing = self.writes.lock().await;

        // Re-send whatever the record looks like now
        let (undo, current_contact, current_info) = {
            let state = self.state.read().await;
            let Some(undo) = state.pending.get(&token.id).cloned() else {
                return Ok(false);
            };
            let contact_id = match undo.record() {
                Record::Contact(id) => Some(id),
                Record::MedicalInfo => None,
            };
            let current_contact = contact_id
                .and_then(|id| state.contact_index(&id))
                .map(|index| state.contacts[index].clone());
            (undo, current_contact, state.medical_info.clone())
        };

        let user = self.user_id.as_str();
        let record = undo.record();
        let result = match (&undo, current_contact) {
            (Undo::RestoreMedicalInfo(_), _) => match current_info {
                Some(info) => self
                    .repository
                    .save_medical_info(user, &conversions::convert_to_data_medical_info(&info))
                    .await,
                None => Ok(()),
            },
            (_, Some(contact)) => self.persist_contact_upsert(&contact).await,
            (Undo::ReinsertDeleted { contact, .. }, None) => {
                self.repository.remove_contact(user, &contact.id).await.map(|_| ())
            }
            (_, None) => Ok(()),
        };

        match result {
            Ok(()) => {
                self.state.write().await.settle(&record);
                info!("Pending change {} for user {} is now durable", token.id, self.user_id);
                Ok(true)
            }
            Err(e) => {
                warn!("Retry of pending change {} failed: {}", token.id, e);
                Err(StoreError::Persistence { message: e.to_string(), rollback: token.clone() })
            }
        }
    }

    async fn snapshot(&self) -> UserDataSnapshot {
        self.state.read().await.snapshot()
    }

    async fn sync_state(&self) -> SyncState {
        self.state.read().await.sync_state()
    }

    fn is_loading(&self) -> bool {
        self.loading_now()
    }

    async fn wait_until_loaded(&self) {
        let mut rx = self.loading.subscribe();
        // The sender lives as long as the store, so this only ends on `false`
        let _ = rx.wait_for(|loading| !*loading).await;
    }

    fn user_id(&self) -> &UserId {
        &self.user_id
    }

    fn backend_info(&self) -> (&'static str, PersistenceMode) {
        (self.repository.backend_name(), self.mode)
    }
}

/// Create a user data store over the given repository
pub fn create_user_data_store(
    repository: Arc<dyn UserDataRepositoryTrait>,
    user_id: UserId,
    mode: PersistenceMode,
) -> Arc<dyn UserDataServiceTrait> {
    Arc::new(UserDataStore::new(repository, user_id).with_persistence_mode(mode))
}

/// Create a volatile store, used when no durable backend is configured
pub fn create_in_memory_user_data_store(user_id: UserId) -> Arc<dyn UserDataServiceTrait> {
    let repository = Arc::new(stat_responder_data::repository::InMemoryRepository::new());
    create_user_data_store(repository, user_id, PersistenceMode::OnlineOnly)
}
