use async_trait::async_trait;

use crate::models::user_data::{EmergencyContact, MedicalInfo, UserDocument};
use super::errors::RepositoryError;

/// Repository trait for a user's emergency data.
///
/// Every operation is scoped by an explicit user identifier. Contacts are
/// addressed individually so that implementations can apply targeted
/// upserts and deletes instead of rewriting the whole collection.
#[async_trait]
pub trait UserDataRepositoryTrait: Send + Sync + std::fmt::Debug {
    /// Load the user's document. Document stores create an empty record on first access.
    async fn load_or_create(&self, user_id: &str) -> Result<UserDocument, RepositoryError>;

    /// Append a new contact to the end of the user's list
    async fn insert_contact(&self, user_id: &str, contact: &EmergencyContact) -> Result<(), RepositoryError>;

    /// Replace the contact with the same id. Returns false if no such contact exists.
    async fn replace_contact(&self, user_id: &str, contact: &EmergencyContact) -> Result<bool, RepositoryError>;

    /// Remove the contact with the given id. Returns false if no such contact exists.
    async fn remove_contact(&self, user_id: &str, contact_id: &str) -> Result<bool, RepositoryError>;

    /// Replace the medical info record wholesale
    async fn save_medical_info(&self, user_id: &str, info: &MedicalInfo) -> Result<(), RepositoryError>;

    /// Short name of the backend for logs and health reports
    fn backend_name(&self) -> &'static str;
}

/// Test doubles for the repository layer
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::repository::in_memory::InMemoryRepository;

    /// In-memory repository whose reads and writes can be switched to fail
    #[derive(Debug, Clone, Default)]
    pub struct FailingRepository {
        inner: InMemoryRepository,
        fail_reads: Arc<AtomicBool>,
        fail_writes: Arc<AtomicBool>,
        writes: Arc<AtomicUsize>,
    }

    impl FailingRepository {
        /// Create a repository that behaves normally until told otherwise
        pub fn new() -> Self {
            Self::default()
        }

        /// Make subsequent loads fail
        pub fn set_fail_reads(&self, fail: bool) {
            self.fail_reads.store(fail, Ordering::SeqCst);
        }

        /// Make subsequent writes fail
        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Number of successful writes so far
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// The underlying storage, for inspecting what was durably written
        pub fn inner(&self) -> &InMemoryRepository {
            &self.inner
        }

        fn check_write(&self) -> Result<(), RepositoryError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(RepositoryError::Unavailable("write rejected by test repository".to_string()));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl UserDataRepositoryTrait for FailingRepository {
        async fn load_or_create(&self, user_id: &str) -> Result<UserDocument, RepositoryError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(RepositoryError::Unavailable("read rejected by test repository".to_string()));
            }
            self.inner.load_or_create(user_id).await
        }

        async fn insert_contact(&self, user_id: &str, contact: &EmergencyContact) -> Result<(), RepositoryError> {
            self.check_write()?;
            self.inner.insert_contact(user_id, contact).await
        }

        async fn replace_contact(&self, user_id: &str, contact: &EmergencyContact) -> Result<bool, RepositoryError> {
            self.check_write()?;
            self.inner.replace_contact(user_id, contact).await
        }

        async fn remove_contact(&self, user_id: &str, contact_id: &str) -> Result<bool, RepositoryError> {
            self.check_write()?;
            self.inner.remove_contact(user_id, contact_id).await
        }

        async fn save_medical_info(&self, user_id: &str, info: &MedicalInfo) -> Result<(), RepositoryError> {
            self.check_write()?;
            self.inner.save_medical_info(user_id, info).await
        }

        fn backend_name(&self) -> &'static str {
            "failing-test"
        }
    }
}
