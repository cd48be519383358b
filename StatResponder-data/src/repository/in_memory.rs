use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::models::user_data::{EmergencyContact, MedicalInfo, UserDocument};
use super::errors::RepositoryError;
use super::user_data::UserDataRepositoryTrait;

/// In-memory storage of user documents, used when no durable backend is configured
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    documents: Arc<Mutex<HashMap<String, UserDocument>>>,
}

impl InMemoryRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a user's document without creating it
    pub fn snapshot(&self, user_id: &str) -> Result<Option<UserDocument>, RepositoryError> {
        let store = self.documents.lock()?;
        Ok(store.get(user_id).cloned())
    }
}

#[async_trait]
impl UserDataRepositoryTrait for InMemoryRepository {
    async fn load_or_create(&self, user_id: &str) -> Result<UserDocument, RepositoryError> {
        let mut store = self.documents.lock()?;
        Ok(store.entry(user_id.to_string()).or_default().clone())
    }

    async fn insert_contact(&self, user_id: &str, contact: &EmergencyContact) -> Result<(), RepositoryError> {
        let mut store = self.documents.lock()?;
        let doc = store.entry(user_id.to_string()).or_default();

        if doc.contact_index(&contact.id).is_some() {
            return Err(RepositoryError::Validation(format!("duplicate contact id {}", contact.id)));
        }

        doc.emergency_contacts.push(contact.clone());
        Ok(())
    }

    async fn replace_contact(&self, user_id: &str, contact: &EmergencyContact) -> Result<bool, RepositoryError> {
        let mut store = self.documents.lock()?;
        let Some(doc) = store.get_mut(user_id) else {
            return Ok(false);
        };

        match doc.contact_index(&contact.id) {
            Some(index) => {
                doc.emergency_contacts[index] = contact.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_contact(&self, user_id: &str, contact_id: &str) -> Result<bool, RepositoryError> {
        let mut store = self.documents.lock()?;
        let Some(doc) = store.get_mut(user_id) else {
            return Ok(false);
        };

        match doc.contact_index(contact_id) {
            Some(index) => {
                doc.emergency_contacts.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save_medical_info(&self, user_id: &str, info: &MedicalInfo) -> Result<(), RepositoryError> {
        let mut store = self.documents.lock()?;
        store.entry(user_id.to_string()).or_default().medical_info = Some(info.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
