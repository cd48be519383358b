//! Hosted document store backed by SQLite.
//!
//! One row in `users` per user holds the medical info as JSON. Contacts live
//! in a keyed sub-collection so each mutation touches exactly one row.
//! Contact writes also bump the user's `updated_at`; both statements commit
//! together or not at all.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::user_data::{EmergencyContact, MedicalInfo, UserDocument};
use super::errors::RepositoryError;
use super::user_data::UserDataRepositoryTrait;

/// SQLite implementation of the user data repository
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    pool: DatabasePool,
}

impl SqliteDocumentStore {
    /// Create a store over an already migrated pool
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// The pool this store writes to
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

fn ensure_user(conn: &rusqlite::Connection, user_id: &str) -> Result<(), RepositoryError> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR IGNORE INTO users (user_id, medical_info, created_at, updated_at)
         VALUES (?1, NULL, ?2, ?2)",
        params![user_id, now],
    )?;
    Ok(())
}

fn touch_user(conn: &rusqlite::Connection, user_id: &str) -> Result<(), RepositoryError> {
    conn.execute(
        "UPDATE users SET updated_at = ?2 WHERE user_id = ?1",
        params![user_id, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

#[async_trait]
impl UserDataRepositoryTrait for SqliteDocumentStore {
    async fn load_or_create(&self, user_id: &str) -> Result<UserDocument, RepositoryError> {
        let conn = self.pool.get()?;
        ensure_user(&conn, user_id)?;

        let medical_json: Option<String> = conn
            .query_row(
                "SELECT medical_info FROM users WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();

        let medical_info = match medical_json {
            Some(json) => Some(serde_json::from_str::<MedicalInfo>(&json)?),
            None => None,
        };

        let mut stmt = conn.prepare(
            "SELECT id, name, relationship, phone_number
             FROM emergency_contacts
             WHERE user_id = ?1
             ORDER BY position ASC",
        )?;

        let emergency_contacts = stmt
            .query_map(params![user_id], |row| {
                Ok(EmergencyContact {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    relationship: row.get(2)?,
                    phone_number: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Loaded {} contacts for user {}", emergency_contacts.len(), user_id);

        Ok(UserDocument { emergency_contacts, medical_info })
    }

    async fn insert_contact(&self, user_id: &str, contact: &EmergencyContact) -> Result<(), RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        ensure_user(&tx, user_id)?;

        let result = tx.execute(
            "INSERT INTO emergency_contacts (user_id, id, name, relationship, phone_number, position)
             VALUES (?1, ?2, ?3, ?4, ?5,
                     (SELECT COALESCE(MAX(position), -1) + 1 FROM emergency_contacts WHERE user_id = ?1))",
            params![
                user_id,
                contact.id,
                contact.name,
                contact.relationship,
                contact.phone_number,
            ],
        );

        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(RepositoryError::Validation(format!("duplicate contact id {}", contact.id)));
            }
            Err(e) => return Err(e.into()),
        }

        touch_user(&tx, user_id)?;
        tx.commit()?;
        Ok(())
    }

    async fn replace_contact(&self, user_id: &str, contact: &EmergencyContact) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let rows = tx.execute(
            "UPDATE emergency_contacts
             SET name = ?3, relationship = ?4, phone_number = ?5
             WHERE user_id = ?1 AND id = ?2",
            params![
                user_id,
                contact.id,
                contact.name,
                contact.relationship,
                contact.phone_number,
            ],
        )?;

        if rows > 0 {
            touch_user(&tx, user_id)?;
        }
        tx.commit()?;
        Ok(rows > 0)
    }

    async fn remove_contact(&self, user_id: &str, contact_id: &str) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let rows = tx.execute(
            "DELETE FROM emergency_contacts WHERE user_id = ?1 AND id = ?2",
            params![user_id, contact_id],
        )?;

        if rows > 0 {
            touch_user(&tx, user_id)?;
        }
        tx.commit()?;
        Ok(rows > 0)
    }

    async fn save_medical_info(&self, user_id: &str, info: &MedicalInfo) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let json = serde_json::to_string(info)?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO users (user_id, medical_info, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(user_id) DO UPDATE SET medical_info = excluded.medical_info,
                                                updated_at = excluded.updated_at",
            params![user_id, json, now],
        )?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
