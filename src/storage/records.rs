// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Encrypted record store.
//!
//! Typed CRUD over the fixed collections. Every write seals the record under
//! the session key before it reaches redb; every read opens it again. A store
//! without a key (before login) rejects every operation with
//! `NotAuthenticated` instead of returning empty data.

use std::sync::Arc;

use crate::crypto::{self, CryptoError, Envelope, SessionKey};
use crate::error::{GradebookError, Result};

use super::collections::{Collection, Record};
use super::database::{StorageError, VaultDatabase};

/// Record store handle, locked or bound to one session key.
pub struct RecordStore {
    db: Arc<VaultDatabase>,
    key: Option<SessionKey>,
}

impl RecordStore {
    pub(crate) fn locked(db: Arc<VaultDatabase>) -> Self {
        Self { db, key: None }
    }

    pub(crate) fn unlocked(db: Arc<VaultDatabase>, key: SessionKey) -> Self {
        Self { db, key: Some(key) }
    }

    /// Whether a session key is present.
    pub fn is_unlocked(&self) -> bool {
        self.key.is_some()
    }

    fn session_key(&self) -> Result<&SessionKey> {
        self.key.as_ref().ok_or(GradebookError::NotAuthenticated)
    }

    /// Encrypt and store `record`, replacing any entry under the same key.
    pub fn put<R: Record>(&self, record: &R) -> Result<()> {
        let key = self.session_key()?;
        let collection = R::COLLECTION;
        let id = record.storage_key();

        let envelope = crypto::encrypt(key, record, &collection.binding(id))?;
        let bytes = serde_json::to_vec(&envelope).map_err(StorageError::from)?;
        self.db.put_entry(collection, id, &bytes)?;

        tracing::debug!(collection = %collection, key = %id, "Record stored");
        Ok(())
    }

    /// Fetch and decrypt one record. `Ok(None)` if absent.
    pub fn get<R: Record>(&self, id: &str) -> Result<Option<R>> {
        let key = self.session_key()?;
        let collection = R::COLLECTION;

        match self.db.get_entry(collection, id)? {
            Some(bytes) => {
                tracing::debug!(collection = %collection, key = %id, "Record loaded");
                open(key, collection, id, &bytes).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Fetch and decrypt every record of the collection.
    ///
    /// Order is unspecified; callers sort as they need. One unreadable record
    /// fails the whole call.
    pub fn all<R: Record>(&self) -> Result<Vec<R>> {
        let key = self.session_key()?;
        let collection = R::COLLECTION;

        let entries = self.db.all_entries(collection)?;
        let mut records = Vec::with_capacity(entries.len());
        for (id, bytes) in &entries {
            records.push(open(key, collection, id, bytes)?);
        }

        tracing::debug!(collection = %collection, count = records.len(), "Collection loaded");
        Ok(records)
    }

    /// Remove a record. Returns whether it existed.
    pub fn delete<R: Record>(&self, id: &str) -> Result<bool> {
        self.session_key()?;
        let collection = R::COLLECTION;

        let existed = self.db.remove_entry(collection, id)?;
        tracing::debug!(collection = %collection, key = %id, existed, "Record deleted");
        Ok(existed)
    }

    /// Number of records in the collection.
    pub fn count<R: Record>(&self) -> Result<u64> {
        self.session_key()?;
        Ok(self.db.count_entries(R::COLLECTION)?)
    }
}

fn open<R: Record>(key: &SessionKey, collection: Collection, id: &str, bytes: &[u8]) -> Result<R> {
    let envelope: Envelope = serde_json::from_slice(bytes).map_err(StorageError::from)?;
    crypto::decrypt(key, &envelope, &collection.binding(id)).map_err(|e| match e {
        CryptoError::Decryption => {
            tracing::warn!(collection = %collection, key = %id, "Record failed authentication");
            GradebookError::Decryption {
                collection,
                key: id.to_string(),
            }
        }
        other => other.into(),
    })
}
