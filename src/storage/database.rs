// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded vault database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `credential`: `"me"` → plaintext credential JSON (salt, iterations, verifier)
//! - `settings`, `classes`, `students`, `contributions`, `seat_plans`:
//!   plaintext id → envelope JSON (`{iv, ciphertext}`)
//!
//! This layer moves opaque bytes only. It never sees plaintext records or keys.
//! Every mutation runs in its own write transaction and is durable once
//! `commit()` returns; a crash before that leaves the previous value intact.

use std::path::Path;

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};

use super::collections::Collection;

// =============================================================================
// Table Definitions
// =============================================================================

/// Credential table: fixed id → serialized credential (JSON bytes).
const CREDENTIAL: TableDefinition<&str, &[u8]> = TableDefinition::new("credential");

type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;

const fn record_table(collection: Collection) -> RecordTable {
    TableDefinition::new(collection.name())
}

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Stored bytes are structurally invalid (not a tampering verdict).
    #[error("corrupt entry: {0}")]
    Corrupt(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// VaultDatabase
// =============================================================================

/// Embedded ACID store for the credential and all encrypted collections.
pub struct VaultDatabase {
    db: Database,
}

impl VaultDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CREDENTIAL)?;
            for collection in Collection::ALL {
                let _ = write_txn.open_table(record_table(collection))?;
            }
        }
        write_txn.commit()?;

        tracing::debug!(path = %path.display(), "Vault database opened");
        Ok(Self { db })
    }

    // =========================================================================
    // Credential
    // =========================================================================

    /// Read the raw credential entry, if any.
    pub fn read_credential(&self, id: &str) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CREDENTIAL)?;
        Ok(table.get(id)?.map(|v| v.value().to_vec()))
    }

    /// Insert the credential unless one already exists.
    ///
    /// The existence check and the insert share one write transaction, so two
    /// racing account creations cannot both succeed. Returns `false` when a
    /// credential was already present (nothing is written).
    pub fn insert_credential_if_absent(&self, id: &str, value: &[u8]) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        let inserted = {
            let mut table = write_txn.open_table(CREDENTIAL)?;
            if table.is_empty()? {
                table.insert(id, value)?;
                true
            } else {
                false
            }
        };
        if inserted {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(inserted)
    }

    // =========================================================================
    // Encrypted Records
    // =========================================================================

    /// Insert or overwrite one entry.
    pub fn put_entry(&self, collection: Collection, key: &str, value: &[u8]) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(record_table(collection))?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up a single entry by key.
    pub fn get_entry(&self, collection: Collection, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(record_table(collection))?;
        Ok(table.get(key)?.map(|v| v.value().to_vec()))
    }

    /// All `(key, value)` pairs of a collection, in key order.
    pub fn all_entries(&self, collection: Collection) -> StorageResult<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(record_table(collection))?;

        let mut entries = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            entries.push((key.value().to_string(), value.value().to_vec()));
        }
        Ok(entries)
    }

    /// Remove one entry. Returns whether it existed.
    pub fn remove_entry(&self, collection: Collection, key: &str) -> StorageResult<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(record_table(collection))?;
            let removed = table.remove(key)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(existed)
    }

    /// Number of entries in a collection.
    pub fn count_entries(&self, collection: Collection) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(record_table(collection))?;
        Ok(table.len()?)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (VaultDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = VaultDatabase::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    #[test]
    fn put_and_get_entry() {
        let (db, _dir) = temp_db();
        db.put_entry(Collection::Students, "s1", b"blob-1").unwrap();

        let value = db.get_entry(Collection::Students, "s1").unwrap();
        assert_eq!(value.as_deref(), Some(&b"blob-1"[..]));
        assert!(db.get_entry(Collection::Students, "s2").unwrap().is_none());
    }

    #[test]
    fn collections_are_isolated() {
        let (db, _dir) = temp_db();
        db.put_entry(Collection::Classes, "c1", b"class").unwrap();

        assert!(db.get_entry(Collection::SeatPlans, "c1").unwrap().is_none());
        assert_eq!(db.count_entries(Collection::Classes).unwrap(), 1);
        assert_eq!(db.count_entries(Collection::SeatPlans).unwrap(), 0);
    }

    #[test]
    fn put_overwrites_existing_entry() {
        let (db, _dir) = temp_db();
        db.put_entry(Collection::Settings, "settings", b"old").unwrap();
        db.put_entry(Collection::Settings, "settings", b"new").unwrap();

        let all = db.all_entries(Collection::Settings).unwrap();
        assert_eq!(all, vec![("settings".to_string(), b"new".to_vec())]);
    }

    #[test]
    fn remove_reports_existence() {
        let (db, _dir) = temp_db();
        db.put_entry(Collection::Contributions, "k1", b"x").unwrap();

        assert!(db.remove_entry(Collection::Contributions, "k1").unwrap());
        assert!(!db.remove_entry(Collection::Contributions, "k1").unwrap());
        assert_eq!(db.count_entries(Collection::Contributions).unwrap(), 0);
    }

    #[test]
    fn credential_is_written_once() {
        let (db, _dir) = temp_db();
        assert!(db.read_credential("me").unwrap().is_none());

        assert!(db.insert_credential_if_absent("me", b"first").unwrap());
        assert!(!db.insert_credential_if_absent("me", b"second").unwrap());

        assert_eq!(db.read_credential("me").unwrap(), Some(b"first".to_vec()));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vault.redb");
        {
            let db = VaultDatabase::open(&path).unwrap();
            db.put_entry(Collection::Students, "s1", b"persisted").unwrap();
        }
        let db = VaultDatabase::open(&path).unwrap();
        assert_eq!(
            db.get_entry(Collection::Students, "s1").unwrap(),
            Some(b"persisted".to_vec())
        );
    }
}
