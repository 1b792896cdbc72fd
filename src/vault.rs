// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Vault & Sessions
//!
//! [`Vault`] owns the open database and hands out [`Session`]s. A session is
//! the only way to obtain an unlocked [`RecordStore`]: the key lives inside it
//! and is dropped with it. There is no process-wide key.
//!
//! ```text
//! Vault::open ──► create_user / login ──► Session ──► store().put / get / all
//!                                              │
//!                                              └─ close() drops the key
//! ```

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};

use crate::config::AppConfig;
use crate::crypto::KdfParams;
use crate::error::Result;
use crate::models::{Settings, SETTINGS_ID};
use crate::storage::{CredentialState, CredentialStore, RecordStore, UnlockedUser, VaultDatabase};

/// An opened gradebook database.
pub struct Vault {
    db: Arc<VaultDatabase>,
    params: KdfParams,
}

impl Vault {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path, params: KdfParams) -> Result<Self> {
        let db = VaultDatabase::open(path)?;
        tracing::info!(path = %path.display(), "Vault opened");
        Ok(Self {
            db: Arc::new(db),
            params,
        })
    }

    /// Open the database named by the runtime config.
    pub fn open_with_config(config: &AppConfig) -> Result<Self> {
        Self::open(&config.paths.database_file(), config.kdf)
    }

    /// Whether the account has been created.
    pub fn state(&self) -> Result<CredentialState> {
        self.credentials().state()
    }

    /// Create the one account and start a session for it.
    ///
    /// Default settings are written on creation. If that write fails the
    /// account still exists; the next [`Vault::login`] writes them instead.
    pub fn create_user(&self, username: &str, password: &str) -> Result<Session> {
        let unlocked = self.credentials().create_user(username, password)?;
        let session = self.start_session(unlocked);
        ensure_settings(&session)?;
        Ok(session)
    }

    /// Verify the password and start a session.
    pub fn login(&self, password: &str) -> Result<Session> {
        let unlocked = self.credentials().authenticate(password)?;
        let session = self.start_session(unlocked);
        ensure_settings(&session)?;
        Ok(session)
    }

    /// A store without a key; every operation fails with `NotAuthenticated`.
    pub fn locked_store(&self) -> RecordStore {
        RecordStore::locked(Arc::clone(&self.db))
    }

    fn credentials(&self) -> CredentialStore<'_> {
        CredentialStore::new(&self.db, self.params)
    }

    fn start_session(&self, unlocked: UnlockedUser) -> Session {
        Session {
            username: unlocked.username,
            store: RecordStore::unlocked(Arc::clone(&self.db), unlocked.key),
            opened_at: Utc::now(),
        }
    }
}

fn ensure_settings(session: &Session) -> Result<()> {
    if session.store.get::<Settings>(SETTINGS_ID)?.is_none() {
        session
            .store
            .put(&Settings::for_today(Local::now().date_naive()))?;
        tracing::info!(username = %session.username, "Default settings written");
    }
    Ok(())
}

/// An authenticated user with an unlocked record store.
pub struct Session {
    username: String,
    store: RecordStore,
    opened_at: DateTime<Utc>,
}

impl Session {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// End the session, dropping its key.
    pub fn close(self) {
        tracing::info!(username = %self.username, "Session closed");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("opened_at", &self.opened_at)
            .finish_non_exhaustive()
    }
}
