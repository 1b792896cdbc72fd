// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential store: the single local user account.
//!
//! ## States
//!
//! ```text
//! NoUser --create_user--> HasUser   (terminal; no reset or change flow)
//! ```
//!
//! The stored record holds the username, salt, iteration count and password
//! verifier. The password and the derived key are never written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::encoding::base64_bytes;
use crate::crypto::kdf::{derive_key_bytes, KdfParams, SALT_LEN};
use crate::crypto::{generate_salt, SessionKey, Verifier};
use crate::error::{GradebookError, Result};

use super::database::{StorageError, VaultDatabase};

/// Fixed id of the one credential row.
const USER_ID: &str = "me";

/// Persisted credential (plaintext; contains nothing secret).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCredential {
    username: String,
    #[serde(with = "base64_bytes")]
    salt: Vec<u8>,
    iterations: u32,
    verifier: Verifier,
    created_at: DateTime<Utc>,
}

/// Whether an account has been created yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialState {
    NoUser,
    HasUser { username: String },
}

/// Result of a successful account creation or login.
#[derive(Debug)]
pub struct UnlockedUser {
    pub username: String,
    pub key: SessionKey,
}

/// Repository for the single user credential.
pub struct CredentialStore<'a> {
    db: &'a VaultDatabase,
    params: KdfParams,
}

impl<'a> CredentialStore<'a> {
    /// `params` applies to newly created accounts; logins use the stored count.
    pub fn new(db: &'a VaultDatabase, params: KdfParams) -> Self {
        Self { db, params }
    }

    /// Report whether an account exists.
    pub fn state(&self) -> Result<CredentialState> {
        Ok(match self.load()? {
            Some(credential) => CredentialState::HasUser {
                username: credential.username,
            },
            None => CredentialState::NoUser,
        })
    }

    /// Create the one local account and return its session key.
    ///
    /// # Errors
    /// - `AlreadyExists` if an account exists, whatever the arguments.
    /// - `InvalidInput` for an empty username or password.
    pub fn create_user(&self, username: &str, password: &str) -> Result<UnlockedUser> {
        // Cheap check first so a second account never pays for PBKDF2
        if self.load()?.is_some() {
            return Err(GradebookError::AlreadyExists);
        }

        let username = username.trim();
        if username.is_empty() {
            return Err(GradebookError::InvalidInput("username must not be empty".into()));
        }
        if password.is_empty() {
            return Err(GradebookError::InvalidInput("password must not be empty".into()));
        }

        let salt = generate_salt()?;
        let key_bytes = derive_key_bytes(password, &salt, self.params);
        let verifier = Verifier::from_key_bytes(&key_bytes)?;
        let key = SessionKey::from_bytes(&key_bytes)?;

        let credential = StoredCredential {
            username: username.to_string(),
            salt: salt.to_vec(),
            iterations: self.params.iterations(),
            verifier,
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&credential).map_err(StorageError::from)?;

        if !self.db.insert_credential_if_absent(USER_ID, &json)? {
            return Err(GradebookError::AlreadyExists);
        }

        tracing::info!(username = %credential.username, "User account created");
        Ok(UnlockedUser {
            username: credential.username,
            key,
        })
    }

    /// Verify `password` against the stored verifier and derive the session key.
    ///
    /// # Errors
    /// - `NoUser` if no account exists.
    /// - `Authentication` on a wrong password; no key is produced.
    pub fn authenticate(&self, password: &str) -> Result<UnlockedUser> {
        let credential = self.load()?.ok_or(GradebookError::NoUser)?;
        let params = KdfParams::from_stored(credential.iterations)?;

        let key_bytes = derive_key_bytes(password, &credential.salt, params);
        if !credential.verifier.matches(&key_bytes)? {
            tracing::warn!("Login rejected: password verifier mismatch");
            return Err(GradebookError::Authentication);
        }

        let key = SessionKey::from_bytes(&key_bytes)?;
        tracing::info!(username = %credential.username, "User authenticated");
        Ok(UnlockedUser {
            username: credential.username,
            key,
        })
    }

    fn load(&self) -> Result<Option<StoredCredential>> {
        let Some(bytes) = self.db.read_credential(USER_ID)? else {
            return Ok(None);
        };
        let credential: StoredCredential =
            serde_json::from_slice(&bytes).map_err(StorageError::from)?;
        if credential.salt.len() != SALT_LEN {
            return Err(StorageError::Corrupt(format!(
                "credential salt must be {SALT_LEN} bytes, got {}",
                credential.salt.len()
            ))
            .into());
        }
        Ok(Some(credential))
    }
}
