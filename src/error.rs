// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::crypto::CryptoError;
use crate::storage::{Collection, StorageError};

/// Errors surfaced to callers of the vault.
///
/// Nothing in the vault retries or falls back to default data; every
/// failure reaches the caller, which decides how to present it.
#[derive(Debug, thiserror::Error)]
pub enum GradebookError {
    /// Wrong password. Recoverable by retrying.
    #[error("authentication failed: wrong password")]
    Authentication,

    /// A stored record could not be opened with the session key.
    #[error("record {collection}/{key} could not be decrypted")]
    Decryption { collection: Collection, key: String },

    /// Store used without an unlocked session.
    #[error("not authenticated: log in before accessing records")]
    NotAuthenticated,

    /// Attempt to create a second user account.
    #[error("a user account already exists")]
    AlreadyExists,

    /// Login attempted before any account was created.
    #[error("no user account exists yet")]
    NoUser,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cryptographic failure: {0}")]
    Crypto(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl GradebookError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            GradebookError::Authentication => "authentication_failed",
            GradebookError::Decryption { .. } => "decryption_failed",
            GradebookError::NotAuthenticated => "not_authenticated",
            GradebookError::AlreadyExists => "already_exists",
            GradebookError::NoUser => "no_user",
            GradebookError::InvalidInput(_) => "invalid_input",
            GradebookError::Config(_) => "config_error",
            GradebookError::Crypto(_) => "crypto_error",
            GradebookError::Storage(_) => "storage_error",
        }
    }

    /// Whether the user can fix this by retrying with different input.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            GradebookError::Authentication | GradebookError::InvalidInput(_)
        )
    }
}

impl From<CryptoError> for GradebookError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidParams(msg) => GradebookError::Config(msg),
            CryptoError::MalformedEnvelope(msg) => {
                GradebookError::Storage(StorageError::Corrupt(msg))
            }
            CryptoError::Serde(e) => GradebookError::Storage(StorageError::Serde(e)),
            other => GradebookError::Crypto(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GradebookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_distinct_per_variant() {
        assert_eq!(GradebookError::Authentication.error_code(), "authentication_failed");
        assert_eq!(GradebookError::NotAuthenticated.error_code(), "not_authenticated");
        assert_eq!(GradebookError::AlreadyExists.error_code(), "already_exists");
        assert_eq!(
            GradebookError::Decryption {
                collection: Collection::Students,
                key: "s1".into()
            }
            .error_code(),
            "decryption_failed"
        );
    }

    #[test]
    fn decryption_message_names_the_record() {
        let err = GradebookError::Decryption {
            collection: Collection::Students,
            key: "s1".into(),
        };
        assert_eq!(err.to_string(), "record students/s1 could not be decrypted");
    }

    #[test]
    fn crypto_errors_map_to_taxonomy() {
        let config: GradebookError = CryptoError::InvalidParams("too few".into()).into();
        assert!(matches!(config, GradebookError::Config(_)));

        let corrupt: GradebookError = CryptoError::MalformedEnvelope("short iv".into()).into();
        assert!(matches!(corrupt, GradebookError::Storage(StorageError::Corrupt(_))));

        let random: GradebookError = CryptoError::Random.into();
        assert!(matches!(random, GradebookError::Crypto(_)));
    }

    #[test]
    fn only_input_errors_are_recoverable() {
        assert!(GradebookError::Authentication.is_user_recoverable());
        assert!(!GradebookError::NotAuthenticated.is_user_recoverable());
        assert!(!GradebookError::AlreadyExists.is_user_recoverable());
    }
}
