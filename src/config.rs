// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the validated runtime config
//! built from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `GRADEBOOK_DATA_DIR` | Directory holding `gradebook.redb` | `./data` |
//! | `GRADEBOOK_KDF_ITERATIONS` | PBKDF2 iterations for new accounts (>= 250000) | `250000` |
//! | `GRADEBOOK_PASSWORD` | Password for non-interactive CLI use | prompt |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::path::PathBuf;

use crate::crypto::KdfParams;
use crate::error::{GradebookError, Result};
use crate::storage::StoragePaths;

/// Environment variable name for the vault data directory.
pub const DATA_DIR_ENV: &str = "GRADEBOOK_DATA_DIR";

/// Environment variable name for the PBKDF2 iteration count.
///
/// Only affects accounts created afterwards; existing accounts keep the
/// count recorded in their credential.
pub const KDF_ITERATIONS_ENV: &str = "GRADEBOOK_KDF_ITERATIONS";

/// Environment variable name for a non-interactive password.
pub const PASSWORD_ENV: &str = "GRADEBOOK_PASSWORD";

/// Environment variable name selecting the log formatter.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default `RUST_LOG` filter when none is set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub paths: StoragePaths,
    pub kdf: KdfParams,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Build the config from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let paths = match lookup(DATA_DIR_ENV) {
            Some(dir) if !dir.trim().is_empty() => StoragePaths::new(PathBuf::from(dir)),
            _ => StoragePaths::default(),
        };

        let kdf = match lookup(KDF_ITERATIONS_ENV) {
            Some(raw) => {
                let iterations: u32 = raw.trim().parse().map_err(|_| {
                    GradebookError::Config(format!("{KDF_ITERATIONS_ENV} must be an integer, got {raw:?}"))
                })?;
                KdfParams::new(iterations)?
            }
            None => KdfParams::default(),
        };

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref().map(str::trim) {
            None | Some("") | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(GradebookError::Config(format!(
                    "{LOG_FORMAT_ENV} must be 'json' or 'pretty', got {other:?}"
                )))
            }
        };

        Ok(Self {
            paths,
            kdf,
            log_format,
        })
    }
}
