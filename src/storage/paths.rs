// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the on-disk vault layout.

use std::path::{Path, PathBuf};

/// Default base directory for the vault when `GRADEBOOK_DATA_DIR` is unset.
pub const DATA_ROOT: &str = "./data";

/// File name of the embedded database inside the data directory.
pub const DATABASE_FILE: &str = "gradebook.redb";

/// Storage path utilities for the vault.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all vault data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the redb database holding credential and encrypted records.
    pub fn database_file(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }
}
