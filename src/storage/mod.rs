// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Encrypted Storage Module
//!
//! Persistent storage for the gradebook in a single redb file. The database
//! itself is not encrypted; each record is sealed by [`RecordStore`] before it
//! is written.
//!
//! ## Security Model
//!
//! - Record contents are AES-256-GCM encrypted under the session key
//! - Each ciphertext is bound to its collection and key
//! - The credential row stores salt + verifier only, never the password or key
//! - Record ids and per-collection counts are visible in raw storage; only
//!   field contents are protected
//!
//! ## Storage Layout
//!
//! ```text
//! {data_dir}/gradebook.redb
//!   credential      "me" -> {username, salt, iterations, verifier, created_at}
//!   settings        "settings" -> {iv, ciphertext}
//!   classes         {class_id} -> {iv, ciphertext}
//!   students        {student_id} -> {iv, ciphertext}
//!   contributions   {contribution_id} -> {iv, ciphertext}
//!   seat_plans      {class_id} -> {iv, ciphertext}
//! ```

pub mod collections;
pub mod credential;
pub mod database;
pub mod paths;
pub mod records;

pub use collections::{Collection, Record};
pub use credential::{CredentialState, CredentialStore, UnlockedUser};
pub use database::{StorageError, StorageResult, VaultDatabase};
pub use paths::StoragePaths;
pub use records::RecordStore;
