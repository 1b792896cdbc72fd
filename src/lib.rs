// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gradebook Vault - Encrypted Local Gradebook Store
//!
//! A single-user gradebook for oral-participation marks. All records are
//! encrypted with AES-256-GCM under a key derived from the user's password
//! (PBKDF2-HMAC-SHA256) before they reach the embedded redb database.
//!
//! ## Modules
//!
//! - `config` - Environment-driven runtime configuration
//! - `crypto` - Key derivation, password verifier, record encryption
//! - `error` - Error taxonomy
//! - `grades` - Grade symbols, averages, school-year terms
//! - `models` - Typed records for each collection
//! - `storage` - Credential and encrypted record stores (redb)
//! - `vault` - Vault handle and authenticated sessions

pub mod config;
pub mod crypto;
pub mod error;
pub mod grades;
pub mod models;
pub mod storage;
pub mod vault;

pub use error::{GradebookError, Result};
pub use vault::{Session, Vault};
