// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Cipher Module
//!
//! Password-based key derivation and authenticated encryption for every
//! record the vault persists.
//!
//! ## Primitives
//!
//! | Concern | Primitive | Crate |
//! |---------|-----------|-------|
//! | Key derivation | PBKDF2-HMAC-SHA256, >= 250,000 iterations | `ring` |
//! | Record encryption | AES-256-GCM, 96-bit random nonce | `ring` |
//! | Password verifier | HMAC-SHA256 keyed by the derived key | `hmac` + `sha2` |
//! | Randomness | OS CSPRNG | `ring::rand::SystemRandom` |
//!
//! ## Key Hygiene
//!
//! - The derived key only ever lives inside [`SessionKey`]; the raw bytes
//!   used to build it are zeroized as soon as the key is constructed.
//! - Neither the key nor the password is ever serialized, logged or stored.
//! - The verifier is a one-way HMAC over the key, never the key itself.

pub mod aead;
pub mod encoding;
pub mod kdf;
pub mod verifier;

pub use aead::{decrypt, encrypt, Envelope, SessionKey};
pub use kdf::{derive_key, generate_salt, KdfParams, KEY_LEN, MIN_ITERATIONS, SALT_LEN};
pub use verifier::{password_verifier, Verifier};

/// Errors raised by the cipher layer.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key derivation parameters: {0}")]
    InvalidParams(String),

    #[error("invalid key material")]
    InvalidKey,

    #[error("secure random generator failed")]
    Random,

    #[error("encryption failed")]
    Encryption,

    /// Wrong key, wrong nonce, wrong binding or altered ciphertext.
    #[error("decryption failed: wrong key or tampered data")]
    Decryption,

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
