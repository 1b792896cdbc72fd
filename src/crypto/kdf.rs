// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! PBKDF2-HMAC-SHA256 key derivation.
//!
//! The derivation is deliberately slow (hundreds of thousands of HMAC rounds)
//! so that an attacker holding a copy of the database pays the same cost per
//! password guess as a legitimate login.

use std::num::NonZeroU32;

use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

use super::aead::SessionKey;
use super::{CryptoError, CryptoResult};

/// Salt length in bytes, fixed at account creation.
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Lowest iteration count accepted for production parameters.
pub const MIN_ITERATIONS: u32 = 250_000;

/// Key derivation cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    iterations: NonZeroU32,
}

impl KdfParams {
    /// Production parameters with a custom iteration count.
    ///
    /// # Errors
    /// Returns `CryptoError::InvalidParams` below [`MIN_ITERATIONS`].
    pub fn new(iterations: u32) -> CryptoResult<Self> {
        if iterations < MIN_ITERATIONS {
            return Err(CryptoError::InvalidParams(format!(
                "{iterations} iterations is below the minimum of {MIN_ITERATIONS}"
            )));
        }
        Self::from_stored(iterations)
    }

    /// Parameters read back from a persisted credential.
    ///
    /// No minimum applies: lowering the stored count only changes the derived
    /// key, which then fails verification.
    pub(crate) fn from_stored(iterations: u32) -> CryptoResult<Self> {
        NonZeroU32::new(iterations)
            .map(|iterations| Self { iterations })
            .ok_or_else(|| CryptoError::InvalidParams("iteration count must be non-zero".into()))
    }

    /// Cheap parameters so unit tests don't spend seconds in PBKDF2.
    #[cfg(test)]
    pub(crate) fn fast_for_tests() -> Self {
        Self {
            iterations: NonZeroU32::new(1_000).expect("non-zero"),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: NonZeroU32::new(MIN_ITERATIONS).expect("MIN_ITERATIONS is non-zero"),
        }
    }
}

/// Generate a fresh random salt.
pub fn generate_salt() -> CryptoResult<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| CryptoError::Random)?;
    Ok(salt)
}

/// Run PBKDF2 and return the raw key bytes, wiped on drop.
///
/// The password is NFC-normalized first so composed and decomposed spellings
/// of the same characters derive the same key.
pub(crate) fn derive_key_bytes(
    password: &str,
    salt: &[u8],
    params: KdfParams,
) -> Zeroizing<[u8; KEY_LEN]> {
    let normalized: Zeroizing<String> = Zeroizing::new(password.nfc().collect());
    let mut out = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        params.iterations,
        salt,
        normalized.as_bytes(),
        &mut out[..],
    );
    out
}

/// Derive the AES-256-GCM session key for `(password, salt)`.
pub fn derive_key(password: &str, salt: &[u8], params: KdfParams) -> CryptoResult<SessionKey> {
    let bytes = derive_key_bytes(password, salt, params);
    SessionKey::from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let salt = [0x42u8; SALT_LEN];
        let params = KdfParams::fast_for_tests();
        let k1 = derive_key_bytes("correct horse", &salt, params);
        let k2 = derive_key_bytes("correct horse", &salt, params);
        assert_eq!(*k1, *k2);
    }

    #[test]
    fn different_password_or_salt_changes_key() {
        let params = KdfParams::fast_for_tests();
        let base = derive_key_bytes("pw", &[1u8; SALT_LEN], params);
        let other_pw = derive_key_bytes("pw2", &[1u8; SALT_LEN], params);
        let other_salt = derive_key_bytes("pw", &[2u8; SALT_LEN], params);
        assert_ne!(*base, *other_pw);
        assert_ne!(*base, *other_salt);
    }

    #[test]
    fn composed_and_decomposed_passwords_match() {
        let params = KdfParams::fast_for_tests();
        let salt = [7u8; SALT_LEN];
        // "é" as one code point vs. "e" + combining acute accent
        let composed = derive_key_bytes("caf\u{e9}", &salt, params);
        let decomposed = derive_key_bytes("cafe\u{301}", &salt, params);
        assert_eq!(*composed, *decomposed);
    }

    #[test]
    fn production_params_enforce_minimum() {
        assert!(KdfParams::new(MIN_ITERATIONS - 1).is_err());
        assert_eq!(KdfParams::new(MIN_ITERATIONS).unwrap().iterations(), MIN_ITERATIONS);
        assert_eq!(KdfParams::default().iterations(), MIN_ITERATIONS);
    }

    #[test]
    fn stored_params_reject_zero() {
        assert!(KdfParams::from_stored(0).is_err());
        assert_eq!(KdfParams::from_stored(10).unwrap().iterations(), 10);
    }

    #[test]
    fn salts_are_random() {
        let a = generate_salt().unwrap();
        let b = generate_salt().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn production_derivation_produces_usable_key() {
        // Single full-cost run to exercise the real parameters.
        let salt = generate_salt().unwrap();
        let key = derive_key("s3cr3t", &salt, KdfParams::default()).unwrap();
        let envelope = super::super::encrypt(&key, &"ping", b"test/1").unwrap();
        let back: String = super::super::decrypt(&key, &envelope, b"test/1").unwrap();
        assert_eq!(back, "ping");
    }
}
