// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password verifier stored in place of the password.
//!
//! `verifier = HMAC-SHA256(key = PBKDF2(password, salt), msg = LABEL)`
//!
//! Recovering the encryption key from a verifier is as hard as inverting
//! HMAC, so an attacker holding the credential record still has to run
//! PBKDF2 per password guess.

use std::fmt;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::encoding::base64_bytes;
use super::kdf::{derive_key_bytes, KdfParams, KEY_LEN};
use super::{CryptoError, CryptoResult};

type HmacSha256 = Hmac<Sha256>;

/// Domain-separation label; never used as encryption input.
const VERIFIER_LABEL: &[u8] = b"gradebook-vault/password-verifier/v1";

/// One-way value proving knowledge of the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Verifier(#[serde(with = "base64_bytes")] Vec<u8>);

impl Verifier {
    /// Compute the verifier for already-derived key bytes.
    pub(crate) fn from_key_bytes(key: &[u8; KEY_LEN]) -> CryptoResult<Self> {
        let mac = keyed_mac(key)?;
        Ok(Self(mac.finalize().into_bytes().to_vec()))
    }

    /// Constant-time check that `key` produces this verifier.
    pub(crate) fn matches(&self, key: &[u8; KEY_LEN]) -> CryptoResult<bool> {
        let mac = keyed_mac(key)?;
        Ok(mac.verify_slice(&self.0).is_ok())
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Verifier(<redacted>)")
    }
}

fn keyed_mac(key: &[u8; KEY_LEN]) -> CryptoResult<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| CryptoError::InvalidKey)?;
    mac.update(VERIFIER_LABEL);
    Ok(mac)
}

/// Derive the key for `(password, salt)` and return its verifier.
pub fn password_verifier(password: &str, salt: &[u8], params: KdfParams) -> CryptoResult<Verifier> {
    let key = derive_key_bytes(password, salt, params);
    Verifier::from_key_bytes(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; 16] = [3u8; 16];

    #[test]
    fn same_password_matches() {
        let params = KdfParams::fast_for_tests();
        let stored = password_verifier("s3cr3t", &SALT, params).unwrap();
        let key = derive_key_bytes("s3cr3t", &SALT, params);
        assert!(stored.matches(&key).unwrap());
        assert!(stored == password_verifier("s3cr3t", &SALT, params).unwrap());
    }

    #[test]
    fn other_password_does_not_match() {
        let params = KdfParams::fast_for_tests();
        let stored = password_verifier("s3cr3t", &SALT, params).unwrap();
        let key = derive_key_bytes("wrong", &SALT, params);
        assert!(!stored.matches(&key).unwrap());
    }

    #[test]
    fn verifier_is_not_the_key() {
        let params = KdfParams::fast_for_tests();
        let key = derive_key_bytes("s3cr3t", &SALT, params);
        let verifier = Verifier::from_key_bytes(&key).unwrap();
        assert_ne!(verifier.0.as_slice(), &key[..]);
        assert_eq!(verifier.0.len(), 32);
    }

    #[test]
    fn serializes_as_base64_string() {
        let params = KdfParams::fast_for_tests();
        let verifier = password_verifier("pw", &SALT, params).unwrap();
        let json = serde_json::to_value(&verifier).unwrap();
        assert!(json.is_string());
        let back: Verifier = serde_json::from_value(json).unwrap();
        assert!(back == verifier);
    }
}
