// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! AES-256-GCM encryption of JSON-serializable values.
//!
//! Every call to [`encrypt`] draws a fresh 96-bit nonce from the OS CSPRNG,
//! so identical plaintexts never produce identical envelopes. The caller
//! supplies a *binding* (authenticated but unencrypted associated data); the
//! record store passes `"<collection>/<key>"` so a ciphertext cannot be moved
//! to another slot without failing authentication.

use std::fmt;

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use zeroize::Zeroizing;

use super::encoding::base64_bytes;
use super::kdf::KEY_LEN;
use super::{CryptoError, CryptoResult};

/// Symmetric key for one unlocked session. Held in memory only.
pub struct SessionKey {
    key: LessSafeKey,
}

impl SessionKey {
    pub(crate) fn from_bytes(bytes: &[u8; KEY_LEN]) -> CryptoResult<Self> {
        let unbound = UnboundKey::new(&AES_256_GCM, bytes).map_err(|_| CryptoError::InvalidKey)?;
        Ok(Self {
            key: LessSafeKey::new(unbound),
        })
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

/// Stored form of an encrypted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// 12-byte nonce, unique per encryption.
    #[serde(with = "base64_bytes")]
    pub iv: Vec<u8>,
    /// AES-GCM ciphertext with the 16-byte tag appended.
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
}

/// Serialize `value` to JSON and seal it under `key`.
pub fn encrypt<T: Serialize + ?Sized>(
    key: &SessionKey,
    value: &T,
    binding: &[u8],
) -> CryptoResult<Envelope> {
    let mut in_out = serde_json::to_vec(value)?;

    let mut iv = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut iv)
        .map_err(|_| CryptoError::Random)?;

    key.key
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(iv),
            Aad::from(binding),
            &mut in_out,
        )
        .map_err(|_| CryptoError::Encryption)?;

    Ok(Envelope {
        iv: iv.to_vec(),
        ciphertext: in_out,
    })
}

/// Open `envelope` and deserialize the plaintext.
///
/// # Errors
/// `CryptoError::Decryption` if the key, nonce, binding or ciphertext does
/// not match. Nothing of the plaintext is returned in that case.
pub fn decrypt<T: DeserializeOwned>(
    key: &SessionKey,
    envelope: &Envelope,
    binding: &[u8],
) -> CryptoResult<T> {
    let nonce = Nonce::try_assume_unique_for_key(&envelope.iv).map_err(|_| {
        CryptoError::MalformedEnvelope(format!(
            "iv must be {NONCE_LEN} bytes, got {}",
            envelope.iv.len()
        ))
    })?;

    let mut in_out = Zeroizing::new(envelope.ciphertext.clone());
    let plaintext = key
        .key
        .open_in_place(nonce, Aad::from(binding), in_out.as_mut_slice())
        .map_err(|_| CryptoError::Decryption)?;

    Ok(serde_json::from_slice(plaintext)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::{derive_key, KdfParams};
    use serde_json::json;

    fn key_for(password: &str) -> SessionKey {
        derive_key(password, &[9u8; 16], KdfParams::fast_for_tests()).unwrap()
    }

    #[test]
    fn round_trip_preserves_value() {
        let key = key_for("pw");
        let record = json!({"id": "s1", "name": "Anna Becker", "classId": "c1", "tags": [1, 2]});

        let envelope = encrypt(&key, &record, b"students/s1").unwrap();
        assert_eq!(envelope.iv.len(), NONCE_LEN);

        let back: serde_json::Value = decrypt(&key, &envelope, b"students/s1").unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn wrong_key_is_rejected() {
        let envelope = encrypt(&key_for("right"), &json!({"a": 1}), b"x").unwrap();
        let result: CryptoResult<serde_json::Value> = decrypt(&key_for("wrong"), &envelope, b"x");
        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn same_plaintext_encrypts_differently() {
        let key = key_for("pw");
        let a = encrypt(&key, &json!({"same": true}), b"x").unwrap();
        let b = encrypt(&key, &json!({"same": true}), b"x").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let key = key_for("pw");
        let mut envelope = encrypt(&key, &json!({"grade": 2}), b"x").unwrap();
        envelope.ciphertext[0] ^= 0x01;
        let result: CryptoResult<serde_json::Value> = decrypt(&key, &envelope, b"x");
        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn swapped_nonce_is_rejected() {
        let key = key_for("pw");
        let mut envelope = encrypt(&key, &json!({"grade": 2}), b"x").unwrap();
        let other = encrypt(&key, &json!({"grade": 3}), b"x").unwrap();
        envelope.iv = other.iv;
        let result: CryptoResult<serde_json::Value> = decrypt(&key, &envelope, b"x");
        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn binding_mismatch_is_rejected() {
        let key = key_for("pw");
        let envelope = encrypt(&key, &json!({"grade": 2}), b"students/s1").unwrap();
        let result: CryptoResult<serde_json::Value> = decrypt(&key, &envelope, b"students/s2");
        assert!(matches!(result, Err(CryptoError::Decryption)));
    }

    #[test]
    fn short_iv_is_malformed() {
        let key = key_for("pw");
        let mut envelope = encrypt(&key, &1u8, b"x").unwrap();
        envelope.iv.truncate(8);
        let result: CryptoResult<u8> = decrypt(&key, &envelope, b"x");
        assert!(matches!(result, Err(CryptoError::MalformedEnvelope(_))));
    }

    #[test]
    fn debug_output_hides_key() {
        assert_eq!(format!("{:?}", key_for("pw")), "SessionKey(<redacted>)");
    }
}
