//! AES-256-GCM authenticated encryption of short text fields.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  `decrypt` splits the nonce back out
//! before decrypting.
//!
//! Layout of a [`CipherBlob`]:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]
//!
//! Persisted blobs are base64 (standard alphabet, padded).

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, Zeroizing};

use super::kdf::DerivedKey;
use crate::errors::{CredVaultError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// One encrypted field: `nonce || ciphertext || tag`.
///
/// The bytes are opaque until [`decrypt`] verifies them; nothing about
/// the length or content is trusted before that.
#[derive(Clone, PartialEq, Eq)]
pub struct CipherBlob(Vec<u8>);

impl CipherBlob {
    /// Wrap raw blob bytes as read from storage.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Decode a base64 blob.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        BASE64
            .decode(encoded)
            .map(Self)
            .map_err(|e| CredVaultError::InvalidArgument(format!("blob is not valid base64: {e}")))
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CipherBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CipherBlob({} bytes)", self.0.len())
    }
}

impl Serialize for CipherBlob {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for CipherBlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        BASE64
            .decode(&s)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// Encrypt `plaintext` under `key`.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext || tag).
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> Result<CipherBlob> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CredVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    // Never reuse a nonce under the same key.
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CredVaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(CipherBlob(output))
}

/// Decrypt a blob produced by [`encrypt`].
///
/// Fails closed with `DecryptionFailed` on a short blob, a wrong key, or
/// any tampering; no partial plaintext is ever returned.
pub fn decrypt(key: &DerivedKey, blob: &CipherBlob) -> Result<Zeroizing<Vec<u8>>> {
    let data = blob.as_bytes();
    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(CredVaultError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| CredVaultError::DecryptionFailed)?;

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CredVaultError::DecryptionFailed)?;

    Ok(Zeroizing::new(plaintext))
}

/// Encrypt a text field.
pub fn encrypt_text(key: &DerivedKey, plaintext: &str) -> Result<CipherBlob> {
    encrypt(key, plaintext.as_bytes())
}

/// Decrypt a text field.
///
/// An authentic blob whose plaintext is not UTF-8 is treated as corrupt.
pub fn decrypt_text(key: &DerivedKey, blob: &CipherBlob) -> Result<String> {
    let mut plaintext = decrypt(key, blob)?;
    let bytes = std::mem::take(&mut *plaintext);
    String::from_utf8(bytes).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        CredVaultError::DecryptionFailed
    })
}
