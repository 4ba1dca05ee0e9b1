//! Credential types stored inside a vault.
//!
//! A credential exists in two forms:
//! - [`SealedCredential`]: three independently encrypted fields.  This is
//!   the only form that is ever persisted.
//! - [`PlainCredential`]: the decrypted triple, held only in memory while
//!   the vault is unlocked and wiped when dropped.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::cipher::{decrypt_text, encrypt_text, CipherBlob};
use crate::crypto::kdf::DerivedKey;
use crate::errors::Result;

/// The persisted form of one saved entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedCredential {
    pub domain_cipher: CipherBlob,
    pub username_cipher: CipherBlob,
    pub password_cipher: CipherBlob,
}

impl SealedCredential {
    /// Decrypt all three fields.  Fails if any one of them fails.
    pub fn open(&self, key: &DerivedKey) -> Result<PlainCredential> {
        Ok(PlainCredential {
            domain: decrypt_text(key, &self.domain_cipher)?,
            username: decrypt_text(key, &self.username_cipher)?,
            password: decrypt_text(key, &self.password_cipher)?,
        })
    }
}

/// A decrypted website / username / password triple.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PlainCredential {
    pub domain: String,
    pub username: String,
    pub password: String,
}

impl PlainCredential {
    pub fn new(
        domain: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Encrypt each field separately under `key`, each with its own nonce.
    pub fn seal(&self, key: &DerivedKey) -> Result<SealedCredential> {
        Ok(SealedCredential {
            domain_cipher: encrypt_text(key, &self.domain)?,
            username_cipher: encrypt_text(key, &self.username)?,
            password_cipher: encrypt_text(key, &self.password)?,
        })
    }
}

impl fmt::Debug for PlainCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainCredential")
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
