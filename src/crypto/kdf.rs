//! Passphrase-based key derivation using PBKDF2-HMAC-SHA512.
//!
//! PBKDF2 stretches the master passphrase with a large number of
//! HMAC-SHA512 rounds so every guess costs real CPU time.  The salt and
//! iteration count are stored per vault (see `vault::format`) so the same
//! passphrase always re-derives the same key for that vault.

use std::fmt;

use rand::rngs::OsRng;
use rand::TryRngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{CredVaultError, Result};

/// Length of the per-vault salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Default PBKDF2 round count for new vaults.
pub const DEFAULT_ITERATIONS: u32 = 250_000;

/// Lowest round count we accept from config or from a vault file.
pub const MIN_ITERATIONS: u32 = 10_000;

/// The key-stretching function a vault was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KdfAlgorithm {
    #[serde(rename = "pbkdf2-hmac-sha512")]
    Pbkdf2HmacSha512,
}

/// KDF parameters stored in the vault record so `unlock` uses exactly
/// the settings the vault was sealed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    pub algorithm: KdfAlgorithm,
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            algorithm: KdfAlgorithm::Pbkdf2HmacSha512,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    /// PBKDF2-HMAC-SHA512 with an explicit round count.
    ///
    /// Rejects round counts below [`MIN_ITERATIONS`] so a hand-edited
    /// config cannot silently weaken new vaults.
    pub fn pbkdf2_sha512(iterations: u32) -> Result<Self> {
        let params = Self {
            algorithm: KdfAlgorithm::Pbkdf2HmacSha512,
            iterations,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check that these parameters are strong enough to use.
    pub fn validate(&self) -> Result<()> {
        if self.iterations < MIN_ITERATIONS {
            return Err(CredVaultError::InvalidArgument(format!(
                "KDF iterations must be at least {MIN_ITERATIONS} (got {})",
                self.iterations
            )));
        }
        Ok(())
    }
}

/// A 32-byte symmetric key derived from the master passphrase.
///
/// The bytes are wiped when the value is dropped and never appear in
/// `Debug` output.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to build a cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive a 32-byte key from a passphrase and salt.
///
/// Deterministic: the same passphrase, salt and params always give the
/// same key.  There is no failure mode here; a wrong passphrase simply
/// produces a key that will not open any of the vault's blobs.
pub fn derive_key(passphrase: &[u8], salt: &[u8], params: &KdfParams) -> DerivedKey {
    let mut bytes = [0u8; KEY_LEN];
    match params.algorithm {
        KdfAlgorithm::Pbkdf2HmacSha512 => {
            pbkdf2::pbkdf2_hmac::<Sha512>(passphrase, salt, params.iterations, &mut bytes);
        }
    }
    let key = DerivedKey::new(bytes);
    bytes.zeroize();
    key
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| CredVaultError::RandomSource(format!("salt generation: {e}")))?;
    Ok(salt)
}
