//! CredVault: a local password vault.
//!
//! Credentials are sealed field by field with AES-256-GCM under a key
//! stretched from the master passphrase (PBKDF2-HMAC-SHA512). The
//! [`vault::VaultStore`] engine owns the lock/unlock state machine; the
//! `cli` module is a thin shell around it.

#[cfg(feature = "audit-log")]
pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod vault;

pub use errors::{CredVaultError, Result};
pub use vault::{PersistedVault, PlainCredential, VaultStatus, VaultStore};
