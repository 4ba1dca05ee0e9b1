//! Vault module — encrypted credential storage.
//!
//! This module provides:
//! - `SealedCredential` and `PlainCredential` types (`credential`)
//! - The persisted JSON record and file backend (`format`)
//! - The async `VaultStore` lock/unlock engine (`store`)

pub mod credential;
pub mod format;
pub mod store;

// Re-export the most commonly used items.
pub use credential::{PlainCredential, SealedCredential};
pub use format::{read_vault, write_vault, PersistedVault};
pub use store::{VaultStatus, VaultStore};
