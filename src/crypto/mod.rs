//! Cryptographic primitives for CredVault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption of text fields (`cipher`)
//! - PBKDF2-HMAC-SHA512 passphrase-based key derivation (`kdf`)
//! - Unbiased random password generation (`generator`)

pub mod cipher;
pub mod generator;
pub mod kdf;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use cipher::{decrypt, decrypt_text, encrypt, encrypt_text, CipherBlob};
pub use generator::{generate, generate_password, Alphabet};
pub use kdf::{derive_key, generate_salt, DerivedKey, KdfParams};
