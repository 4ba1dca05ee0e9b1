use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in CredVault.
#[derive(Debug, Error)]
pub enum CredVaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Secure random source failed: {0}")]
    RandomSource(String),

    // --- Vault errors ---
    #[error("Incorrect passphrase — the vault stays locked")]
    IncorrectPassphrase,

    #[error("Vault is locked — unlock it first")]
    VaultLocked,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No credential at index {0}")]
    CredentialNotFound(usize),

    #[error("Vault not found at {}", .0.display())]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {}", .0.display())]
    VaultAlreadyExists(PathBuf),

    #[error("Background task failed: {0}")]
    BackgroundTask(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Audit error: {0}")]
    AuditError(String),
}

impl From<tokio::task::JoinError> for CredVaultError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::BackgroundTask(err.to_string())
    }
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, CredVaultError>;
