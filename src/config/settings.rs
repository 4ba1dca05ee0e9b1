use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::generator::{Alphabet, DEFAULT_ALPHABET, DEFAULT_PASSWORD_LENGTH};
use crate::crypto::kdf::{KdfParams, DEFAULT_ITERATIONS};
use crate::errors::{CredVaultError, Result};

/// Project-level configuration, read from `.credvault.toml`.
///
/// Any key may be omitted; missing keys take the values from
/// [`Settings::default`], so no config file is needed at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Vault directory, relative to the project root.
    pub vault_dir: String,

    /// File name of the vault record inside `vault_dir`.
    pub vault_file: String,

    /// PBKDF2 rounds for newly created vaults.
    pub kdf_iterations: u32,

    /// Length of generated passwords.
    pub password_length: usize,

    /// Symbols generated passwords are drawn from.
    pub password_alphabet: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: ".credvault".into(),
            vault_file: "vault.json".into(),
            kdf_iterations: DEFAULT_ITERATIONS,
            password_length: DEFAULT_PASSWORD_LENGTH,
            password_alphabet: DEFAULT_ALPHABET.into(),
        }
    }
}

impl Settings {
    const FILE_NAME: &'static str = ".credvault.toml";

    /// Read `<project_dir>/.credvault.toml`, or the defaults if there is
    /// none. Unknown keys and malformed TOML are a `ConfigError`.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(Self::FILE_NAME);

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        let settings = toml::from_str(&text)
            .map_err(|e| CredVaultError::ConfigError(format!("{}: {e}", path.display())))?;

        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Full path to the vault record.
    ///
    /// Example: `project_dir/.credvault/vault.json`
    pub fn vault_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vault_dir).join(&self.vault_file)
    }

    /// KDF parameters for new vaults, validated.
    pub fn kdf_params(&self) -> Result<KdfParams> {
        KdfParams::pbkdf2_sha512(self.kdf_iterations)
            .map_err(|e| CredVaultError::ConfigError(e.to_string()))
    }

    /// The configured generator alphabet, validated.
    pub fn alphabet(&self) -> Result<Alphabet> {
        Alphabet::new(&self.password_alphabet)
            .map_err(|e| CredVaultError::ConfigError(e.to_string()))
    }
}
