//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::errors::{CredVaultError, Result};
use crate::vault::{read_vault, write_vault, VaultStore};

/// Environment variable checked before prompting for the passphrase.
pub const PASSPHRASE_ENV: &str = "CREDVAULT_PASSPHRASE";

/// CredVault CLI: local encrypted credential vault.
#[derive(Parser)]
#[command(
    name = "credvault",
    about = "Local encrypted password vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: .credvault, or `vault_dir` in .credvault.toml)
    #[arg(long, global = true)]
    pub vault_dir: Option<String>,

    /// Show debug logging (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Init,

    /// Add a credential
    Add {
        /// Website or domain (e.g. example.com)
        domain: String,
        /// Username or email for the site
        username: String,
        /// Password (omit for interactive prompt)
        #[arg(long, conflicts_with = "generate")]
        password: Option<String>,
        /// Generate a random password instead of entering one
        #[arg(short, long)]
        generate: bool,
        /// Length of the generated password
        #[arg(short, long, requires = "generate")]
        length: Option<usize>,
    },

    /// List saved credentials
    List {
        /// Show passwords in clear text
        #[arg(long)]
        show_passwords: bool,
    },

    /// Remove a credential by its index (see `list`)
    Remove {
        /// Index shown in the `#` column of `list`
        index: usize,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Generate a random password (no vault needed)
    Generate {
        /// Password length
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Change the vault's master passphrase
    RotateKey,

    /// View the audit log of vault operations
    #[cfg(feature = "audit-log")]
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Where the vault lives, resolved from CLI flags and `.credvault.toml`.
pub struct VaultPaths {
    pub settings: Settings,
    pub vault_dir: PathBuf,
    pub vault_path: PathBuf,
}

impl VaultPaths {
    /// Resolve paths relative to the current directory.
    ///
    /// `--vault-dir` wins over the config file.
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::resolve_in(&cwd, cli.vault_dir.as_deref())
    }

    fn resolve_in(project_dir: &Path, vault_dir_flag: Option<&str>) -> Result<Self> {
        let mut settings = Settings::load(project_dir)?;
        if let Some(dir) = vault_dir_flag {
            settings.vault_dir = dir.to_string();
        }
        let vault_dir = project_dir.join(&settings.vault_dir);
        let vault_path = settings.vault_path(project_dir);
        Ok(Self {
            settings,
            vault_dir,
            vault_path,
        })
    }

    /// File name of the vault, used to label audit entries.
    pub fn vault_name(&self) -> String {
        self.vault_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Get the master passphrase, trying in order:
/// 1. `CREDVAULT_PASSPHRASE` env var (scripts/CI)
/// 2. Interactive prompt, with confirmation when `confirm` is set
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn prompt_passphrase(prompt: &str, confirm: bool) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSPHRASE_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let mut input = dialoguer::Password::new().with_prompt(prompt);
    if confirm {
        input = input.with_confirmation("Confirm passphrase", "Passphrases do not match");
    }
    let pw = input
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Load the vault from disk and unlock it.
///
/// An empty vault accepts any passphrase, so in that case the prompt asks
/// for confirmation: the passphrase typed now seals the first entry.
pub async fn open_unlocked(cli: &Cli, paths: &VaultPaths) -> Result<VaultStore> {
    let store = VaultStore::load(read_vault(&paths.vault_path)?)?;

    let first_use = store.credential_count().await == 0;
    let prompt = if first_use {
        "Choose master passphrase"
    } else {
        "Enter master passphrase"
    };
    let passphrase = prompt_passphrase(prompt, first_use)?;

    match store.unlock(&passphrase).await {
        Ok(()) => {
            log_audit(cli, "unlock", None);
            Ok(store)
        }
        Err(e) => {
            log_audit(cli, "unlock", Some("rejected"));
            Err(e)
        }
    }
}

/// Lock the vault and write its ciphertext-only record to disk.
pub async fn lock_and_save(paths: &VaultPaths, store: &VaultStore) -> Result<()> {
    store.lock().await;
    write_vault(&paths.vault_path, &store.serialize().await)
}

/// Record an audit event when the `audit-log` feature is enabled.
pub fn log_audit(cli: &Cli, op: &str, details: Option<&str>) {
    #[cfg(feature = "audit-log")]
    crate::audit::log_audit(cli, op, details);

    #[cfg(not(feature = "audit-log"))]
    let _ = (cli, op, details);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn paths_default_to_credvault_dir() {
        let tmp = TempDir::new().unwrap();
        let paths = VaultPaths::resolve_in(tmp.path(), None).unwrap();
        assert_eq!(paths.vault_dir, tmp.path().join(".credvault"));
        assert_eq!(paths.vault_path, tmp.path().join(".credvault/vault.json"));
        assert_eq!(paths.vault_name(), "vault.json");
    }

    #[test]
    fn flag_overrides_config_vault_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".credvault.toml"), "vault_dir = \"cfg\"\n").unwrap();

        let from_config = VaultPaths::resolve_in(tmp.path(), None).unwrap();
        assert_eq!(from_config.vault_dir, tmp.path().join("cfg"));

        let from_flag = VaultPaths::resolve_in(tmp.path(), Some("flag")).unwrap();
        assert_eq!(from_flag.vault_dir, tmp.path().join("flag"));
    }

    #[test]
    fn custom_vault_file_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(".credvault.toml"),
            "vault_file = \"work.json\"\n",
        )
        .unwrap();

        let paths = VaultPaths::resolve_in(tmp.path(), None).unwrap();
        assert_eq!(paths.vault_name(), "work.json");
    }
}
