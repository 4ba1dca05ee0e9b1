//! `credvault init` — create a new, empty vault.

use std::fs;

use crate::cli::output;
use crate::cli::{log_audit, Cli, VaultPaths};
use crate::errors::{CredVaultError, Result};
use crate::vault::{write_vault, VaultStore};

/// Execute the `init` command.
pub async fn execute(cli: &Cli) -> Result<()> {
    let paths = VaultPaths::resolve(cli)?;

    // 1. Create the vault directory if it doesn't exist.
    if !paths.vault_dir.exists() {
        fs::create_dir_all(&paths.vault_dir)?;
        output::info(&format!(
            "Created vault directory: {}",
            paths.vault_dir.display()
        ));
    }

    // 2. Refuse to overwrite an existing vault.
    if paths.vault_path.exists() {
        output::tip("Use `credvault add` to add credentials to the existing vault.");
        return Err(CredVaultError::VaultAlreadyExists(paths.vault_path));
    }

    // 3. Fresh salt, configured KDF settings, no entries yet.
    let store = VaultStore::new(paths.settings.kdf_params()?)?;
    write_vault(&paths.vault_path, &store.serialize().await)?;

    log_audit(cli, "init", Some("vault created"));
    output::success(&format!("Vault created at {}", paths.vault_path.display()));

    output::tip("The passphrase you choose on the first `add` seals the vault.");
    output::tip("Run `credvault add <DOMAIN> <USERNAME> --generate` to add a credential.");

    Ok(())
}
