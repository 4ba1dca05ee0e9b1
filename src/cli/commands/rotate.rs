//! `credvault rotate-key` — change the vault master passphrase.
//!
//! Unlocks with the current passphrase, then re-encrypts every field
//! under a key derived from the new passphrase and a fresh salt, and
//! writes the vault atomically.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{lock_and_save, log_audit, open_unlocked, Cli, VaultPaths};
use crate::errors::{CredVaultError, Result};

/// Environment variable holding the new passphrase for scripted rotation.
const NEW_PASSPHRASE_ENV: &str = "CREDVAULT_NEW_PASSPHRASE";

/// Execute the `rotate-key` command.
pub async fn execute(cli: &Cli) -> Result<()> {
    let paths = VaultPaths::resolve(cli)?;

    output::info("Enter your current master passphrase.");
    let store = open_unlocked(cli, &paths).await?;

    let new_passphrase = match std::env::var(NEW_PASSPHRASE_ENV) {
        Ok(pw) if !pw.is_empty() => Zeroizing::new(pw),
        _ => {
            output::info("Choose your new master passphrase.");
            prompt_new_passphrase()?
        }
    };

    store.rotate_passphrase(&new_passphrase).await?;
    let total = store.credential_count().await;
    lock_and_save(&paths, &store).await?;

    log_audit(cli, "rotate-key", Some(&format!("{total} re-encrypted")));
    output::success(&format!(
        "Passphrase rotated for {} ({total} credential(s) re-encrypted)",
        paths.vault_name()
    ));

    Ok(())
}

/// Always interactive: `CREDVAULT_PASSPHRASE` holds the old passphrase
/// and must not be picked up here.
fn prompt_new_passphrase() -> Result<Zeroizing<String>> {
    let pw = dialoguer::Password::new()
        .with_prompt("New master passphrase")
        .with_confirmation("Confirm new passphrase", "Passphrases do not match")
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}
