//! `credvault remove` — delete a credential by index.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{lock_and_save, log_audit, open_unlocked, Cli, VaultPaths};
use crate::errors::{CredVaultError, Result};

/// Execute the `remove` command.
pub async fn execute(cli: &Cli, index: usize, force: bool) -> Result<()> {
    let paths = VaultPaths::resolve(cli)?;
    let store = open_unlocked(cli, &paths).await?;

    let creds = store.list_credentials().await?;
    let Some(target) = creds.get(index) else {
        store.lock().await;
        return Err(CredVaultError::CredentialNotFound(index));
    };
    let label = format!("{}@{}", target.username, target.domain);
    drop(creds);

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Remove {label}?"))
            .default(false)
            .interact()
            .map_err(|e| CredVaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            store.lock().await;
            output::info("Cancelled.");
            return Ok(());
        }
    }

    store.remove_credential(index).await?;
    lock_and_save(&paths, &store).await?;

    log_audit(cli, "remove", Some(&format!("index {index}")));
    output::success(&format!("Removed {label}"));

    Ok(())
}
