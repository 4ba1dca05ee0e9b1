//! `credvault list` — display all credentials in a table.

use crate::cli::output;
use crate::cli::{log_audit, open_unlocked, Cli, VaultPaths};
use crate::errors::Result;

/// Execute the `list` command.
pub async fn execute(cli: &Cli, show_passwords: bool) -> Result<()> {
    let paths = VaultPaths::resolve(cli)?;
    let store = open_unlocked(cli, &paths).await?;

    let creds = store.list_credentials().await?;
    store.lock().await;

    if show_passwords {
        log_audit(cli, "list", Some("passwords shown"));
    }

    output::info(&format!("{} — {} credential(s)", paths.vault_name(), creds.len()));
    output::print_credentials_table(&creds, show_passwords);

    Ok(())
}
