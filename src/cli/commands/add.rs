//! `credvault add` — encrypt and store a new credential.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{lock_and_save, log_audit, open_unlocked, Cli, VaultPaths};
use crate::crypto::generator;
use crate::errors::{CredVaultError, Result};

/// Execute the `add` command.
pub async fn execute(
    cli: &Cli,
    domain: &str,
    username: &str,
    password: Option<&str>,
    generate: bool,
    length: Option<usize>,
) -> Result<()> {
    let paths = VaultPaths::resolve(cli)?;

    // Work out the password before touching the vault.
    let password = if generate {
        let alphabet = paths.settings.alphabet()?;
        let length = length.unwrap_or(paths.settings.password_length);
        Zeroizing::new(generator::generate(length, &alphabet)?)
    } else if let Some(p) = password {
        output::warning("Password provided on command line — it may appear in shell history.");
        Zeroizing::new(p.to_string())
    } else if !io::stdin().is_terminal() {
        read_piped_password(io::stdin().lock())?
    } else {
        let p = dialoguer::Password::new()
            .with_prompt(format!("Password for {username}@{domain}"))
            .interact()
            .map_err(|e| CredVaultError::CommandFailed(format!("input prompt: {e}")))?;
        Zeroizing::new(p)
    };

    let store = open_unlocked(cli, &paths).await?;
    store.add_credential(domain, username, &password).await?;
    let total = store.credential_count().await;
    lock_and_save(&paths, &store).await?;

    log_audit(cli, "add", Some(&format!("{total} total")));
    output::success(&format!(
        "Saved {username}@{domain} ({total} credential(s) in vault)"
    ));

    if generate {
        println!("{}", password.as_str());
    }

    Ok(())
}

/// Read a password piped on stdin, dropping the trailing newline.
fn read_piped_password(mut input: impl Read) -> Result<Zeroizing<String>> {
    let mut buf = Zeroizing::new(String::new());
    input.read_to_string(&mut buf)?;
    Ok(Zeroizing::new(buf.trim_end().to_string()))
}
