//! `credvault generate` — print a random password.

use crate::cli::{Cli, VaultPaths};
use crate::crypto::generator;
use crate::errors::Result;

/// Execute the `generate` command.
///
/// Uses the alphabet and default length from `.credvault.toml`; no vault
/// or passphrase is involved.
pub fn execute(cli: &Cli, length: Option<usize>) -> Result<()> {
    let paths = VaultPaths::resolve(cli)?;
    let alphabet = paths.settings.alphabet()?;
    let length = length.unwrap_or(paths.settings.password_length);

    let password = generator::generate(length, &alphabet)?;
    println!("{password}");
    Ok(())
}
