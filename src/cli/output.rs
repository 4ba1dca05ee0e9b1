//! Terminal output for the `credvault` binary.
//!
//! Status lines are prefixed with a coloured marker. Errors and warnings
//! go to stderr so stdout stays clean for piping (`generate`, `list`).

use comfy_table::{Cell, ContentArrangement, Table};
use console::{style, StyledObject};

use crate::vault::PlainCredential;

/// Longest run of bullets shown for a hidden password.
const MASK_WIDTH: usize = 12;

fn to_stdout(marker: StyledObject<&str>, msg: &str) {
    println!("{marker} {msg}");
}

fn to_stderr(marker: StyledObject<&str>, msg: &str) {
    eprintln!("{marker} {msg}");
}

pub fn success(msg: &str) {
    to_stdout(style("\u{2713}").green().bold(), msg);
}

pub fn error(msg: &str) {
    to_stderr(style("\u{2717}").red().bold(), msg);
}

pub fn warning(msg: &str) {
    to_stderr(style("\u{26a0}").yellow().bold(), msg);
}

pub fn info(msg: &str) {
    to_stdout(style("\u{2139}").blue().bold(), msg);
}

/// Dimmed hint shown after a command, e.g. what to run next.
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Bullets standing in for a password. The width is capped so the
/// table does not reveal long passwords' lengths.
fn mask(password: &str) -> String {
    "\u{2022}".repeat(password.chars().count().min(MASK_WIDTH))
}

/// Render credentials as a table indexed the way `remove` expects.
pub fn print_credentials_table(creds: &[PlainCredential], show_passwords: bool) {
    if creds.is_empty() {
        info("No credentials in this vault yet.");
        tip("Run `credvault add <DOMAIN> <USERNAME> --generate` to add one.");
        return;
    }

    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Domain", "Username", "Password"]);

    for (index, cred) in creds.iter().enumerate() {
        let password = if show_passwords {
            cred.password.clone()
        } else {
            mask(&cred.password)
        };
        table.add_row(vec![
            Cell::new(index),
            Cell::new(&cred.domain),
            Cell::new(&cred.username),
            Cell::new(password),
        ]);
    }

    println!("{table}");
}
