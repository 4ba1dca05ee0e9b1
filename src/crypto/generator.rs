//! Random password generation.
//!
//! Every character is an independent draw from the OS CSPRNG.  Uniform
//! 32-bit values are mapped onto the alphabet with rejection sampling:
//! draws that fall in the trailing partial block of the `u32` range are
//! discarded, so every symbol is exactly equally likely.

use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::errors::{CredVaultError, Result};

/// Default length for generated passwords.
pub const DEFAULT_PASSWORD_LENGTH: usize = 24;

/// Longest password `generate` will produce.
pub const MAX_PASSWORD_LENGTH: usize = 4096;

/// Default alphabet: lowercase letters and digits without look-alikes
/// (`i`, `l`, `o`, `0`, `1`) plus a handful of symbols.
pub const DEFAULT_ALPHABET: &str = "abcdefghjkmnpqrstuvwxyz23456789⌘∆˚¬£§¶";

/// A validated set of distinct symbols to draw from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
}

impl Alphabet {
    /// Build an alphabet from a string of symbols.
    ///
    /// The alphabet must be non-empty and must not repeat a symbol;
    /// a repeated symbol would be drawn more often than the others.
    pub fn new(symbols: &str) -> Result<Self> {
        let chars: Vec<char> = symbols.chars().collect();
        if chars.is_empty() {
            return Err(CredVaultError::InvalidArgument(
                "alphabet must contain at least one symbol".into(),
            ));
        }
        if u32::try_from(chars.len()).is_err() {
            return Err(CredVaultError::InvalidArgument(
                "alphabet is too large".into(),
            ));
        }

        let mut seen = chars.clone();
        seen.sort_unstable();
        if let Some(pair) = seen.windows(2).find(|w| w[0] == w[1]) {
            return Err(CredVaultError::InvalidArgument(format!(
                "alphabet repeats the symbol '{}'",
                pair[0]
            )));
        }

        Ok(Self { symbols: chars })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, c: char) -> bool {
        self.symbols.contains(&c)
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_ALPHABET.chars().collect(),
        }
    }
}

/// Generate a password of exactly `length` characters from `alphabet`.
pub fn generate(length: usize, alphabet: &Alphabet) -> Result<String> {
    if length == 0 {
        return Err(CredVaultError::InvalidArgument(
            "password length must be positive".into(),
        ));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(CredVaultError::InvalidArgument(format!(
            "password length must be at most {MAX_PASSWORD_LENGTH} (got {length})"
        )));
    }

    let mut rng = OsRng;
    // Symbols take one to four bytes each.
    let mut password = String::with_capacity(length);
    for _ in 0..length {
        let index = uniform_index(&mut rng, alphabet.len())?;
        password.push(alphabet.symbols[index]);
    }
    Ok(password)
}

/// Generate a password with the default alphabet.
pub fn generate_password(length: usize) -> Result<String> {
    generate(length, &Alphabet::default())
}

/// Draw an index in `0..n` with no modulo bias.
fn uniform_index<R: TryRngCore>(rng: &mut R, n: usize) -> Result<usize> {
    let n = u64::try_from(n)
        .map_err(|_| CredVaultError::InvalidArgument("alphabet is too large".into()))?;
    let range = u64::from(u32::MAX) + 1;
    // Largest multiple of `n` that fits in the u32 range.
    let limit = range - (range % n);

    loop {
        let draw = u64::from(
            rng.try_next_u32()
                .map_err(|e| CredVaultError::RandomSource(e.to_string()))?,
        );
        if draw < limit {
            return usize::try_from(draw % n)
                .map_err(|_| CredVaultError::InvalidArgument("alphabet is too large".into()));
        }
    }
}
