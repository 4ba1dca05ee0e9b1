//! Integration tests for password generation.

use std::collections::{HashMap, HashSet};

use credvault::crypto::generator::{DEFAULT_ALPHABET, DEFAULT_PASSWORD_LENGTH};
use credvault::crypto::{generate, generate_password, Alphabet};
use credvault::{CredVaultError, VaultStore};

#[test]
fn default_password_has_expected_shape() {
    let password = generate_password(DEFAULT_PASSWORD_LENGTH).unwrap();
    let alphabet = Alphabet::default();

    assert_eq!(password.chars().count(), 24);
    assert!(password.chars().all(|c| alphabet.contains(c)));
    assert_eq!(alphabet.symbols().len(), 38);
}

#[test]
fn default_alphabet_avoids_lookalikes() {
    for c in ['i', 'l', 'o', '0', '1'] {
        assert!(!DEFAULT_ALPHABET.contains(c), "{c} should not be offered");
    }
}

#[test]
fn store_exposes_generator_without_unlocking() {
    let password = VaultStore::generate_password(16).unwrap();
    assert_eq!(password.chars().count(), 16);

    let digits = Alphabet::new("0123456789").unwrap();
    let pin = VaultStore::generate_password_with(6, &digits).unwrap();
    assert!(pin.chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn zero_length_is_rejected() {
    assert!(matches!(
        generate_password(0),
        Err(CredVaultError::InvalidArgument(_))
    ));
}

#[test]
fn huge_length_is_rejected() {
    assert!(matches!(
        generate_password(usize::MAX / 2),
        Err(CredVaultError::InvalidArgument(_))
    ));
}

#[test]
fn bad_alphabets_are_rejected() {
    assert!(matches!(
        Alphabet::new(""),
        Err(CredVaultError::InvalidArgument(_))
    ));
    assert!(matches!(
        Alphabet::new("abca"),
        Err(CredVaultError::InvalidArgument(_))
    ));
}

#[test]
fn single_symbol_alphabet_repeats_it() {
    let alphabet = Alphabet::new("§").unwrap();
    assert_eq!(generate(5, &alphabet).unwrap(), "§§§§§");
}

#[test]
fn successive_passwords_differ() {
    let seen: HashSet<String> = (0..20)
        .map(|_| generate_password(DEFAULT_PASSWORD_LENGTH).unwrap())
        .collect();
    assert_eq!(seen.len(), 20);
}

#[test]
fn draws_are_uniform_over_alphabet() {
    // Chi-square goodness of fit, 9 degrees of freedom.  27.877 is the
    // 99.9% critical value, so a correct generator fails about 1 run in 1000.
    const DRAWS: usize = 100_000;
    const CRITICAL: f64 = 27.877;

    const BATCH: usize = 4_000;

    let alphabet = Alphabet::new("0123456789").unwrap();
    let mut counts: HashMap<char, usize> = HashMap::new();
    for _ in 0..DRAWS / BATCH {
        for c in generate(BATCH, &alphabet).unwrap().chars() {
            *counts.entry(c).or_default() += 1;
        }
    }
    assert_eq!(counts.values().sum::<usize>(), DRAWS);
    assert_eq!(counts.len(), 10);

    let expected = DRAWS as f64 / 10.0;
    let chi_square: f64 = counts
        .values()
        .map(|&observed| {
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum();

    assert!(
        chi_square < CRITICAL,
        "chi-square {chi_square:.2} exceeds {CRITICAL}"
    );
}
