//! Integration tests for the CredVault crypto module.

use credvault::crypto::cipher::{NONCE_LEN, TAG_LEN};
use credvault::crypto::kdf::{KdfParams, MIN_ITERATIONS};
use credvault::crypto::{
    decrypt, decrypt_text, derive_key, encrypt, encrypt_text, generate_salt, CipherBlob,
    DerivedKey,
};
use credvault::CredVaultError;

fn fast_params() -> KdfParams {
    KdfParams::pbkdf2_sha512(MIN_ITERATIONS).expect("minimum iterations are valid")
}

fn key_for(passphrase: &str, salt: &[u8]) -> DerivedKey {
    derive_key(passphrase.as_bytes(), salt, &fast_params())
}

// ---------------------------------------------------------------------------
// Encryption round-trip
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = DerivedKey::new([0xAB; 32]);
    let plaintext = b"correct horse battery staple";

    let blob = encrypt(&key, plaintext).expect("encrypt should succeed");

    // Nonce and tag surround the ciphertext.
    assert_eq!(blob.len(), NONCE_LEN + plaintext.len() + TAG_LEN);

    let recovered = decrypt(&key, &blob).expect("decrypt should succeed");
    assert_eq!(recovered.as_slice(), plaintext);
}

#[test]
fn empty_plaintext_roundtrips() {
    let key = DerivedKey::new([0x01; 32]);
    let blob = encrypt(&key, b"").unwrap();
    assert_eq!(blob.len(), NONCE_LEN + TAG_LEN);
    assert!(decrypt(&key, &blob).unwrap().is_empty());
}

#[test]
fn encrypt_produces_different_ciphertext_each_time() {
    let key = DerivedKey::new([0xCD; 32]);

    let ct1 = encrypt_text(&key, "hunter2").unwrap();
    let ct2 = encrypt_text(&key, "hunter2").unwrap();

    assert_ne!(ct1, ct2, "fresh nonce per encryption");
    assert_eq!(decrypt_text(&key, &ct1).unwrap(), "hunter2");
    assert_eq!(decrypt_text(&key, &ct2).unwrap(), "hunter2");
}

#[test]
fn wrong_key_fails_authentication() {
    let salt = generate_salt().unwrap();
    let right = key_for("correct", &salt);
    let wrong = key_for("wrong", &salt);

    let blob = encrypt_text(&right, "example.com").unwrap();
    assert!(matches!(
        decrypt_text(&wrong, &blob),
        Err(CredVaultError::DecryptionFailed)
    ));
}

#[test]
fn flipped_ciphertext_byte_is_detected() {
    let key = DerivedKey::new([0x11; 32]);
    let blob = encrypt_text(&key, "secret").unwrap();

    let mut bytes = blob.as_bytes().to_vec();
    bytes[NONCE_LEN] ^= 0x01;
    let tampered = CipherBlob::from_bytes(bytes);

    assert!(matches!(
        decrypt(&key, &tampered),
        Err(CredVaultError::DecryptionFailed)
    ));
}

#[test]
fn truncated_blob_is_rejected() {
    let key = DerivedKey::new([0x22; 32]);
    let blob = encrypt_text(&key, "secret").unwrap();

    let short = CipherBlob::from_bytes(blob.as_bytes()[..NONCE_LEN + TAG_LEN - 1].to_vec());
    assert!(matches!(
        decrypt(&key, &short),
        Err(CredVaultError::DecryptionFailed)
    ));

    assert!(matches!(
        decrypt(&key, &CipherBlob::from_bytes(Vec::new())),
        Err(CredVaultError::DecryptionFailed)
    ));
}

#[test]
fn base64_transport_preserves_blob() {
    let key = DerivedKey::new([0x33; 32]);
    let blob = encrypt_text(&key, "alice@example.com").unwrap();

    let restored = CipherBlob::from_base64(&blob.to_base64()).unwrap();
    assert_eq!(restored, blob);
    assert_eq!(decrypt_text(&key, &restored).unwrap(), "alice@example.com");

    assert!(matches!(
        CipherBlob::from_base64("not base64!!"),
        Err(CredVaultError::InvalidArgument(_))
    ));
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn derivation_is_deterministic() {
    let salt = [7u8; 32];
    let a = key_for("passphrase", &salt);
    let b = key_for("passphrase", &salt);
    assert_eq!(a.as_bytes(), b.as_bytes());
}

#[test]
fn different_passphrase_gives_different_key() {
    let salt = [7u8; 32];
    assert_ne!(
        key_for("passphrase", &salt).as_bytes(),
        key_for("passphrasf", &salt).as_bytes()
    );
}

#[test]
fn different_salt_gives_different_key() {
    assert_ne!(
        key_for("passphrase", &[1u8; 32]).as_bytes(),
        key_for("passphrase", &[2u8; 32]).as_bytes()
    );
}

#[test]
fn iteration_count_changes_key() {
    let salt = [9u8; 32];
    let a = derive_key(b"pw", &salt, &fast_params());
    let b = derive_key(
        b"pw",
        &salt,
        &KdfParams::pbkdf2_sha512(MIN_ITERATIONS + 1).unwrap(),
    );
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn empty_passphrase_still_derives() {
    let key = key_for("", &[0u8; 32]);
    assert_eq!(key.as_bytes().len(), 32);
}

#[test]
fn generated_salts_are_unique() {
    let a = generate_salt().unwrap();
    let b = generate_salt().unwrap();
    assert_eq!(a.len(), 32);
    assert_ne!(a, b);
}

#[test]
fn weak_iteration_count_is_rejected() {
    assert!(matches!(
        KdfParams::pbkdf2_sha512(MIN_ITERATIONS - 1),
        Err(CredVaultError::InvalidArgument(_))
    ));
}
