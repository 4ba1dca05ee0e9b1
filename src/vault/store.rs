//! The vault engine: credential collection plus the lock state machine.
//!
//! `VaultStore` owns the sealed credentials, the per-vault salt and KDF
//! settings, and (only while unlocked) a [`Session`] holding the derived
//! key and the decrypted triples.  Callers hold the store by value or in
//! an `Arc`; there is no process-wide instance.
//!
//! Mutations (`unlock`, `lock`, `add_credential`, `remove_credential`,
//! `rotate_passphrase`) take the write half of a fair `tokio` RwLock, so
//! concurrent callers are queued FIFO and never observe a torn state.
//! Reads share the read half.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinSet;
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::generator::{self, Alphabet};
use crate::crypto::kdf::{derive_key, generate_salt, DerivedKey, KdfParams};
use crate::errors::{CredVaultError, Result};

use super::credential::{PlainCredential, SealedCredential};
use super::format::{PersistedVault, CURRENT_VERSION};

/// Externally observable lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultStatus {
    Locked,
    /// A passphrase check is in flight.
    Unlocking,
    Unlocked,
}

impl VaultStatus {
    fn as_u8(self) -> u8 {
        match self {
            Self::Locked => 0,
            Self::Unlocking => 1,
            Self::Unlocked => 2,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Unlocking,
            2 => Self::Unlocked,
            _ => Self::Locked,
        }
    }
}

/// Secret material for one unlocked period.
///
/// `plain[i]` is the decrypted form of `VaultState::sealed[i]`.
struct Session {
    key: Arc<DerivedKey>,
    plain: Vec<PlainCredential>,
}

impl Drop for Session {
    fn drop(&mut self) {
        // The key wipes itself once its last handle is dropped.
        self.plain.zeroize();
    }
}

struct VaultState {
    salt: Vec<u8>,
    kdf: KdfParams,
    sealed: Vec<SealedCredential>,
    session: Option<Session>,
}

impl VaultState {
    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(CredVaultError::VaultLocked)
    }
}

/// Sets the status to `Unlocking` and puts the previous status back
/// unless the caller commits a new one.  Runs on every exit path,
/// including a dropped future.
struct StatusGuard<'a> {
    status: &'a AtomicU8,
    restore: VaultStatus,
    committed: bool,
}

impl<'a> StatusGuard<'a> {
    fn enter(status: &'a AtomicU8) -> Self {
        let restore = VaultStatus::from_u8(status.load(Ordering::Acquire));
        status.store(VaultStatus::Unlocking.as_u8(), Ordering::Release);
        Self {
            status,
            restore,
            committed: false,
        }
    }

    fn commit(mut self, next: VaultStatus) {
        self.status.store(next.as_u8(), Ordering::Release);
        self.committed = true;
    }
}

impl Drop for StatusGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.status.store(self.restore.as_u8(), Ordering::Release);
        }
    }
}

/// The vault handle.  Build one with [`VaultStore::new`] or
/// [`VaultStore::load`]; it always starts locked.
pub struct VaultStore {
    state: RwLock<VaultState>,
    status: AtomicU8,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create an empty, locked vault with a fresh random salt.
    pub fn new(kdf: KdfParams) -> Result<Self> {
        kdf.validate()?;
        let salt = generate_salt()?;
        Ok(Self::from_state(VaultState {
            salt: salt.to_vec(),
            kdf,
            sealed: Vec::new(),
            session: None,
        }))
    }

    /// Rebuild a locked vault from its persisted record.
    ///
    /// Only ciphertext is restored; the `locked` flag in the record is
    /// ignored and the store always starts locked.
    pub fn load(record: PersistedVault) -> Result<Self> {
        record.validate()?;
        tracing::debug!(entries = record.creds.len(), "loaded vault record");
        Ok(Self::from_state(VaultState {
            salt: record.salt,
            kdf: record.kdf,
            sealed: record.creds,
            session: None,
        }))
    }

    fn from_state(state: VaultState) -> Self {
        Self {
            state: RwLock::new(state),
            status: AtomicU8::new(VaultStatus::Locked.as_u8()),
        }
    }

    // ------------------------------------------------------------------
    // Lock state machine
    // ------------------------------------------------------------------

    /// Unlock the vault with `passphrase`.
    ///
    /// Derives the key, decrypts every field of every entry concurrently,
    /// and commits only if all of them verify.  On any failure the vault
    /// is left exactly as it was and `IncorrectPassphrase` is returned.
    pub async fn unlock(&self, passphrase: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let guard = StatusGuard::enter(&self.status);

        let key = Arc::new(derive_in_background(passphrase, &state.salt, state.kdf).await?);

        let plain = match open_all(&key, &state.sealed).await {
            Ok(plain) => plain,
            Err(CredVaultError::DecryptionFailed) => {
                tracing::warn!(entries = state.sealed.len(), "unlock rejected");
                return Err(CredVaultError::IncorrectPassphrase);
            }
            Err(e) => return Err(e),
        };

        // Replacing an existing session drops (and wipes) the old one.
        state.session = Some(Session { key, plain });
        guard.commit(VaultStatus::Unlocked);

        tracing::debug!(entries = state.sealed.len(), "vault unlocked");
        Ok(())
    }

    /// Lock the vault, wiping the session key and all cached plaintext.
    pub async fn lock(&self) {
        let mut state = self.state.write().await;
        if let Some(session) = state.session.take() {
            drop(session);
            tracing::debug!("vault locked");
        }
        self.status
            .store(VaultStatus::Locked.as_u8(), Ordering::Release);
    }

    /// Current lock state.  Never waits on an in-flight mutation.
    pub fn status(&self) -> VaultStatus {
        VaultStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn is_locked(&self) -> bool {
        self.status() != VaultStatus::Unlocked
    }

    // ------------------------------------------------------------------
    // Credential operations
    // ------------------------------------------------------------------

    /// Encrypt and append a new credential.  Requires an unlocked vault.
    ///
    /// The caller is responsible for persisting the vault afterwards.
    pub async fn add_credential(&self, domain: &str, username: &str, password: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let key = Arc::clone(&state.session()?.key);

        let plain = PlainCredential::new(domain, username, password);
        let (plain, sealed) = tokio::task::spawn_blocking(move || {
            let sealed = plain.seal(&key)?;
            Ok::<_, CredVaultError>((plain, sealed))
        })
        .await??;

        let state = &mut *state;
        let session = state.session.as_mut().ok_or(CredVaultError::VaultLocked)?;
        state.sealed.push(sealed);
        session.plain.push(plain);

        tracing::debug!(entries = state.sealed.len(), "credential added");
        Ok(())
    }

    /// Remove the credential at `index`.  Requires an unlocked vault.
    pub async fn remove_credential(&self, index: usize) -> Result<()> {
        let mut state = self.state.write().await;
        let state = &mut *state;
        let session = state.session.as_mut().ok_or(CredVaultError::VaultLocked)?;
        if index >= state.sealed.len() {
            return Err(CredVaultError::CredentialNotFound(index));
        }

        state.sealed.remove(index);
        drop(session.plain.remove(index));

        tracing::debug!(index, entries = state.sealed.len(), "credential removed");
        Ok(())
    }

    /// Decrypted credentials in insertion order.  Requires an unlocked vault.
    pub async fn list_credentials(&self) -> Result<Vec<PlainCredential>> {
        let state = self.state.read().await;
        Ok(state.session()?.plain.clone())
    }

    /// Number of stored credentials (locked or not).
    pub async fn credential_count(&self) -> usize {
        self.state.read().await.sealed.len()
    }

    /// Re-seal every credential under `new_passphrase` and a fresh salt.
    ///
    /// Requires an unlocked vault.  Nothing changes unless every field
    /// re-encrypts successfully.
    pub async fn rotate_passphrase(&self, new_passphrase: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let plain = state.session()?.plain.clone();

        let salt = generate_salt()?;
        let key = Arc::new(derive_in_background(new_passphrase, &salt, state.kdf).await?);

        let task_key = Arc::clone(&key);
        let sealed = tokio::task::spawn_blocking(move || {
            plain
                .iter()
                .map(|entry| entry.seal(&task_key))
                .collect::<Result<Vec<_>>>()
        })
        .await??;

        let state = &mut *state;
        let session = state.session.as_mut().ok_or(CredVaultError::VaultLocked)?;
        state.salt = salt.to_vec();
        state.sealed = sealed;
        session.key = key;

        tracing::debug!(entries = state.sealed.len(), "passphrase rotated");
        Ok(())
    }

    /// Generate a password with the default alphabet.
    ///
    /// Independent of the lock state.
    pub fn generate_password(length: usize) -> Result<String> {
        generator::generate_password(length)
    }

    /// Generate a password from a custom alphabet.
    pub fn generate_password_with(length: usize, alphabet: &Alphabet) -> Result<String> {
        generator::generate(length, alphabet)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Project the vault onto its persisted, ciphertext-only record.
    pub async fn serialize(&self) -> PersistedVault {
        let state = self.state.read().await;
        PersistedVault {
            version: CURRENT_VERSION,
            locked: state.session.is_none(),
            salt: state.salt.clone(),
            kdf: state.kdf,
            creds: state.sealed.clone(),
        }
    }
}

/// Run the (deliberately slow) KDF on a blocking worker.
async fn derive_in_background(passphrase: &str, salt: &[u8], kdf: KdfParams) -> Result<DerivedKey> {
    let passphrase = Zeroizing::new(passphrase.as_bytes().to_vec());
    let salt = salt.to_vec();
    let key = tokio::task::spawn_blocking(move || derive_key(&passphrase, &salt, &kdf)).await?;
    Ok(key)
}

/// Decrypt every entry concurrently and collect all results before
/// deciding.  Tasks only read; nothing is committed here.
async fn open_all(
    key: &Arc<DerivedKey>,
    sealed: &[SealedCredential],
) -> Result<Vec<PlainCredential>> {
    let mut tasks = JoinSet::new();
    for (index, entry) in sealed.iter().cloned().enumerate() {
        let key = Arc::clone(key);
        tasks.spawn_blocking(move || (index, entry.open(&key)));
    }

    let mut opened: Vec<Option<PlainCredential>> = Vec::with_capacity(sealed.len());
    opened.resize_with(sealed.len(), || None);
    let mut failed = 0usize;

    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined?;
        match result {
            Ok(plain) => opened[index] = Some(plain),
            Err(_) => {
                tracing::debug!(index, "entry failed authentication");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(CredVaultError::DecryptionFailed);
    }

    opened
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or(CredVaultError::DecryptionFailed)
}
