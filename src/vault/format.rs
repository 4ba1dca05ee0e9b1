//! Persisted vault record and the JSON file backend.
//!
//! The record is the only thing ever written to durable storage:
//!
//! ```text
//! {
//!   "version": 1,
//!   "locked": true,
//!   "salt": "<base64>",
//!   "kdf": { "algorithm": "pbkdf2-hmac-sha512", "iterations": 250000 },
//!   "creds": [ { "domainCipher": "..", "usernameCipher": "..", "passwordCipher": ".." } ]
//! }
//! ```
//!
//! It contains ciphertext only.  `locked` mirrors the last observed
//! state and is advisory; nothing relies on it for safety.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::credential::SealedCredential;
use crate::crypto::kdf::{KdfParams, SALT_LEN};
use crate::errors::{CredVaultError, Result};

/// Current record format version.
pub const CURRENT_VERSION: u8 = 1;

/// The serializable, ciphertext-only shape of a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedVault {
    /// Format version.
    pub version: u8,

    /// Lock state when the record was produced (advisory).
    pub locked: bool,

    /// Per-vault KDF salt (base64 in JSON).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// KDF settings the vault was sealed with.
    /// Optional on read; older records fall back to the defaults.
    #[serde(default)]
    pub kdf: KdfParams,

    /// Encrypted entries in insertion order.
    #[serde(default)]
    pub creds: Vec<SealedCredential>,
}

impl PersistedVault {
    /// Structural checks that do not need a key.
    pub fn validate(&self) -> Result<()> {
        if self.version != CURRENT_VERSION {
            return Err(CredVaultError::InvalidArgument(format!(
                "unsupported vault version {}, expected {CURRENT_VERSION}",
                self.version
            )));
        }
        if self.salt.len() != SALT_LEN {
            return Err(CredVaultError::InvalidArgument(format!(
                "vault salt must be {SALT_LEN} bytes (got {})",
                self.salt.len()
            )));
        }
        self.kdf.validate()
    }

    /// Parse a record from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let record: Self = serde_json::from_str(json)
            .map_err(|e| CredVaultError::InvalidArgument(format!("malformed vault record: {e}")))?;
        record.validate()?;
        Ok(record)
    }

    /// Render the record as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CredVaultError::SerializationError(format!("vault record: {e}")))
    }
}

/// Write a vault record to disk **atomically**.
///
/// Writes to a temp file in the same directory and renames it over the
/// target, so readers never see a half-written vault.
pub fn write_vault(path: &Path, record: &PersistedVault) -> Result<()> {
    let json = record.to_json()?;

    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    if let Err(e) = write_owner_only(&tmp_path, json.as_bytes())
        .and_then(|()| fs::rename(&tmp_path, path))
    {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    tracing::debug!(
        path = %path.display(),
        entries = record.creds.len(),
        "wrote vault record"
    );
    Ok(())
}

/// Create `path` readable by the owner only, then write and sync `bytes`.
///
/// A leftover file from an interrupted write is replaced, never reused,
/// so it cannot carry looser permissions over.
fn write_owner_only(path: &Path, bytes: &[u8]) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Read and validate a vault record from disk.
pub fn read_vault(path: &Path) -> Result<PersistedVault> {
    if !path.exists() {
        return Err(CredVaultError::VaultNotFound(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path)?;
    let record = PersistedVault::from_json(&contents)?;

    tracing::debug!(
        path = %path.display(),
        entries = record.creds.len(),
        "read vault record"
    );
    Ok(record)
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn empty_record() -> PersistedVault {
        PersistedVault {
            version: CURRENT_VERSION,
            locked: true,
            salt: vec![9u8; SALT_LEN],
            kdf: KdfParams::default(),
            creds: Vec::new(),
        }
    }

    #[test]
    fn json_roundtrip_preserves_record() {
        let record = empty_record();
        let json = record.to_json().unwrap();
        assert_eq!(PersistedVault::from_json(&json).unwrap(), record);
    }

    #[test]
    fn missing_kdf_uses_defaults() {
        let json = format!(
            r#"{{"version":1,"locked":true,"salt":"{}","creds":[]}}"#,
            BASE64.encode([1u8; SALT_LEN])
        );
        let record = PersistedVault::from_json(&json).unwrap();
        assert_eq!(record.kdf, KdfParams::default());
    }

    #[test]
    fn missing_salt_is_rejected() {
        let err = PersistedVault::from_json(r#"{"version":1,"locked":true,"creds":[]}"#);
        assert!(matches!(err, Err(CredVaultError::InvalidArgument(_))));
    }

    #[test]
    fn short_salt_is_rejected() {
        let mut record = empty_record();
        record.salt = vec![1, 2, 3];
        assert!(record.validate().is_err());
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut record = empty_record();
        record.version = 2;
        assert!(record.validate().is_err());
    }

    #[test]
    fn weak_kdf_is_rejected() {
        let mut record = empty_record();
        record.kdf.iterations = 1;
        assert!(record.validate().is_err());
    }

    #[test]
    fn garbage_json_is_invalid_argument() {
        assert!(matches!(
            PersistedVault::from_json("{not json"),
            Err(CredVaultError::InvalidArgument(_))
        ));
    }

    #[test]
    fn bad_blob_base64_is_invalid_argument() {
        let json = format!(
            r#"{{"version":1,"locked":true,"salt":"{}","creds":[{{"domainCipher":"@@","usernameCipher":"","passwordCipher":""}}]}}"#,
            BASE64.encode([1u8; SALT_LEN])
        );
        assert!(matches!(
            PersistedVault::from_json(&json),
            Err(CredVaultError::InvalidArgument(_))
        ));
    }

    #[test]
    fn write_then_read_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.json");
        let record = empty_record();

        write_vault(&path, &record).unwrap();
        assert_eq!(read_vault(&path).unwrap(), record);

        // No temp file is left behind.
        assert!(!dir.path().join(".vault.json.tmp").exists());
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_vault(&dir.path().join("nope.json")),
            Err(CredVaultError::VaultNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn vault_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.json");
        write_vault(&path, &empty_record()).unwrap();

        let perms = fs::metadata(&path).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        // A non-empty directory where the vault file should go.
        let path = dir.path().join("vault.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        assert!(matches!(
            write_vault(&path, &empty_record()),
            Err(CredVaultError::Io(_))
        ));
        assert!(!dir.path().join(".vault.json.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn stale_temp_file_does_not_keep_open_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let tmp = dir.path().join(".vault.json.tmp");
        fs::write(&tmp, b"stale").unwrap();
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o644)).unwrap();

        let path = dir.path().join("vault.json");
        write_vault(&path, &empty_record()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(read_vault(&path).unwrap(), empty_record());
    }
}
