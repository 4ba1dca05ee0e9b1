//! Audit trail of vault operations, kept in `<vault_dir>/audit.db`.
//!
//! Each event records what happened to which vault file and when.
//! Credential fields never reach this table; `detail` carries only counts,
//! indices or an outcome such as `rejected`.
//!
//! The log is best-effort. A database that cannot be opened or written
//! is reported through `tracing` and the vault operation carries on.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::cli::{Cli, VaultPaths};
use crate::errors::{CredVaultError, Result};

const DB_FILE: &str = "audit.db";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS events (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    at      TEXT NOT NULL,
    op      TEXT NOT NULL,
    vault   TEXT NOT NULL,
    detail  TEXT
);
CREATE INDEX IF NOT EXISTS events_at ON events (at);";

/// One recorded event, newest first when returned by [`AuditLog::query`].
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub vault: String,
    pub details: Option<String>,
}

impl AuditEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let at: String = row.get(1)?;
        let timestamp = DateTime::parse_from_rfc3339(&at)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
            })?
            .with_timezone(&Utc);

        Ok(Self {
            id: row.get(0)?,
            timestamp,
            operation: row.get(2)?,
            vault: row.get(3)?,
            details: row.get(4)?,
        })
    }

    /// Whether this event is a refused unlock attempt.
    pub fn is_rejected_unlock(&self) -> bool {
        self.operation == "unlock" && self.details.as_deref() == Some("rejected")
    }
}

/// Handle to the audit database of one vault directory.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open the database under `vault_dir`, creating it on first use.
    ///
    /// `None` means auditing is unavailable for this run.
    pub fn open(vault_dir: &Path) -> Option<Self> {
        let path = Self::db_path(vault_dir);
        match Self::open_at(&path) {
            Ok(log) => Some(log),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "audit log unavailable");
                None
            }
        }
    }

    fn open_at(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
        }

        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Append an event. Failures are traced, never returned.
    pub fn log(&self, operation: &str, vault: &str, details: Option<&str>) {
        let inserted = self.conn.execute(
            "INSERT INTO events (at, op, vault, detail) VALUES (?1, ?2, ?3, ?4)",
            params![Utc::now().to_rfc3339(), operation, vault, details],
        );
        if let Err(e) = inserted {
            tracing::debug!(operation, error = %e, "audit insert failed");
        }
    }

    /// Up to `limit` most recent events, optionally only those at or
    /// after `since`.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let since = since.map(|ts| ts.to_rfc3339());
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, at, op, vault, detail FROM events
                 WHERE ?1 IS NULL OR at >= ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )
            .map_err(|e| CredVaultError::AuditError(format!("prepare: {e}")))?;

        let entries = stmt
            .query_map(params![since, limit], AuditEntry::from_row)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| CredVaultError::AuditError(format!("read events: {e}")))?;

        Ok(entries)
    }

    pub fn db_path(vault_dir: &Path) -> PathBuf {
        vault_dir.join(DB_FILE)
    }
}

/// Record `op` against the vault the CLI is pointed at.
///
/// Does nothing if the vault directory cannot be resolved or opened.
pub fn log_audit(cli: &Cli, op: &str, details: Option<&str>) {
    let Ok(paths) = VaultPaths::resolve(cli) else {
        return;
    };
    if !paths.vault_dir.is_dir() {
        return;
    }
    if let Some(log) = AuditLog::open(&paths.vault_dir) {
        log.log(op, &paths.vault_name(), details);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn fresh() -> (TempDir, AuditLog) {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::open(dir.path()).unwrap();
        (dir, log)
    }

    #[test]
    fn creates_database_file() {
        let (dir, _log) = fresh();
        assert!(AuditLog::db_path(dir.path()).exists());
    }

    #[test]
    fn newest_events_come_first() {
        let (_dir, log) = fresh();
        log.log("unlock", "vault.json", None);
        log.log("add", "vault.json", Some("1 total"));
        log.log("remove", "vault.json", Some("index 0"));

        let ops: Vec<String> = log
            .query(10, None)
            .unwrap()
            .into_iter()
            .map(|e| e.operation)
            .collect();
        assert_eq!(ops, ["remove", "add", "unlock"]);
    }

    #[test]
    fn limit_caps_result() {
        let (_dir, log) = fresh();
        for i in 0..6 {
            log.log("add", "vault.json", Some(&format!("{i} total")));
        }
        let entries = log.query(2, None).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].details.as_deref(), Some("5 total"));
    }

    #[test]
    fn since_filters_older_events() {
        let (_dir, log) = fresh();
        log.log("init", "vault.json", None);

        let hour_ago = Utc::now() - Duration::hours(1);
        let in_an_hour = Utc::now() + Duration::hours(1);
        assert_eq!(log.query(10, Some(hour_ago)).unwrap().len(), 1);
        assert!(log.query(10, Some(in_an_hour)).unwrap().is_empty());
    }

    #[test]
    fn rejected_unlock_is_flagged() {
        let (_dir, log) = fresh();
        log.log("unlock", "work.json", Some("rejected"));
        log.log("unlock", "work.json", None);

        let entries = log.query(10, None).unwrap();
        assert!(!entries[0].is_rejected_unlock());
        assert!(entries[1].is_rejected_unlock());
        assert_eq!(entries[1].vault, "work.json");
    }

    #[test]
    fn missing_directory_disables_logging() {
        assert!(AuditLog::open(Path::new("/nonexistent/credvault/dir")).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn database_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, _log) = fresh();
        let mode = std::fs::metadata(AuditLog::db_path(dir.path()))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
