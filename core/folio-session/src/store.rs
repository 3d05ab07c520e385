//! File-backed persistence for the current session.
//!
//! The store holds exactly one credential/principal pair plus a one-shot
//! "session expired" marker. Every Folio process on the machine shares the
//! same files, and file modifications are how other processes learn about
//! login/logout (see [`crate::bridge`]).
//!
//! # File Format
//!
//! `session.json`:
//!
//! ```json
//! {
//!   "version": 1,
//!   "credential": "tok-abc",
//!   "principal": "alice",
//!   "saved_at": "2026-08-30T12:00:00Z"
//! }
//! ```
//!
//! The pair lives in one document written via temp file + rename, so a reader
//! can never observe a credential without its principal or vice versa.
//!
//! The flag file (`session-expired`) contains the literal string `true` when
//! set; any other content reads as unset.
//!
//! # Defensive Design
//!
//! Storage trouble must never take down the app, it only costs persistence:
//! - Missing, empty, or corrupt files read as "no session"
//! - Version mismatches read as "no session"
//! - Failed writes are logged and dropped; the in-memory session still works

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::storage::StorePaths;

const STORE_VERSION: u32 = 1;
const FLAG_SET: &str = "true";

/// The on-disk JSON structure for the session file.
///
/// Both fields are required: a document missing either one fails to parse and
/// the whole record reads as absent, which keeps the pair atomic even if a
/// foreign writer produces a partial file.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    /// Schema version. We only load files with version == 1.
    version: u32,
    credential: String,
    principal: String,
    saved_at: DateTime<Utc>,
}

/// Persistent store for the current session.
///
/// Cheap to clone; clones share the same underlying files.
#[derive(Debug, Clone)]
pub struct SessionStore {
    paths: StorePaths,
}

impl SessionStore {
    pub fn new(paths: StorePaths) -> Self {
        SessionStore { paths }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Persists the credential/principal pair atomically.
    ///
    /// Readers (including other processes) see either the previous pair or the
    /// new one, never a mix. Failures are logged and swallowed: the session
    /// simply won't survive a restart.
    pub fn write(&self, credential: &str, principal: &str) {
        if let Err(e) = self.paths.ensure_dirs() {
            warn!(error = %e, "Failed to create session store directory");
            return;
        }

        let record = SessionFile {
            version: STORE_VERSION,
            credential: credential.to_string(),
            principal: principal.to_string(),
            saved_at: Utc::now(),
        };

        let content = match serde_json::to_string_pretty(&record) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "Failed to serialize session record");
                return;
            }
        };

        if let Err(e) = persist_atomically(self.paths.root(), &self.paths.session_file(), &content)
        {
            warn!(error = %e, "Failed to write session file");
        }
    }

    /// Removes the persisted pair. Clearing an already-empty store is a no-op.
    pub fn clear(&self) {
        remove_if_present(&self.paths.session_file(), "session file");
    }

    pub fn read_credential(&self) -> Option<String> {
        self.load().map(|f| f.credential)
    }

    pub fn read_principal(&self) -> Option<String> {
        self.load().map(|f| f.principal)
    }

    /// Marks the session as forcibly ended. Only the invalidation path may
    /// call this; voluntary logout never sets the flag.
    pub(crate) fn set_flag(&self) {
        if let Err(e) = self.paths.ensure_dirs() {
            warn!(error = %e, "Failed to create session store directory");
            return;
        }
        if let Err(e) = fs::write(self.paths.expired_flag_file(), FLAG_SET) {
            warn!(error = %e, "Failed to write session-expired flag");
        }
    }

    /// Returns whether the one-shot expired marker is set.
    ///
    /// Only the exact content `true` counts; anything else reads as unset.
    pub fn read_flag(&self) -> bool {
        fs::read_to_string(self.paths.expired_flag_file())
            .map(|content| content.trim() == FLAG_SET)
            .unwrap_or(false)
    }

    pub fn clear_flag(&self) {
        remove_if_present(&self.paths.expired_flag_file(), "session-expired flag");
    }

    fn load(&self) -> Option<SessionFile> {
        let content = fs::read_to_string(self.paths.session_file()).ok()?;

        if content.trim().is_empty() {
            return None;
        }

        match serde_json::from_str::<SessionFile>(&content) {
            Ok(record) if record.version == STORE_VERSION => Some(record),
            Ok(record) => {
                warn!(
                    version = record.version,
                    "Unsupported session file version, treating as no session"
                );
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse session file, treating as no session");
                None
            }
        }
    }
}

fn persist_atomically(dir: &Path, target: &Path, content: &str) -> std::io::Result<()> {
    let mut temp_file = NamedTempFile::new_in(dir)?;
    temp_file.write_all(content.as_bytes())?;
    temp_file.flush()?;
    temp_file.persist(target).map_err(|e| e.error)?;
    Ok(())
}

fn remove_if_present(path: &Path, what: &str) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(error = %e, "Failed to remove {what}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(temp: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(StorePaths::with_root(temp.path().to_path_buf()))
    }

    #[test]
    fn test_empty_store_reads_absent() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        assert!(store.read_credential().is_none());
        assert!(store.read_principal().is_none());
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write("tok-1", "alice");
        assert_eq!(store.read_credential().as_deref(), Some("tok-1"));
        assert_eq!(store.read_principal().as_deref(), Some("alice"));
    }

    #[test]
    fn test_write_replaces_previous_pair() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write("tok-1", "alice");
        store.write("tok-2", "bob");
        assert_eq!(store.read_credential().as_deref(), Some("tok-2"));
        assert_eq!(store.read_principal().as_deref(), Some("bob"));
    }

    #[test]
    fn test_clear_removes_both() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write("tok-1", "alice");
        store.clear();
        assert!(store.read_credential().is_none());
        assert!(store.read_principal().is_none());
    }

    #[test]
    fn test_clear_on_empty_store_is_noop() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.clear();
        assert!(store.read_credential().is_none());
    }

    #[test]
    fn test_clones_share_the_same_files() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        let other = store.clone();
        store.write("tok-1", "alice");
        assert_eq!(other.read_credential().as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_empty_file_reads_absent() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        fs::write(store.paths().session_file(), "").unwrap();
        assert!(store.read_credential().is_none());
    }

    #[test]
    fn test_corrupt_json_reads_absent() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        fs::write(store.paths().session_file(), "{invalid json}").unwrap();
        assert!(store.read_credential().is_none());
        assert!(store.read_principal().is_none());
    }

    #[test]
    fn test_partial_record_reads_both_absent() {
        // A document with a credential but no principal must not expose a
        // half-present pair.
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        fs::write(
            store.paths().session_file(),
            r#"{"version":1,"credential":"tok-1","saved_at":"2026-08-30T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(store.read_credential().is_none());
        assert!(store.read_principal().is_none());
    }

    #[test]
    fn test_unsupported_version_reads_absent() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        fs::write(
            store.paths().session_file(),
            r#"{"version":2,"credential":"tok-1","principal":"alice","saved_at":"2026-08-30T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(store.read_credential().is_none());
    }

    #[test]
    fn test_flag_round_trip() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        assert!(!store.read_flag());
        store.set_flag();
        assert!(store.read_flag());
        store.clear_flag();
        assert!(!store.read_flag());
    }

    #[test]
    fn test_flag_with_unexpected_content_reads_unset() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        fs::write(store.paths().expired_flag_file(), "yes").unwrap();
        assert!(!store.read_flag());
    }

    #[test]
    fn test_clear_does_not_touch_flag() {
        let temp = tempdir().unwrap();
        let store = store_in(&temp);
        store.write("tok-1", "alice");
        store.set_flag();
        store.clear();
        assert!(store.read_flag());
    }
}
