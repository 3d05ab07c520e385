//! Storage path management for Folio session data.
//!
//! All path decisions are centralized in [`StorePaths`] so tests can inject a
//! temp directory and production code never hard-codes file locations. The
//! store root is shared by every Folio process on the machine; it is the only
//! shared mutable resource in the session subsystem.

use std::path::{Path, PathBuf};

/// Central configuration for session storage paths.
///
/// Production code uses `StorePaths::default()` which points to `~/.folio/`.
/// Tests use `StorePaths::with_root(temp_dir)` for isolation.
#[derive(Debug, Clone)]
pub struct StorePaths {
    /// Root directory for all Folio session data (default: ~/.folio)
    root: PathBuf,
}

impl Default for StorePaths {
    fn default() -> Self {
        let home = dirs::home_dir().expect("Could not find home directory");
        Self {
            root: home.join(".folio"),
        }
    }
}

impl StorePaths {
    /// Creates a StorePaths with a custom root directory.
    /// Used for testing with temp directories.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the root directory for session data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to session.json (the persisted credential/principal pair).
    pub fn session_file(&self) -> PathBuf {
        self.root.join("session.json")
    }

    /// Path to the one-shot expired-session marker file.
    pub fn expired_flag_file(&self) -> PathBuf {
        self.root.join("session-expired")
    }

    /// Ensures the root directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        fs_err::create_dir_all(&self.root)
    }
}
