//! Bearer credential storage and session resolution.
//!
//! Stores the access token in `<base>/token.json` with restricted permissions (0600).
//! Tokens are never logged or displayed in full.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// An opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token. Blank input yields `None`.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Short form safe for display (`abcd…`).
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{prefix}…")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.redacted())
    }
}

/// Credential as persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub saved_at: DateTime<Utc>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// File-backed credential store.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(paths::token_path())
    }
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored credential.
    /// Returns `None` if nothing has been saved yet.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Option<StoredCredential>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credential from {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .map(Some)
            .with_context(|| format!("Failed to parse credential from {}", self.path.display()))
    }

    /// Saves the credential with restricted permissions (0600).
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, credential: &StoredCredential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(credential).context("Failed to serialize credential")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
            // `mode` only applies on creation; tighten files left behind with looser bits.
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).with_context(
                || format!("Failed to set permissions on {}", self.path.display()),
            )?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        tracing::debug!(path = %self.path.display(), "Saved credential");
        Ok(())
    }

    /// Removes the stored credential. Returns whether one existed.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        Ok(true)
    }
}

/// Per-invocation authentication context passed into every operation.
#[derive(Debug, Clone, Default)]
pub struct Session {
    credential: Option<Credential>,
}

impl Session {
    /// A session with no credential.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
        }
    }

    /// Resolves the session credential: explicit token > stored credential.
    ///
    /// # Errors
    /// Returns an error if the stored credential file is unreadable.
    pub fn resolve(explicit: Option<&str>, store: &CredentialStore) -> Result<Self> {
        if let Some(credential) = explicit.and_then(Credential::new) {
            return Ok(Self::with_credential(credential));
        }

        let stored = store.load()?;
        Ok(Self {
            credential: stored.and_then(|s| Credential::new(&s.access_token)),
        })
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }
}
