//! User persistence.
//!
//! Users are stored as a single versioned JSON document that is rewritten in
//! full on every save. Durability is best-effort: [`UserStore::save`] logs
//! and swallows write failures, and [`UserStore::load`] falls back to an
//! empty list when the document cannot be read.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::User;

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Default store file name inside the data directory.
pub const DEFAULT_USERS_FILE: &str = "users.json";

/// Accounts handed out when no store exists yet.
pub fn default_users() -> Vec<User> {
    vec![
        User::new("Dharani", "dharani@gmail.com"),
        User::new("Pavi", "pavi@gmail.com"),
        User::new("Aravind", "aravind@gmail.com"),
        User::new("Jaiwin", "jaiwin@gmail.com"),
    ]
}

#[derive(Debug, Serialize, Deserialize)]
struct StorePayload {
    version: u32,
    saved_at: DateTime<Utc>,
    #[serde(default)]
    users: Vec<User>,
}

/// Reads and writes the user collection at a fixed path.
#[derive(Debug, Clone)]
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load users, degrading instead of failing.
    ///
    /// A missing store yields [`default_users`]; an unreadable one yields an
    /// empty list.
    pub fn load(&self) -> Vec<User> {
        match self.try_load() {
            Ok(Some(users)) => {
                info!(count = users.len(), path = %self.path.display(), "Loaded users");
                users
            }
            Ok(None) => {
                info!(path = %self.path.display(), "No user store yet; using defaults");
                default_users()
            }
            Err(err) => {
                warn!(path = %self.path.display(), "Discarding unreadable user store: {err:#}");
                Vec::new()
            }
        }
    }

    /// Persist users, logging rather than returning any failure.
    pub fn save(&self, users: &[User]) {
        if let Err(err) = self.try_save(users) {
            warn!(path = %self.path.display(), "Failed to save users: {err:#}");
        }
    }

    /// Read the store, returning `None` if it does not exist.
    ///
    /// Only `NotFound` counts as absent; any other stat failure is an error.
    pub fn try_load(&self) -> Result<Option<Vec<User>>> {
        match fs::metadata(&self.path) {
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("failed to stat {}", self.path.display()))
            }
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let payload: StorePayload = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        if payload.version != FORMAT_VERSION {
            bail!(
                "unsupported user store version {} in {}",
                payload.version,
                self.path.display()
            );
        }
        Ok(Some(payload.users))
    }

    /// Overwrite the store with `users`, creating parent directories if needed.
    pub fn try_save(&self, users: &[User]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let payload = StorePayload {
            version: FORMAT_VERSION,
            saved_at: Utc::now(),
            users: users.to_vec(),
        };
        let serialised = serde_json::to_vec_pretty(&payload).context("failed to serialise users")?;
        fs::write(&self.path, serialised)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}
