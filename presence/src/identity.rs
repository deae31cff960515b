//! Durable per-client session identity.
//!
//! One id per client installation, persisted in a local file so it survives
//! process restarts ("reloads"). The id is owned by this service instance
//! and cached after the first read; nothing else in the crate touches the
//! backing file. Clearing it forces the next login onto a fresh session id
//! instead of resurrecting the old one.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::types::SessionId;

pub struct IdentityStore {
    path: PathBuf,
    cached: Mutex<Option<SessionId>>,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: Mutex::new(None),
        }
    }

    /// Returns the persisted session id, generating and persisting a fresh
    /// one when none is stored. Reads the file once per process lifetime;
    /// later calls hit the cache. A stored value that cannot be read or does
    /// not parse is discarded with a warning and replaced; operating on a
    /// corrupt id is never an option.
    pub fn get_or_create(&self) -> anyhow::Result<SessionId> {
        let mut cached = match self.cached.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let id = match self.read_persisted() {
            Some(id) => id,
            None => {
                let id = SessionId::generate();
                self.persist(&id)?;
                id
            }
        };
        *cached = Some(id.clone());
        Ok(id)
    }

    /// Removes the persisted id so the next `get_or_create` issues a new
    /// one. Called on explicit logout.
    pub fn clear(&self) -> anyhow::Result<()> {
        let mut cached = match self.cached.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *cached = None;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn read_persisted(&self) -> Option<SessionId> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Stored session id is unreadable; generating a fresh one"
                );
                return None;
            }
        };

        let trimmed = raw.trim();
        if !SessionId::is_well_formed(trimmed) {
            tracing::warn!(
                path = %self.path.display(),
                "Stored session id does not parse; generating a fresh one"
            );
            return None;
        }
        trimmed.parse().ok()
    }

    fn persist(&self, id: &SessionId) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, format!("{id}\n"))?;
        Ok(())
    }
}
