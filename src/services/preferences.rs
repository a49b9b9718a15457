// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local string key-value preferences.

use dashmap::DashMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{AppError, Result};

/// Key under which the signed-in participant's username is stored.
pub const USERNAME_KEY: &str = "username";

/// Persistent string key-value store.
pub trait Preferences: Send + Sync {
    fn get_string(&self, key: &str) -> Result<Option<String>>;
    fn put_string(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Non-persistent preferences.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: DashMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Preferences for MemoryPreferences {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).map(|v| v.clone()))
    }

    fn put_string(&self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Preferences persisted as a flat JSON object.
///
/// The whole file is rewritten on every change.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FilePreferences {
    /// Open the store at `path`. A missing file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| AppError::data_integrity("Preferences", e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "Failed to read preferences {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        tracing::debug!(path = %path.display(), entries = values.len(), "Preferences loaded");

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply a change and persist it. Memory is only updated once the file
    /// write succeeded.
    fn update(&self, apply: impl FnOnce(&mut HashMap<String, String>)) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut next = values.clone();
        apply(&mut next);

        let raw = serde_json::to_string_pretty(&next)
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;
        std::fs::write(&self.path, raw).map_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write preferences");
            AppError::Internal(anyhow::anyhow!(
                "Failed to write preferences {}: {}",
                self.path.display(),
                e
            ))
        })?;

        *values = next;
        Ok(())
    }
}

impl Preferences for FilePreferences {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(values.get(key).cloned())
    }

    fn put_string(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}
