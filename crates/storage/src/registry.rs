//! Path-keyed registry of catalog stores.
//!
//! Every open or create of the same normalized path binds to one shared
//! [`DbState`], so writes through one database handle are visible through
//! all others. Stores are retained after their last handle closes; only
//! [`StoreRegistry::evict`] or dropping the registry releases them.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::catalog::DbState;
use crate::error::{Error, Result};

pub type SharedStore = Arc<Mutex<DbState>>;

#[derive(Default)]
pub struct StoreRegistry {
    stores: HashMap<PathBuf, SharedStore>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to the store cached for `path`, or start an empty one when the
    /// path exists on disk.
    pub fn open(&mut self, path: &str) -> Result<SharedStore> {
        let root = normalize_path(path)?;
        if let Some(store) = self.stores.get(&root) {
            debug!(path = %root.display(), "reusing cached store");
            return Ok(Arc::clone(store));
        }
        if !root.exists() {
            return Err(Error::not_found("database path does not exist"));
        }
        info!(path = %root.display(), "opening store");
        let store = Arc::new(Mutex::new(DbState::new(root.clone())));
        self.stores.insert(root, Arc::clone(&store));
        Ok(store)
    }

    /// Create the directory if needed and install a fresh store for the
    /// path, replacing any cached one. Handles bound to the old store keep
    /// using it.
    pub fn create(&mut self, path: &str) -> Result<SharedStore> {
        let root = normalize_path(path)?;
        ensure_dir(&root)?;
        info!(path = %root.display(), "creating store");
        let store = Arc::new(Mutex::new(DbState::new(root.clone())));
        if self.stores.insert(root, Arc::clone(&store)).is_some() {
            debug!("replaced previously cached store");
        }
        Ok(store)
    }

    /// Drop the cached store for `path`. Returns whether one was cached.
    pub fn evict(&mut self, path: &str) -> Result<bool> {
        let root = normalize_path(path)?;
        Ok(self.stores.remove(&root).is_some())
    }

    pub fn contains(&self, path: &str) -> bool {
        normalize_path(path).map_or(false, |root| self.stores.contains_key(&root))
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

fn ensure_dir(root: &Path) -> Result<()> {
    if root.exists() {
        if root.is_dir() {
            return Ok(());
        }
        return Err(Error::Internal("failed to create database directory".to_string()));
    }
    std::fs::create_dir_all(root)
        .map_err(|e| Error::Internal(format!("failed to create database directory: {e}")))
}

/// Absolute, lexically normalized form of `path`: `.` segments dropped,
/// `..` segments folded into their parent. No filesystem access besides
/// reading the current directory for relative input.
pub fn normalize_path(path: &str) -> Result<PathBuf> {
    if path.trim().is_empty() {
        return Err(Error::invalid("path missing"));
    }
    let raw = Path::new(path);
    let absolute = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        std::env::current_dir()?.join(raw)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}
