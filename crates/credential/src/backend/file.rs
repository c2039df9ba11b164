//! TOML file credential store
//!
//! The whole store is one TOML document. Each call loads it from disk, applies
//! the change and writes it back; nothing is kept in memory between calls.

use super::document::Document;
use super::{
    CloudRegistry, CredentialKey, CredentialStore, CredentialWrite, StoreError, StoreResult,
};
use crate::types::RemoteCredential;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Credential store backed by a TOML file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    registry: CloudRegistry,
    // Serializes load-modify-save between threads of this process
    lock: Mutex<()>,
}

impl FileStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            registry: CloudRegistry::default(),
            lock: Mutex::new(()),
        }
    }

    /// Restrict creates to the clouds of a registry
    pub fn with_registry(mut self, registry: CloudRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Load the store document; a missing file is an empty store
    pub fn load(&self) -> StoreResult<Document> {
        if !self.path.exists() {
            log::debug!(
                "Credential store {} does not exist, using empty store",
                self.path.display()
            );
            return Ok(Document::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        let document = toml::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        log::debug!("Loaded credential store from {}", self.path.display());
        Ok(document)
    }

    fn save(&self, document: &Document) -> StoreResult<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let content = toml::to_string_pretty(document)?;
        fs::write(&self.path, content).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        log::debug!("Saved credential store to {}", self.path.display());
        Ok(())
    }

    fn modify<T>(&self, f: impl FnOnce(&mut Document) -> StoreResult<T>) -> StoreResult<T> {
        let _guard = self.guard();
        let mut document = self.load()?;
        let out = f(&mut document)?;
        self.save(&document)?;
        Ok(out)
    }
}

impl CredentialStore for FileStore {
    fn create_credential(&self, input: &CredentialWrite) -> StoreResult<String> {
        self.modify(|doc| doc.create(&self.registry, input))
    }

    fn read_credential(&self, key: &CredentialKey) -> StoreResult<RemoteCredential> {
        let _guard = self.guard();
        self.load()?.read(key)
    }

    fn update_credential(&self, input: &CredentialWrite) -> StoreResult<()> {
        self.modify(|doc| doc.update(input))
    }

    fn destroy_credential(&self, key: &CredentialKey) -> StoreResult<()> {
        self.modify(|doc| doc.destroy(key))
    }
}
