//! Credential store abstraction.
//!
//! The [`CredentialStore`] trait is the only way the reconciler talks to the
//! system that actually owns credentials, allowing for different
//! implementations (a TOML file, an in-memory store for tests, a remote API).

pub mod document;
pub mod file;
pub mod memory;

use crate::types::RemoteCredential;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

pub use file::FileStore;
pub use memory::{MemoryStore, StoreCall, StoreOp};

/// Addressing coordinates of a stored credential
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialKey {
    pub name: String,
    pub cloud: String,
    pub client_scope: bool,
    pub controller_scope: bool,
}

impl CredentialKey {
    pub fn new(
        name: impl Into<String>,
        cloud: impl Into<String>,
        client_scope: bool,
        controller_scope: bool,
    ) -> Self {
        Self {
            name: name.into(),
            cloud: cloud.into(),
            client_scope,
            controller_scope,
        }
    }

    /// Scopes this key is flagged for
    pub fn scopes(&self) -> Vec<Scope> {
        let mut scopes = Vec::with_capacity(2);
        if self.client_scope {
            scopes.push(Scope::Client);
        }
        if self.controller_scope {
            scopes.push(Scope::Controller);
        }
        scopes
    }
}

/// Payload for create and update calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialWrite {
    pub key: CredentialKey,
    pub auth_type: String,
    /// Normalized attributes
    pub attributes: BTreeMap<String, String>,
}

/// Where a credential is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Client,
    Controller,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Client => write!(f, "client"),
            Scope::Controller => write!(f, "controller"),
        }
    }
}

/// Errors reported by a credential store
#[derive(Debug, Error)]
pub enum StoreError {
    /// No credential with this name exists for the cloud
    #[error("credential {name:?} not found for cloud {cloud:?}")]
    NotFound { cloud: String, name: String },

    /// Create was called for a credential that already exists
    #[error("credential {name:?} already exists for cloud {cloud:?} ({scope})")]
    AlreadyExists {
        cloud: String,
        name: String,
        scope: Scope,
    },

    /// The cloud is not known to the store
    #[error("cloud {0:?} not found")]
    UnknownCloud(String),

    /// Neither client nor controller scope was requested
    #[error("credential {0:?} must be added to the client and/or the controller")]
    NoScope(String),

    /// IO error
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Store document could not be parsed
    #[error("invalid credential store {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Store document could not be serialized
    #[error("failed to serialize credential store: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Failure requested by a test store
    #[error("{0}")]
    Injected(String),
}

impl StoreError {
    /// Returns true if the credential does not exist remotely
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Backend trait for credential stores.
///
/// Every call is a single blocking round trip. Implementations must not cache
/// records between calls; the reconciler re-derives everything from its
/// inputs each time.
pub trait CredentialStore: Send + Sync {
    /// Create a credential, returning the canonical name of its cloud
    fn create_credential(&self, input: &CredentialWrite) -> StoreResult<String>;

    /// Read a credential
    fn read_credential(&self, key: &CredentialKey) -> StoreResult<RemoteCredential>;

    /// Overwrite an existing credential in place
    fn update_credential(&self, input: &CredentialWrite) -> StoreResult<()>;

    /// Remove a credential
    fn destroy_credential(&self, key: &CredentialKey) -> StoreResult<()>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for Box<S> {
    fn create_credential(&self, input: &CredentialWrite) -> StoreResult<String> {
        (**self).create_credential(input)
    }

    fn read_credential(&self, key: &CredentialKey) -> StoreResult<RemoteCredential> {
        (**self).read_credential(key)
    }

    fn update_credential(&self, input: &CredentialWrite) -> StoreResult<()> {
        (**self).update_credential(input)
    }

    fn destroy_credential(&self, key: &CredentialKey) -> StoreResult<()> {
        (**self).destroy_credential(key)
    }
}

impl<S: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<S> {
    fn create_credential(&self, input: &CredentialWrite) -> StoreResult<String> {
        (**self).create_credential(input)
    }

    fn read_credential(&self, key: &CredentialKey) -> StoreResult<RemoteCredential> {
        (**self).read_credential(key)
    }

    fn update_credential(&self, input: &CredentialWrite) -> StoreResult<()> {
        (**self).update_credential(input)
    }

    fn destroy_credential(&self, key: &CredentialKey) -> StoreResult<()> {
        (**self).destroy_credential(key)
    }
}

/// A registered cloud and the other names it answers to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudEntry {
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Canonical cloud names known to a store.
///
/// An empty registry accepts any cloud name as already canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CloudRegistry {
    clouds: BTreeMap<String, CloudEntry>,
}

impl CloudRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cloud with optional aliases
    pub fn with_cloud<I, A>(mut self, name: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.clouds.insert(
            name.into(),
            CloudEntry {
                aliases: aliases.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clouds.is_empty()
    }

    /// Resolve a cloud name or alias (case-insensitive) to its canonical name
    pub fn resolve(&self, cloud: &str) -> StoreResult<String> {
        if self.clouds.is_empty() {
            return Ok(cloud.to_string());
        }

        self.clouds
            .iter()
            .find(|(name, entry)| {
                name.eq_ignore_ascii_case(cloud)
                    || entry.aliases.iter().any(|a| a.eq_ignore_ascii_case(cloud))
            })
            .map(|(name, _)| name.clone())
            .ok_or_else(|| StoreError::UnknownCloud(cloud.to_string()))
    }
}
