//! # Credential
//!
//! Declarative reconciliation of cloud credentials.
//!
//! The calling engine owns the desired and recorded state of every credential
//! and asks this crate to converge an external credential store towards it,
//! one verb at a time.
//!
//! ## Core Concepts
//!
//! - **ResourceDescriptor**: Declared state of one credential, plus its identifier
//! - **Identity**: The `name:cloud:client:controller` identifier, the only
//!   thing persisted between runs
//! - **Attributes**: Declared string maps, merged against whatever the store reports
//! - **Reconciler**: Create, read, update and delete against a [`CredentialStore`]
//!
//! ## Example
//!
//! ```ignore
//! use credential::{MemoryStore, Reconciler, ResourceDescriptor};
//!
//! let reconciler = Reconciler::new(MemoryStore::new());
//!
//! let desired = ResourceDescriptor::new("cred1", "aws", "userpass")
//!     .with_attributes([("user", "a")]);
//!
//! let created = reconciler.create(&desired)?;
//! assert_eq!(created.id.as_deref(), Some("cred1:aws:false:true"));
//!
//! // Later runs only need the identifier
//! let refreshed = reconciler.read(&created)?;
//! reconciler.delete(&refreshed)?;
//! ```
//!
//! ## Stores
//!
//! [`CredentialStore`] is the single seam to the system that owns credentials.
//! [`FileStore`] keeps them in a TOML document; [`MemoryStore`] records every
//! call and can be told to fail, for tests.

pub mod attributes;
pub mod backend;
pub mod error;
pub mod identity;
pub mod reconciler;
pub mod schema;
pub mod types;

// Re-export main types at crate root
pub use backend::{
    CloudRegistry, CredentialKey, CredentialStore, CredentialWrite, FileStore, MemoryStore,
    Scope, StoreError, StoreResult,
};
pub use error::{Error, Result, ScopeField};
pub use identity::{CredentialId, DecodedId};
pub use reconciler::{Reconciler, is_noop_update};
pub use types::{AttributeValue, CloudRef, RemoteCredential, ResourceDescriptor};
