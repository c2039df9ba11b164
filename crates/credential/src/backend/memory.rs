//! In-memory credential store
//!
//! Same semantics as [`super::FileStore`] without touching disk. Every call is
//! recorded, and individual operations can be made to fail, which makes this
//! the store of choice for exercising the reconciler.

use super::document::{Document, StoredCredential};
use super::{
    CloudRegistry, CredentialKey, CredentialStore, CredentialWrite, StoreError, StoreResult,
};
use crate::types::{AttributeValue, RemoteCredential};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// Store operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Create,
    Read,
    Update,
    Destroy,
}

/// A recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub key: CredentialKey,
}

#[derive(Debug, Default)]
struct Inner {
    document: Document,
    calls: Vec<StoreCall>,
    failures: HashMap<StoreOp, String>,
}

/// Credential store held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    registry: CloudRegistry,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(mut self, registry: CloudRegistry) -> Self {
        self.registry = registry;
        self
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Make every subsequent call of `op` fail with `message`
    pub fn fail_on(&self, op: StoreOp, message: impl Into<String>) {
        self.inner().failures.insert(op, message.into());
    }

    /// Stop failing `op`
    pub fn clear_failure(&self, op: StoreOp) {
        self.inner().failures.remove(&op);
    }

    /// Seed a controller-scoped record directly, bypassing create.
    ///
    /// Useful for simulating out-of-band changes (drift) or natively typed
    /// attributes.
    pub fn insert_controller(
        &self,
        cloud: &str,
        name: &str,
        auth_type: &str,
        attributes: BTreeMap<String, AttributeValue>,
    ) {
        self.inner()
            .document
            .controller
            .entry(cloud.to_string())
            .or_default()
            .insert(
                name.to_string(),
                StoredCredential {
                    auth_type: auth_type.to_string(),
                    attributes,
                },
            );
    }

    /// All calls made so far
    pub fn calls(&self) -> Vec<StoreCall> {
        self.inner().calls.clone()
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.inner().calls.len()
    }

    /// Snapshot of the stored records
    pub fn document(&self) -> Document {
        self.inner().document.clone()
    }

    fn begin(&self, op: StoreOp, key: &CredentialKey) -> StoreResult<MutexGuard<'_, Inner>> {
        let mut inner = self.inner();
        inner.calls.push(StoreCall {
            op,
            key: key.clone(),
        });
        if let Some(message) = inner.failures.get(&op) {
            return Err(StoreError::Injected(message.clone()));
        }
        Ok(inner)
    }
}

impl CredentialStore for MemoryStore {
    fn create_credential(&self, input: &CredentialWrite) -> StoreResult<String> {
        let mut inner = self.begin(StoreOp::Create, &input.key)?;
        inner.document.create(&self.registry, input)
    }

    fn read_credential(&self, key: &CredentialKey) -> StoreResult<RemoteCredential> {
        self.begin(StoreOp::Read, key)?.document.read(key)
    }

    fn update_credential(&self, input: &CredentialWrite) -> StoreResult<()> {
        let mut inner = self.begin(StoreOp::Update, &input.key)?;
        inner.document.update(input)
    }

    fn destroy_credential(&self, key: &CredentialKey) -> StoreResult<()> {
        let mut inner = self.begin(StoreOp::Destroy, key)?;
        inner.document.destroy(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls() {
        let store = MemoryStore::new();
        let key = CredentialKey::new("c", "aws", false, true);
        let _ = store.read_credential(&key);

        assert_eq!(
            store.calls(),
            vec![StoreCall {
                op: StoreOp::Read,
                key
            }]
        );
    }

    #[test]
    fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_on(StoreOp::Destroy, "controller unreachable");

        let key = CredentialKey::new("c", "aws", false, true);
        let err = store.destroy_credential(&key).unwrap_err();
        assert_eq!(err.to_string(), "controller unreachable");

        store.clear_failure(StoreOp::Destroy);
        assert!(store.destroy_credential(&key).unwrap_err().is_not_found());
        assert_eq!(store.call_count(), 2);
    }

    #[test]
    fn test_seeded_record_is_readable() {
        let store = MemoryStore::new();
        store.insert_controller(
            "aws",
            "c",
            "userpass",
            [("port".to_string(), AttributeValue::Int(22))]
                .into_iter()
                .collect(),
        );

        let remote = store
            .read_credential(&CredentialKey::new("c", "aws", false, true))
            .unwrap();
        assert_eq!(remote.attributes["port"], AttributeValue::Int(22));
    }
}
