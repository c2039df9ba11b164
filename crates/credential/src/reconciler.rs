//! Reconciliation engine - the create/read/update/delete protocol
//!
//! The reconciler holds nothing but its store handle. Every verb receives the
//! full current descriptor, performs at most one store round trip, and returns
//! a fresh descriptor. Nothing derived (such as the identifier) is committed
//! unless the store call succeeded.

use crate::attributes;
use crate::backend::{CredentialKey, CredentialStore, CredentialWrite};
use crate::error::{Error, Result};
use crate::identity;
use crate::schema;
use crate::types::{CloudRef, ResourceDescriptor};
use std::collections::BTreeMap;

/// Drives a credential store towards declared state
#[derive(Debug)]
pub struct Reconciler<S> {
    store: S,
}

impl<S: CredentialStore> Reconciler<S> {
    /// Create a reconciler around a configured store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a reconciler from a store that may not have been configured.
    ///
    /// Fails with [`Error::NotConfigured`] when no store is given, so the
    /// verbs themselves never have to check.
    pub fn try_new(store: Option<S>) -> Result<Self> {
        store.map(Self::new).ok_or(Error::NotConfigured)
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create the credential and assign its identifier
    pub fn create(&self, desc: &ResourceDescriptor) -> Result<ResourceDescriptor> {
        schema::validate(desc)?;

        let input = CredentialWrite {
            key: CredentialKey::new(
                &desc.name,
                &desc.cloud.name,
                desc.client_scope,
                desc.controller_scope,
            ),
            auth_type: desc.auth_type.clone(),
            attributes: normalized(desc.attributes.as_ref()),
        };

        let cloud = self
            .store
            .create_credential(&input)
            .map_err(|source| Error::UpstreamCreateFailed {
                name: desc.name.clone(),
                source,
            })?;
        log::trace!("created credential resource {:?}", desc.name);

        let mut created = desc.clone();
        created.id = Some(identity::encode(
            &desc.name,
            &cloud,
            desc.client_scope,
            desc.controller_scope,
        ));
        Ok(created)
    }

    /// Refresh a descriptor from the store.
    ///
    /// Drift is reported only by returning different values; the caller
    /// decides what to do about it. A credential missing from the store is an
    /// error, not an implicit delete.
    pub fn read(&self, desc: &ResourceDescriptor) -> Result<ResourceDescriptor> {
        let id = require_id(desc, "read")?;
        let decoded = identity::decode(id)?;
        let (client_scope, controller_scope) = decoded.scope_flags()?;

        let key = CredentialKey::new(decoded.name, decoded.cloud, client_scope, controller_scope);
        let remote =
            self.store
                .read_credential(&key)
                .map_err(|source| Error::UpstreamReadFailed {
                    name: decoded.name.to_string(),
                    source,
                })?;
        log::trace!("read credential resource {:?}", decoded.name);

        let mut refreshed = desc.clone();
        refreshed.name = remote.label;
        refreshed.auth_type = remote.auth_type;
        refreshed.cloud = CloudRef::new(decoded.cloud);
        refreshed.client_scope = client_scope;
        refreshed.controller_scope = controller_scope;

        // An empty merge is never written back; "no attributes" stays distinct
        if let Some(declared) = &desc.attributes {
            let merged = attributes::merge(declared, &remote.attributes);
            if !merged.is_empty() {
                refreshed.attributes = Some(merged);
            }
        }

        Ok(refreshed)
    }

    /// Converge the store from `old` to `new`.
    ///
    /// Returns `new` carrying the identifier valid after the call. When
    /// nothing mutable changed no store call is made and the old identifier
    /// is kept as is.
    pub fn update(
        &self,
        old: &ResourceDescriptor,
        new: &ResourceDescriptor,
    ) -> Result<ResourceDescriptor> {
        if is_noop_update(old, new) {
            log::debug!("credential {:?} unchanged, skipping update", new.name);
            let mut unchanged = new.clone();
            unchanged.id.clone_from(&old.id);
            return Ok(unchanged);
        }

        let id = require_id(old, "update")?;
        let decoded = identity::decode(id)?;

        let input = CredentialWrite {
            key: CredentialKey::new(
                decoded.name,
                decoded.cloud,
                new.client_scope,
                new.controller_scope,
            ),
            auth_type: new.auth_type.clone(),
            attributes: normalized(new.attributes.as_ref()),
        };

        self.store
            .update_credential(&input)
            .map_err(|source| Error::UpstreamUpdateFailed {
                name: decoded.name.to_string(),
                source,
            })?;
        log::trace!("updated credential resource {:?}", decoded.name);

        let mut updated = new.clone();
        updated.id = Some(identity::encode(
            decoded.name,
            decoded.cloud,
            new.client_scope,
            new.controller_scope,
        ));
        Ok(updated)
    }

    /// Remove the credential from the store.
    ///
    /// The descriptor is left untouched; callers drop it once this succeeds.
    pub fn delete(&self, desc: &ResourceDescriptor) -> Result<()> {
        let id = require_id(desc, "delete")?;
        let decoded = identity::decode(id)?;
        let (client_scope, controller_scope) = decoded.scope_flags()?;

        let key = CredentialKey::new(decoded.name, decoded.cloud, client_scope, controller_scope);
        self.store
            .destroy_credential(&key)
            .map_err(|source| Error::UpstreamDeleteFailed {
                name: decoded.name.to_string(),
                source,
            })?;
        log::trace!("deleted credential resource {:?}", decoded.name);

        Ok(())
    }

    /// Rebuild a full descriptor from nothing but an identifier
    pub fn import(&self, id: &str) -> Result<ResourceDescriptor> {
        self.read(&ResourceDescriptor::from_id(id))
    }
}

/// Whether an update from `old` to `new` can be skipped.
///
/// Compares the mutable fields only; attributes are compared as declared,
/// before normalization.
pub fn is_noop_update(old: &ResourceDescriptor, new: &ResourceDescriptor) -> bool {
    old.auth_type == new.auth_type
        && old.client_scope == new.client_scope
        && old.controller_scope == new.controller_scope
        && old.attributes == new.attributes
}

fn require_id<'a>(desc: &'a ResourceDescriptor, operation: &'static str) -> Result<&'a str> {
    desc.id
        .as_deref()
        .ok_or(Error::MissingIdentifier { operation })
}

fn normalized(declared: Option<&BTreeMap<String, String>>) -> BTreeMap<String, String> {
    declared.map(attributes::normalize_declared).unwrap_or_default()
}
