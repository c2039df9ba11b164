//! Credential document shared by the bundled stores
//!
//! Credentials live in two independent sections, `client` and `controller`,
//! each keyed by cloud and then by credential name.

use super::{CloudRegistry, CredentialKey, CredentialWrite, Scope, StoreError, StoreResult};
use crate::types::{AttributeValue, RemoteCredential};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stored credential record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub auth_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

type Section = BTreeMap<String, BTreeMap<String, StoredCredential>>;

/// Whole-store contents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub client: Section,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub controller: Section,
}

impl Document {
    fn section(&self, scope: Scope) -> &Section {
        match scope {
            Scope::Client => &self.client,
            Scope::Controller => &self.controller,
        }
    }

    fn section_mut(&mut self, scope: Scope) -> &mut Section {
        match scope {
            Scope::Client => &mut self.client,
            Scope::Controller => &mut self.controller,
        }
    }

    fn get(&self, scope: Scope, cloud: &str, name: &str) -> Option<&StoredCredential> {
        self.section(scope).get(cloud).and_then(|c| c.get(name))
    }

    fn insert(&mut self, scope: Scope, cloud: &str, name: &str, record: StoredCredential) {
        self.section_mut(scope)
            .entry(cloud.to_string())
            .or_default()
            .insert(name.to_string(), record);
    }

    fn remove(&mut self, scope: Scope, cloud: &str, name: &str) -> bool {
        let section = self.section_mut(scope);
        let Some(credentials) = section.get_mut(cloud) else {
            return false;
        };
        let removed = credentials.remove(name).is_some();
        if credentials.is_empty() {
            section.remove(cloud);
        }
        removed
    }

    /// Number of stored records across both sections
    pub fn len(&self) -> usize {
        self.client
            .values()
            .chain(self.controller.values())
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add a new credential to every flagged scope
    pub fn create(
        &mut self,
        registry: &CloudRegistry,
        input: &CredentialWrite,
    ) -> StoreResult<String> {
        let key = &input.key;
        let scopes = key.scopes();
        if scopes.is_empty() {
            return Err(StoreError::NoScope(key.name.clone()));
        }

        let cloud = registry.resolve(&key.cloud)?;

        for scope in &scopes {
            if self.get(*scope, &cloud, &key.name).is_some() {
                return Err(StoreError::AlreadyExists {
                    cloud,
                    name: key.name.clone(),
                    scope: *scope,
                });
            }
        }

        let record = record_from(input);
        for scope in scopes {
            self.insert(scope, &cloud, &key.name, record.clone());
        }

        Ok(cloud)
    }

    /// Look a credential up, preferring the controller copy when flagged
    pub fn read(&self, key: &CredentialKey) -> StoreResult<RemoteCredential> {
        let mut order = Vec::with_capacity(2);
        if key.controller_scope {
            order.push(Scope::Controller);
        }
        if key.client_scope {
            order.push(Scope::Client);
        }

        order
            .into_iter()
            .find_map(|scope| self.get(scope, &key.cloud, &key.name))
            .map(|record| RemoteCredential {
                label: key.name.clone(),
                auth_type: record.auth_type.clone(),
                attributes: record.attributes.clone(),
            })
            .ok_or_else(|| not_found(key))
    }

    /// Overwrite a credential in place.
    ///
    /// The record is written to every flagged scope and dropped from scopes
    /// that are no longer flagged.
    pub fn update(&mut self, input: &CredentialWrite) -> StoreResult<()> {
        let key = &input.key;
        let scopes = key.scopes();
        if scopes.is_empty() {
            return Err(StoreError::NoScope(key.name.clone()));
        }

        let exists = [Scope::Client, Scope::Controller]
            .into_iter()
            .any(|scope| self.get(scope, &key.cloud, &key.name).is_some());
        if !exists {
            return Err(not_found(key));
        }

        let record = record_from(input);
        for scope in [Scope::Client, Scope::Controller] {
            if scopes.contains(&scope) {
                self.insert(scope, &key.cloud, &key.name, record.clone());
            } else {
                self.remove(scope, &key.cloud, &key.name);
            }
        }

        Ok(())
    }

    /// Remove a credential from every flagged scope
    pub fn destroy(&mut self, key: &CredentialKey) -> StoreResult<()> {
        let mut removed = false;
        for scope in key.scopes() {
            removed |= self.remove(scope, &key.cloud, &key.name);
        }

        if removed {
            Ok(())
        } else {
            Err(not_found(key))
        }
    }
}

fn record_from(input: &CredentialWrite) -> StoredCredential {
    StoredCredential {
        auth_type: input.auth_type.clone(),
        attributes: input
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), AttributeValue::from(v.as_str())))
            .collect(),
    }
}

fn not_found(key: &CredentialKey) -> StoreError {
    StoreError::NotFound {
        cloud: key.cloud.clone(),
        name: key.name.clone(),
    }
}
