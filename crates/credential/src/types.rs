//! Core types for credential reconciliation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single attribute value as reported by a credential store.
///
/// Stores may hand back native scalars, while the declared state only ever
/// holds strings. See [`crate::attributes`] for the conversion rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::attributes::stringify(self))
    }
}

/// The cloud a credential applies to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CloudRef {
    /// Cloud name (e.g. "aws")
    pub name: String,
}

impl CloudRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Declared (desired) state of a single credential resource.
///
/// The calling engine owns this value. Every reconciler verb borrows the
/// current descriptor and hands back a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Credential name, immutable after creation
    pub name: String,
    /// Cloud the credential is registered against, immutable after creation
    pub cloud: CloudRef,
    /// Credential authorization type (e.g. "userpass", "access-key")
    pub auth_type: String,
    /// Credential attributes. `None` means "not declared", which is
    /// distinct from an empty map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
    /// Add the credential to the client
    #[serde(default)]
    pub client_scope: bool,
    /// Add the credential to the controller
    #[serde(default = "default_controller_scope")]
    pub controller_scope: bool,
    /// Opaque identifier, assigned by a successful create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

fn default_controller_scope() -> bool {
    true
}

impl ResourceDescriptor {
    /// Create a descriptor with default scopes and no attributes
    pub fn new(
        name: impl Into<String>,
        cloud: impl Into<String>,
        auth_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            cloud: CloudRef::new(cloud),
            auth_type: auth_type.into(),
            attributes: None,
            client_scope: false,
            controller_scope: default_controller_scope(),
            id: None,
        }
    }

    /// Placeholder carrying nothing but an identifier, as used by import.
    ///
    /// Every other field is filled in by a subsequent read.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            cloud: CloudRef::default(),
            auth_type: String::new(),
            attributes: None,
            client_scope: false,
            controller_scope: default_controller_scope(),
            id: Some(id.into()),
        }
    }

    pub fn with_attributes<K, V>(mut self, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.attributes = Some(
            attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn with_scopes(mut self, client_scope: bool, controller_scope: bool) -> Self {
        self.client_scope = client_scope;
        self.controller_scope = controller_scope;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Whether a create has assigned this descriptor an identifier
    pub fn is_created(&self) -> bool {
        self.id.is_some()
    }
}

/// The external store's view of a credential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCredential {
    /// Label the store knows the credential by
    pub label: String,
    /// Authorization type tag
    pub auth_type: String,
    /// Attributes, possibly natively typed
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}
