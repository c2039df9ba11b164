//! Credential resource schema
//!
//! Declares how each attribute of a [`ResourceDescriptor`] behaves under
//! planning: which ones are required, which carry defaults, which are computed
//! by the store, and which force the credential to be replaced when they
//! change.

use crate::error::{Error, Result};
use crate::identity::validate_component;
use crate::types::ResourceDescriptor;

/// How the calling engine treats an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be set in configuration
    Required,
    /// May be omitted
    Optional,
    /// May be omitted; falls back to a static default
    Defaulted(&'static str),
    /// Assigned by the system, kept from state when unknown
    Computed,
}

/// Schema entry for a single attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub presence: Presence,
    /// A change to this attribute deletes and recreates the credential
    pub requires_replace: bool,
}

/// Resource type name of a credential
pub const RESOURCE_TYPE: &str = "credential";

/// Attributes of a credential resource
pub const ATTRIBUTES: &[AttributeSchema] = &[
    AttributeSchema {
        name: "name",
        description: "The name to be assigned to the credential",
        presence: Presence::Required,
        requires_replace: true,
    },
    AttributeSchema {
        name: "cloud.name",
        description: "The name of the cloud where the credential will be used",
        presence: Presence::Required,
        requires_replace: true,
    },
    AttributeSchema {
        name: "auth_type",
        description: "Credential authorization type",
        presence: Presence::Required,
        requires_replace: false,
    },
    AttributeSchema {
        name: "attributes",
        description: "Credential attributes accordingly to the cloud",
        presence: Presence::Optional,
        requires_replace: false,
    },
    AttributeSchema {
        name: "client_credential",
        description: "Add credentials to the client",
        presence: Presence::Defaulted("false"),
        requires_replace: false,
    },
    AttributeSchema {
        name: "controller_credential",
        description: "Add credentials to the controller",
        presence: Presence::Defaulted("true"),
        requires_replace: false,
    },
    AttributeSchema {
        name: "id",
        description: "Identifier of the credential, name:cloud:client:controller",
        presence: Presence::Computed,
        requires_replace: false,
    },
];

/// Look up an attribute's schema entry
pub fn attribute(name: &str) -> Option<&'static AttributeSchema> {
    ATTRIBUTES.iter().find(|a| a.name == name)
}

/// Validate a descriptor before it is sent to a store
pub fn validate(desc: &ResourceDescriptor) -> Result<()> {
    validate_component("name", &desc.name)?;
    validate_component("cloud.name", &desc.cloud.name)?;
    if desc.auth_type.is_empty() {
        return Err(Error::EmptyComponent { field: "auth_type" });
    }
    Ok(())
}

/// Replace-forcing attributes that differ between prior and desired state
pub fn replace_reasons(prior: &ResourceDescriptor, desired: &ResourceDescriptor) -> Vec<&'static str> {
    ATTRIBUTES
        .iter()
        .filter(|a| a.requires_replace)
        .filter(|a| match a.name {
            "name" => prior.name != desired.name,
            "cloud.name" => prior.cloud != desired.cloud,
            _ => false,
        })
        .map(|a| a.name)
        .collect()
}
