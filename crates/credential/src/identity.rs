//! Composite credential identifiers
//!
//! A credential is re-addressed on every run from a single string of the form
//! `name:cloud:client:controller`, e.g. `cred1:aws:false:true`. Components are
//! not escaped, so `name` and `cloud` must never contain `:` themselves; see
//! [`validate_component`].

use crate::error::{Error, Result, ScopeField};
use std::fmt;
use std::str::FromStr;

/// Component separator
pub const DELIMITER: char = ':';

/// Number of components in a well-formed identifier
pub const COMPONENTS: usize = 4;

/// Encode the four identity components into an identifier
pub fn encode(name: &str, cloud: &str, client_scope: bool, controller_scope: bool) -> String {
    format!("{name}{DELIMITER}{cloud}{DELIMITER}{client_scope}{DELIMITER}{controller_scope}")
}

/// An identifier split into its raw components.
///
/// The scope flags are left as text; call [`DecodedId::scope_flags`] to parse
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedId<'a> {
    pub name: &'a str,
    pub cloud: &'a str,
    pub client_scope: &'a str,
    pub controller_scope: &'a str,
}

impl DecodedId<'_> {
    /// Parse both scope flags, client first
    pub fn scope_flags(&self) -> Result<(bool, bool)> {
        let client = parse_scope_flag(ScopeField::Client, self.client_scope)?;
        let controller = parse_scope_flag(ScopeField::Controller, self.controller_scope)?;
        Ok((client, controller))
    }
}

/// Split an identifier into exactly four non-empty components
pub fn decode(id: &str) -> Result<DecodedId<'_>> {
    let parts: Vec<&str> = id.split(DELIMITER).collect();

    match parts.as_slice() {
        &[name, cloud, client, controller] if parts.iter().all(|p| !p.is_empty()) => {
            Ok(DecodedId {
                name,
                cloud,
                client_scope: client,
                controller_scope: controller,
            })
        }
        _ => Err(Error::MalformedIdentifier {
            id: id.to_string(),
            parts: parts.len(),
        }),
    }
}

/// Parse a scope flag; only the exact strings `true` and `false` are accepted
pub fn parse_scope_flag(field: ScopeField, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::InvalidScopeFlag {
            field,
            value: value.to_string(),
        }),
    }
}

/// Check that a value can be embedded in an identifier
pub fn validate_component(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::EmptyComponent { field });
    }
    if value.contains(DELIMITER) {
        return Err(Error::ReservedDelimiter {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// A fully parsed credential identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialId {
    pub name: String,
    pub cloud: String,
    pub client_scope: bool,
    pub controller_scope: bool,
}

impl CredentialId {
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
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(
            &self.name,
            &self.cloud,
            self.client_scope,
            self.controller_scope,
        ))
    }
}

impl FromStr for CredentialId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let decoded = decode(s)?;
        let (client_scope, controller_scope) = decoded.scope_flags()?;
        Ok(Self::new(
            decoded.name,
            decoded.cloud,
            client_scope,
            controller_scope,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode("cred1", "aws", false, true), "cred1:aws:false:true");
        assert_eq!(encode("c", "lxd", true, false), "c:lxd:true:false");
    }

    #[test]
    fn test_round_trip() {
        let names = ["cred1", "my-cred", "a.b@c", "x"];
        let clouds = ["aws", "google", "localhost"];

        for name in names {
            for cloud in clouds {
                for client in [false, true] {
                    for controller in [false, true] {
                        let id = encode(name, cloud, client, controller);
                        let decoded = decode(&id).unwrap();
                        assert_eq!(decoded.name, name);
                        assert_eq!(decoded.cloud, cloud);
                        assert_eq!(decoded.scope_flags().unwrap(), (client, controller));
                    }
                }
            }
        }
    }

    #[test]
    fn test_decode_rejects_wrong_arity() {
        for id in ["bad:id", "", "a", "a:b:true", "a:b:true:false:extra", "a:b:c:true:false"] {
            match decode(id) {
                Err(Error::MalformedIdentifier { id: got, .. }) => assert_eq!(got, id),
                other => panic!("expected MalformedIdentifier for {id:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_decode_reports_part_count() {
        match decode("bad:id") {
            Err(Error::MalformedIdentifier { parts, .. }) => assert_eq!(parts, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_empty_components() {
        assert!(matches!(
            decode("cred1::false:true"),
            Err(Error::MalformedIdentifier { .. })
        ));
        assert!(matches!(
            decode(":aws:false:true"),
            Err(Error::MalformedIdentifier { .. })
        ));
    }

    #[test]
    fn test_scope_flag_must_be_exact() {
        let decoded = decode("cred1:aws:maybe:true").unwrap();
        match decoded.scope_flags() {
            Err(Error::InvalidScopeFlag { field, value }) => {
                assert_eq!(field, ScopeField::Client);
                assert_eq!(value, "maybe");
            }
            other => panic!("unexpected {other:?}"),
        }

        for bad in ["True", "FALSE", "1", "0", "t", "yes"] {
            assert!(parse_scope_flag(ScopeField::Controller, bad).is_err());
        }
    }

    #[test]
    fn test_controller_flag_reported() {
        let decoded = decode("cred1:aws:true:nope").unwrap();
        assert!(matches!(
            decoded.scope_flags(),
            Err(Error::InvalidScopeFlag {
                field: ScopeField::Controller,
                ..
            })
        ));
    }

    #[test]
    fn test_credential_id_parse_and_display() {
        let id: CredentialId = "cred1:aws:false:true".parse().unwrap();
        assert_eq!(id, CredentialId::new("cred1", "aws", false, true));
        assert_eq!(id.to_string(), "cred1:aws:false:true");

        assert!("cred1:aws:false".parse::<CredentialId>().is_err());
    }

    #[test]
    fn test_validate_component() {
        assert!(validate_component("name", "cred1").is_ok());
        assert!(matches!(
            validate_component("name", ""),
            Err(Error::EmptyComponent { field: "name" })
        ));
        assert!(matches!(
            validate_component("cloud", "aws:east"),
            Err(Error::ReservedDelimiter { field: "cloud", .. })
        ));
    }
}
