//! Declarative configuration (`credctl.toml`)
//!
//! ```toml
//! [store]
//! path = "~/.local/share/credctl/store.toml"
//!
//! [store.clouds.aws]
//! aliases = ["amazon"]
//!
//! [credentials.aws_admin]
//! name = "cred1"
//! cloud = { name = "aws" }
//! auth_type = "userpass"
//!
//! [credentials.aws_admin.attributes]
//! user = "admin"
//! port = 22
//! ```

use anyhow::{Context, Result, bail};
use credential::attributes;
use credential::{AttributeValue, CloudRef, CloudRegistry, FileStore, ResourceDescriptor, schema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Top-level credctl configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredctlConfig {
    /// Credential store; without it nothing can be reconciled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,

    /// Declared credentials, keyed by address
    #[serde(default)]
    pub credentials: BTreeMap<String, CredentialConfig>,
}

/// Where credentials are kept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the store file; relative paths resolve against the config file
    pub path: String,

    /// Known clouds. Empty means any cloud name is accepted.
    #[serde(default, skip_serializing_if = "CloudRegistry::is_empty")]
    pub clouds: CloudRegistry,
}

/// One declared credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub name: String,
    pub cloud: CloudRef,
    pub auth_type: String,

    /// Attribute values; numbers and booleans are accepted and stored as strings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, AttributeValue>>,

    #[serde(default)]
    pub client_credential: bool,

    #[serde(default = "default_controller_credential")]
    pub controller_credential: bool,
}

fn default_controller_credential() -> bool {
    true
}

impl CredentialConfig {
    /// Desired state for this credential
    pub fn to_descriptor(&self) -> ResourceDescriptor {
        let mut desc = ResourceDescriptor::new(&self.name, &self.cloud.name, &self.auth_type)
            .with_scopes(self.client_credential, self.controller_credential);
        desc.attributes = self.attributes.as_ref().map(attributes::to_external);
        desc
    }
}

impl CredctlConfig {
    /// Load config from `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::debug!(
            "Loaded {} credential(s) from {}",
            config.credentials.len(),
            path.display()
        );
        Ok(config)
    }

    /// Check every declared credential against the resource schema
    pub fn validate(&self) -> Result<()> {
        for (address, credential) in &self.credentials {
            schema::validate(&credential.to_descriptor())
                .with_context(|| format!("Invalid credential {address:?}"))?;
        }

        let desired = self.desired()?;
        let mut seen: BTreeMap<(&str, &str), &str> = BTreeMap::new();
        for (address, desc) in &desired {
            let key = (desc.cloud.name.as_str(), desc.name.as_str());
            if let Some(other) = seen.insert(key, address) {
                bail!(
                    "Credentials {other:?} and {address:?} both declare {:?} for cloud {:?}",
                    desc.name,
                    desc.cloud.name
                );
            }
        }

        Ok(())
    }

    /// Desired descriptors, keyed by address.
    ///
    /// Cloud aliases are resolved to their canonical name, which is what the
    /// store reports back on refresh.
    pub fn desired(&self) -> Result<BTreeMap<String, ResourceDescriptor>> {
        self.credentials
            .iter()
            .map(|(address, credential)| {
                let mut desc = credential.to_descriptor();
                if let Some(store) = &self.store {
                    let canonical = store
                        .clouds
                        .resolve(&desc.cloud.name)
                        .with_context(|| format!("Invalid credential {address:?}"))?;
                    desc.cloud = CloudRef::new(canonical);
                }
                Ok((address.clone(), desc))
            })
            .collect()
    }

    /// Open the configured store, if any.
    ///
    /// `base` is the directory relative store paths resolve against.
    pub fn open_store(&self, base: &Path) -> Option<FileStore> {
        self.store.as_ref().map(|store| {
            let path = store.resolved_path(base);
            log::debug!("Using credential store {}", path.display());
            FileStore::new(path).with_registry(store.clouds.clone())
        })
    }
}

impl StoreConfig {
    /// Store path with ~ and variables expanded
    pub fn resolved_path(&self, base: &Path) -> PathBuf {
        let path = paths::expand(&self.path);
        if path.is_relative() {
            base.join(path)
        } else {
            path
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[store]
path = "store.toml"

[store.clouds.aws]
aliases = ["amazon"]

[store.clouds.google]

[credentials.aws_admin]
name = "cred1"
cloud = { name = "aws" }
auth_type = "userpass"

[credentials.aws_admin.attributes]
user = "admin"
port = 22
verify = true

[credentials.gce]
name = "ops"
cloud = { name = "google" }
auth_type = "oauth2"
client_credential = true
controller_credential = false
"#;

    #[test]
    fn test_parse_sample() {
        let config: CredctlConfig = toml::from_str(SAMPLE).unwrap();
        config.validate().unwrap();

        let desired = config.desired().unwrap();
        let admin = &desired["aws_admin"];
        assert_eq!(admin.name, "cred1");
        assert!(!admin.client_scope);
        assert!(admin.controller_scope);

        let attrs = admin.attributes.as_ref().unwrap();
        assert_eq!(attrs["port"], "22");
        assert_eq!(attrs["verify"], "true");

        let gce = &desired["gce"];
        assert!(gce.client_scope);
        assert!(!gce.controller_scope);
        assert!(gce.attributes.is_none());
    }

    #[test]
    fn test_desired_resolves_cloud_aliases() {
        let sample = SAMPLE
            .replace("cloud = { name = \"aws\" }", "cloud = { name = \"Amazon\" }")
            .replace("cloud = { name = \"google\" }", "cloud = { name = \"azure\" }");
        let mut config: CredctlConfig = toml::from_str(&sample).unwrap();

        // azure is not registered
        assert!(config.validate().is_err());

        config.credentials.remove("gce");
        config.validate().unwrap();
        assert_eq!(config.desired().unwrap()["aws_admin"].cloud.name, "aws");
    }

    #[test]
    fn test_store_path_relative_to_config() {
        let config: CredctlConfig = toml::from_str(SAMPLE).unwrap();
        let store = config.store.as_ref().unwrap();
        assert_eq!(
            store.resolved_path(Path::new("/etc/credctl")),
            PathBuf::from("/etc/credctl/store.toml")
        );
        assert_eq!(store.clouds.resolve("Amazon").unwrap(), "aws");
    }

    #[test]
    fn test_missing_store_section() {
        let config: CredctlConfig = toml::from_str(
            r#"
[credentials.a]
name = "cred1"
cloud = { name = "aws" }
auth_type = "userpass"
"#,
        )
        .unwrap();

        assert!(config.store.is_none());
        assert!(config.open_store(Path::new("/tmp")).is_none());
    }

    #[test]
    fn test_validate_rejects_delimiter() {
        let config: CredctlConfig = toml::from_str(
            r#"
[credentials.a]
name = "cred:1"
cloud = { name = "aws" }
auth_type = "userpass"
"#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(format!("{err:#}").contains("must not contain ':'"));
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let config: CredctlConfig = toml::from_str(
            r#"
[credentials.a]
name = "cred1"
cloud = { name = "aws" }
auth_type = "userpass"

[credentials.b]
name = "cred1"
cloud = { name = "aws" }
auth_type = "access-key"
"#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credctl.toml");
        fs::write(&path, SAMPLE).unwrap();

        let config = CredctlConfig::load_from(&path).unwrap();
        assert_eq!(config.credentials.len(), 2);

        let store = config.open_store(dir.path()).unwrap();
        assert_eq!(store.path(), dir.path().join("store.toml"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = CredctlConfig::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("Could not read config file"));
    }
}
