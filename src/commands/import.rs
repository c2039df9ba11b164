//! Import an existing credential by identifier

use anyhow::{Context as AnyhowContext, Result, bail};
use credential::{CredentialStore, Reconciler, ResourceDescriptor};

use crate::Context;
use crate::commands::Session;
use crate::config::CredctlConfig;
use crate::ui;

/// Rebuild a descriptor for `id`.
///
/// When the config already declares `address`, its attribute keys are used to
/// pick which remote attributes end up in state.
pub fn import_descriptor<S: CredentialStore>(
    reconciler: &Reconciler<S>,
    config: &CredctlConfig,
    address: &str,
    id: &str,
) -> credential::Result<ResourceDescriptor> {
    let declared = config
        .credentials
        .get(address)
        .and_then(|c| c.to_descriptor().attributes);

    match declared {
        Some(attributes) => {
            let mut placeholder = ResourceDescriptor::from_id(id);
            placeholder.attributes = Some(attributes);
            reconciler.read(&placeholder)
        }
        None => reconciler.import(id),
    }
}

pub fn run(ctx: &Context, address: &str, id: &str) -> Result<()> {
    let mut session = Session::open(ctx)?;

    if let Some(existing) = session.state.get(address) {
        bail!(
            "{address:?} is already tracked as {}",
            existing.id.as_deref().unwrap_or("(no id)")
        );
    }

    let reconciler = session.reconciler()?;
    let desc = import_descriptor(&reconciler, &session.config, address, id)
        .with_context(|| format!("Failed to import {address:?}"))?;

    if !ctx.quiet {
        ui::header(&format!("Imported {address}"));
        ui::credential(&desc);
    }

    if !session.config.credentials.contains_key(address) {
        ui::warn(&format!(
            "{address} is not declared in the config; the next apply will delete it"
        ));
    }

    session.state.record(address, desc);
    session.save_state()?;
    ui::success(&format!("Tracking {address}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use credential::{AttributeValue, Error, MemoryStore};

    fn seeded() -> Reconciler<MemoryStore> {
        let reconciler = Reconciler::new(MemoryStore::new());
        reconciler.store().insert_controller(
            "aws",
            "cred1",
            "userpass",
            [
                ("user".to_string(), AttributeValue::from("admin")),
                ("port".to_string(), AttributeValue::Int(22)),
            ]
            .into_iter()
            .collect(),
        );
        reconciler
    }

    #[test]
    fn test_import_undeclared_has_no_attributes() {
        let reconciler = seeded();
        let desc =
            import_descriptor(&reconciler, &CredctlConfig::default(), "a", "cred1:aws:false:true")
                .unwrap();

        assert_eq!(desc.name, "cred1");
        assert_eq!(desc.auth_type, "userpass");
        assert!(desc.attributes.is_none());
        assert_eq!(desc.id.as_deref(), Some("cred1:aws:false:true"));
    }

    #[test]
    fn test_import_picks_declared_attributes() {
        let reconciler = seeded();
        let config: CredctlConfig = toml::from_str(
            r#"
[credentials.a]
name = "cred1"
cloud = { name = "aws" }
auth_type = "userpass"
attributes = { port = "0" }
"#,
        )
        .unwrap();

        let desc = import_descriptor(&reconciler, &config, "a", "cred1:aws:false:true").unwrap();
        let attrs = desc.attributes.unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs["port"], "22");
    }

    #[test]
    fn test_import_malformed_id() {
        let reconciler = seeded();
        let err = import_descriptor(&reconciler, &CredctlConfig::default(), "a", "bad:id")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedIdentifier { .. }));
    }
}
