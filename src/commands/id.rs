use anyhow::{Context as AnyhowContext, Result};
use credential::CredentialId;
use credential::identity;

use crate::cli::IdCommand;
use crate::ui;

pub fn run(cmd: IdCommand) -> Result<()> {
    match cmd {
        IdCommand::Encode {
            name,
            cloud,
            client,
            no_controller,
        } => {
            println!("{}", encode(&name, &cloud, client, !no_controller)?);
            Ok(())
        }
        IdCommand::Decode { id } => {
            let parsed: CredentialId = id
                .parse()
                .with_context(|| format!("Could not decode {id:?}"))?;
            ui::kv("name", &parsed.name);
            ui::kv("cloud", &parsed.cloud);
            ui::kv("client_credential", &parsed.client_scope.to_string());
            ui::kv("controller_credential", &parsed.controller_scope.to_string());
            Ok(())
        }
    }
}

/// Encode after checking the parts survive a round trip
fn encode(name: &str, cloud: &str, client: bool, controller: bool) -> Result<String> {
    identity::validate_component("name", name)?;
    identity::validate_component("cloud.name", cloud)?;
    Ok(CredentialId::new(name, cloud, client, controller).to_string())
}
