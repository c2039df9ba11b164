//! Show tracked credentials

use anyhow::{Context as AnyhowContext, Result};
use credential::ResourceDescriptor;
use std::collections::BTreeMap;

use crate::Context;
use crate::engine::planner::matches_target;
use crate::state::CredctlState;
use crate::ui;

fn selected<'a>(
    state: &'a CredctlState,
    target: Option<&str>,
) -> BTreeMap<&'a str, &'a ResourceDescriptor> {
    state
        .resources
        .iter()
        .filter(|(address, _)| target.is_none_or(|t| matches_target(address, t)))
        .map(|(address, desc)| (address.as_str(), desc))
        .collect()
}

pub fn run(ctx: &Context, target: Option<&str>, json: bool) -> Result<()> {
    let state = CredctlState::load_from(&ctx.state_path()?)?;
    let resources = selected(&state, target);

    if json {
        let out = serde_json::to_string_pretty(&resources).context("Failed to serialize state")?;
        println!("{out}");
        return Ok(());
    }

    if resources.is_empty() {
        ui::info("No tracked credentials");
        return Ok(());
    }

    ui::header("Tracked Credentials");
    for (address, desc) in &resources {
        ui::section(address);
        ui::credential(desc);
    }

    if !ctx.quiet {
        println!();
        ui::dim(&format!(
            "Last updated {}",
            state.last_updated.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_filters_by_target() {
        let mut state = CredctlState::default();
        state.record("aws_admin", ResourceDescriptor::new("cred1", "aws", "userpass"));
        state.record("aws_ops", ResourceDescriptor::new("cred2", "aws", "userpass"));
        state.record("gce", ResourceDescriptor::new("cred3", "google", "oauth2"));

        assert_eq!(selected(&state, None).len(), 3);
        assert_eq!(
            selected(&state, Some("aws_*")).keys().copied().collect::<Vec<_>>(),
            vec!["aws_admin", "aws_ops"]
        );
    }

    #[test]
    fn test_json_shape() {
        let mut state = CredctlState::default();
        state.record(
            "a",
            ResourceDescriptor::new("cred1", "aws", "userpass").with_id("cred1:aws:false:true"),
        );

        let value = serde_json::to_value(selected(&state, None)).unwrap();
        assert_eq!(value["a"]["id"], "cred1:aws:false:true");
        assert_eq!(value["a"]["cloud"]["name"], "aws");
        assert_eq!(value["a"]["controller_scope"], true);
    }
}
