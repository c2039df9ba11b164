//! Plan display

use colored::{ColoredString, Colorize};
use credential::ResourceDescriptor;
use std::collections::BTreeMap;

use super::planner::{Action, Plan, PlannedChange};

fn symbol(action: Action) -> ColoredString {
    match action {
        Action::Create => "+".green(),
        Action::Update => "~".yellow(),
        Action::Replace => "-/+".red(),
        Action::Delete => "-".red(),
        Action::NoOp => "○".dimmed(),
    }
}

/// Field-level differences between two descriptors.
///
/// Attribute values are never printed, only which keys changed.
pub fn field_changes(prior: &ResourceDescriptor, desired: &ResourceDescriptor) -> Vec<String> {
    let mut lines = Vec::new();

    if prior.name != desired.name {
        lines.push(format!("name: {:?} → {:?}", prior.name, desired.name));
    }
    if prior.cloud != desired.cloud {
        lines.push(format!(
            "cloud.name: {:?} → {:?}",
            prior.cloud.name, desired.cloud.name
        ));
    }
    if prior.auth_type != desired.auth_type {
        lines.push(format!(
            "auth_type: {:?} → {:?}",
            prior.auth_type, desired.auth_type
        ));
    }
    if prior.client_scope != desired.client_scope {
        lines.push(format!(
            "client_credential: {} → {}",
            prior.client_scope, desired.client_scope
        ));
    }
    if prior.controller_scope != desired.controller_scope {
        lines.push(format!(
            "controller_credential: {} → {}",
            prior.controller_scope, desired.controller_scope
        ));
    }

    let empty = BTreeMap::new();
    let before = prior.attributes.as_ref().unwrap_or(&empty);
    let after = desired.attributes.as_ref().unwrap_or(&empty);
    for (key, value) in after {
        match before.get(key) {
            None => lines.push(format!("attributes.{key}: (added)")),
            Some(old) if old != value => lines.push(format!("attributes.{key}: (changed)")),
            Some(_) => {}
        }
    }
    for key in before.keys().filter(|k| !after.contains_key(*k)) {
        lines.push(format!("attributes.{key}: (removed)"));
    }
    if prior.attributes.is_some() != desired.attributes.is_some() && lines.is_empty() {
        let shown = |a: &Option<BTreeMap<String, String>>| {
            if a.is_some() { "{}" } else { "null" }
        };
        lines.push(format!(
            "attributes: {} → {}",
            shown(&prior.attributes),
            shown(&desired.attributes)
        ));
    }

    lines
}

fn describe(change: &PlannedChange) -> String {
    let desc = change.desired.as_ref().or(change.prior.as_ref());
    desc.map(|d| format!("{} ({})", d.name, d.cloud.name))
        .unwrap_or_default()
}

/// Display a plan in a user-friendly format
pub fn display_plan(plan: &Plan) {
    if !plan.has_changes() {
        println!();
        println!("  {} No changes. Credentials match the configuration.", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Credential Plan".bold()
    );
    println!("│");

    for change in plan.pending() {
        println!(
            "│ {} {:<30} {}",
            symbol(change.action),
            change.address.bold(),
            describe(change).dimmed()
        );

        if let (Some(prior), Some(desired)) = (&change.prior, &change.desired) {
            for line in field_changes(prior, desired) {
                println!("│     {}", line.dimmed());
            }
        }
        if !change.replace_reasons.is_empty() {
            println!(
                "│     {} {}",
                "forces replacement:".red(),
                change.replace_reasons.join(", ")
            );
        }
    }
    println!("│");

    let counts = plan.counts();
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Plan: {} to create, {} to update, {} to replace, {} to delete",
        counts.create.to_string().green(),
        counts.update.to_string().yellow(),
        counts.replace.to_string().red(),
        counts.delete.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_changes_none() {
        let desc = ResourceDescriptor::new("cred1", "aws", "userpass");
        assert!(field_changes(&desc, &desc.clone()).is_empty());
    }

    #[test]
    fn test_field_changes_hide_values() {
        let prior = ResourceDescriptor::new("cred1", "aws", "userpass")
            .with_attributes([("user", "a"), ("password", "old")]);
        let desired = ResourceDescriptor::new("cred1", "aws", "userpass")
            .with_attributes([("user", "a"), ("password", "new"), ("token", "t")])
            .with_scopes(true, true);

        let lines = field_changes(&prior, &desired);
        assert_eq!(
            lines,
            vec![
                "client_credential: false → true".to_string(),
                "attributes.password: (changed)".to_string(),
                "attributes.token: (added)".to_string(),
            ]
        );
        assert!(lines.iter().all(|l| !l.contains("new")));
    }

    #[test]
    fn test_field_changes_removed_and_absent() {
        let prior =
            ResourceDescriptor::new("cred1", "aws", "userpass").with_attributes([("user", "a")]);
        let desired = ResourceDescriptor::new("cred1", "aws", "access-key");

        let lines = field_changes(&prior, &desired);
        assert!(lines.contains(&"auth_type: \"userpass\" → \"access-key\"".to_string()));
        assert!(lines.contains(&"attributes.user: (removed)".to_string()));
    }

    #[test]
    fn test_field_changes_empty_vs_absent() {
        let prior = ResourceDescriptor::new("cred1", "aws", "userpass");
        let desired = prior
            .clone()
            .with_attributes(Vec::<(String, String)>::new());

        assert_eq!(field_changes(&prior, &desired), vec!["attributes: null → {}"]);
    }
}
