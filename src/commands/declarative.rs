//! Declarative commands
//!
//! - `plan` - Preview what apply would change
//! - `apply` - Make the credential store match the config
//! - `refresh` - Re-read tracked credentials and record drift
//! - `destroy` - Delete tracked credentials

use anyhow::{Result, bail};
use colored::Colorize;
use credential::{CredentialStore, Reconciler};

use crate::Context;
use crate::commands::Session;
use crate::engine::differ::{display_plan, field_changes};
use crate::engine::planner::matches_target;
use crate::engine::{ExecuteOptions, Plan, execute};
use crate::state::CredctlState;
use crate::ui;

/// A tracked credential whose store copy differs from state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    pub address: String,
    pub changes: Vec<String>,
}

/// Read every tracked credential selected by `target` and update `state`.
///
/// Returns what drifted. Every read is attempted; if any fails the whole
/// refresh fails and `state` keeps its old entry for that address.
pub fn refresh_state<S: CredentialStore>(
    reconciler: &Reconciler<S>,
    state: &mut CredctlState,
    target: Option<&str>,
) -> Result<Vec<Drift>> {
    let addresses: Vec<String> = state
        .resources
        .keys()
        .filter(|a| target.is_none_or(|t| matches_target(a, t)))
        .cloned()
        .collect();

    let mut drift = Vec::new();
    let mut failures = Vec::new();

    for address in addresses {
        let Some(recorded) = state.get(&address) else {
            continue;
        };

        match reconciler.read(recorded) {
            Ok(refreshed) => {
                let changes = field_changes(recorded, &refreshed);
                if !changes.is_empty() {
                    drift.push(Drift {
                        address: address.clone(),
                        changes,
                    });
                }
                state.record(&address, refreshed);
            }
            Err(e) => failures.push((address, e)),
        }
    }

    if !failures.is_empty() {
        for (address, err) in &failures {
            ui::error(&format!("{address}: {err}"));
            if err.is_corrupt_identity() {
                ui::dim("the recorded identifier is unusable; re-import this credential");
            }
        }
        bail!("{} credential(s) could not be refreshed", failures.len());
    }

    Ok(drift)
}

fn display_drift(drift: &[Drift]) {
    if drift.is_empty() {
        return;
    }

    ui::section("Drift detected");
    for d in drift {
        println!("  {} {}", "~".yellow(), d.address.bold());
        for change in &d.changes {
            ui::dim(&format!("    {change}"));
        }
    }
}

// ============================================================================
// Plan Command
// ============================================================================

pub fn plan(ctx: &Context, target: Option<&str>, no_refresh: bool) -> Result<()> {
    let mut session = Session::open(ctx)?;

    if !no_refresh && !session.state.is_empty() {
        let reconciler = session.reconciler()?;
        let drift = refresh_state(&reconciler, &mut session.state, target)?;
        if !ctx.quiet {
            display_drift(&drift);
        }
    }

    let plan = Plan::build(&session.config.desired()?, &session.state.resources).filtered(target);
    display_plan(&plan);
    Ok(())
}

// ============================================================================
// Apply Command
// ============================================================================

pub struct ApplyRequest<'a> {
    pub target: Option<&'a str>,
    pub dry_run: bool,
    pub yes: bool,
    pub jobs: usize,
    pub no_refresh: bool,
}

pub fn apply(ctx: &Context, req: &ApplyRequest<'_>) -> Result<()> {
    let mut session = Session::open(ctx)?;
    let reconciler = session.reconciler()?;

    let mut drift = Vec::new();
    if !req.no_refresh {
        drift = refresh_state(&reconciler, &mut session.state, req.target)?;
        if !ctx.quiet {
            display_drift(&drift);
        }
    }

    let plan =
        Plan::build(&session.config.desired()?, &session.state.resources).filtered(req.target);

    let opts = ExecuteOptions {
        dry_run: req.dry_run,
        jobs: req.jobs,
        yes: req.yes,
    };
    let summary = execute(&reconciler, &plan, &mut session.state, &opts)?;

    if !req.dry_run && (summary.total_changes() > 0 || summary.failed > 0 || !drift.is_empty()) {
        session.save_state()?;
    }

    if !summary.is_success() {
        bail!("{} credential change(s) failed", summary.failed);
    }
    Ok(())
}

// ============================================================================
// Refresh Command
// ============================================================================

pub fn refresh(ctx: &Context, target: Option<&str>) -> Result<()> {
    let mut session = Session::open(ctx)?;

    if session.state.is_empty() {
        ui::info("No tracked credentials");
        return Ok(());
    }

    let reconciler = session.reconciler()?;
    let drift = refresh_state(&reconciler, &mut session.state, target)?;
    session.save_state()?;

    if drift.is_empty() {
        ui::success(&format!(
            "All {} tracked credential(s) match the store",
            session.state.len()
        ));
    } else {
        display_drift(&drift);
    }
    Ok(())
}

// ============================================================================
// Destroy Command
// ============================================================================

pub fn destroy(ctx: &Context, target: Option<&str>, yes: bool, jobs: usize) -> Result<()> {
    let mut session = Session::open(ctx)?;

    let plan = Plan::destroy(&session.state.resources).filtered(target);
    if !plan.has_changes() {
        ui::info("Nothing to destroy");
        return Ok(());
    }

    let reconciler = session.reconciler()?;
    let opts = ExecuteOptions {
        dry_run: false,
        jobs,
        yes,
    };
    let summary = execute(&reconciler, &plan, &mut session.state, &opts)?;

    if summary.total_changes() > 0 || summary.failed > 0 {
        session.save_state()?;
    }

    if !summary.is_success() {
        bail!("{} credential(s) could not be destroyed", summary.failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use credential::backend::StoreOp;
    use credential::{AttributeValue, MemoryStore, ResourceDescriptor};
    use std::fs;
    use tempfile::TempDir;

    fn tracked(reconciler: &Reconciler<MemoryStore>) -> CredctlState {
        let mut state = CredctlState::default();
        let desc =
            ResourceDescriptor::new("cred1", "aws", "userpass").with_attributes([("user", "a")]);
        state.record("a", reconciler.create(&desc).unwrap());
        state
    }

    #[test]
    fn test_refresh_detects_drift() {
        let reconciler = Reconciler::new(MemoryStore::new());
        let mut state = tracked(&reconciler);

        reconciler.store().insert_controller(
            "aws",
            "cred1",
            "userpass",
            [("user".to_string(), AttributeValue::from("b"))]
                .into_iter()
                .collect(),
        );

        let drift = refresh_state(&reconciler, &mut state, None).unwrap();
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].changes, vec!["attributes.user: (changed)"]);
        assert_eq!(state.get("a").unwrap().attributes.as_ref().unwrap()["user"], "b");
    }

    #[test]
    fn test_refresh_failure_keeps_entry() {
        let reconciler = Reconciler::new(MemoryStore::new());
        let mut state = tracked(&reconciler);
        let before = state.clone();

        reconciler.store().fail_on(StoreOp::Read, "unreachable");
        assert!(refresh_state(&reconciler, &mut state, None).is_err());
        assert_eq!(state.resources, before.resources);
    }

    #[test]
    fn test_refresh_respects_target() {
        let reconciler = Reconciler::new(MemoryStore::new());
        let mut state = tracked(&reconciler);

        refresh_state(&reconciler, &mut state, Some("other")).unwrap();
        // Only the create call; nothing was read
        assert_eq!(reconciler.store().call_count(), 1);
    }

    const CONFIG: &str = r#"
[store]
path = "store.toml"

[credentials.aws_admin]
name = "cred1"
cloud = { name = "aws" }
auth_type = "userpass"

[credentials.aws_admin.attributes]
user = "a"
"#;

    fn context(dir: &TempDir) -> Context {
        Context {
            verbose: 0,
            quiet: true,
            config: Some(dir.path().join("credctl.toml")),
            state: Some(dir.path().join("state.toml")),
        }
    }

    fn apply_all(ctx: &Context) -> Result<()> {
        apply(
            ctx,
            &ApplyRequest {
                target: None,
                dry_run: false,
                yes: true,
                jobs: 2,
                no_refresh: false,
            },
        )
    }

    #[test]
    fn test_apply_then_destroy_end_to_end() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("credctl.toml"), CONFIG).unwrap();
        let ctx = context(&dir);

        apply_all(&ctx).unwrap();

        let state = CredctlState::load_from(&dir.path().join("state.toml")).unwrap();
        assert_eq!(
            state.get("aws_admin").unwrap().id.as_deref(),
            Some("cred1:aws:false:true")
        );
        assert!(dir.path().join("store.toml").exists());

        // Converged: a second apply changes nothing
        apply_all(&ctx).unwrap();
        plan(&ctx, None, false).unwrap();

        destroy(&ctx, None, true, 2).unwrap();
        let state = CredctlState::load_from(&dir.path().join("state.toml")).unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_apply_without_store_is_not_configured() {
        let dir = TempDir::new().unwrap();
        let config = CONFIG.replace("[store]\npath = \"store.toml\"\n", "");
        fs::write(dir.path().join("credctl.toml"), config).unwrap();

        let err = apply_all(&context(&dir)).unwrap_err();
        assert!(format!("{err:#}").contains("not configured"));
    }
}
