//! Execution engine - applies a plan with UI integration

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use credential::{CredentialStore, Reconciler, ResourceDescriptor};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::progress;
use crate::state::CredctlState;

use super::differ::display_plan;
use super::planner::{Action, Plan, PlannedChange};

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Number of parallel jobs
    pub jobs: usize,
    /// Skip confirmation prompts
    pub yes: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            yes: false,
        }
    }
}

/// What happened to one credential
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Created(ResourceDescriptor),
    Updated(ResourceDescriptor),
    Replaced(ResourceDescriptor),
    Deleted,
    Failed {
        error: String,
        /// The old credential is gone even though the operation failed
        /// (replace deleted it, then create failed)
        deleted: bool,
    },
}

/// Result of applying one planned change
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyResult {
    pub address: String,
    pub outcome: ApplyOutcome,
}

/// Summary of execution results
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub replaced: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.replaced + self.deleted
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Display, confirm and apply a plan, recording every success in `state`.
///
/// Failed changes leave their state entry as it was.
pub fn execute<S: CredentialStore>(
    reconciler: &Reconciler<S>,
    plan: &Plan,
    state: &mut CredctlState,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    display_plan(plan);

    let pending: Vec<&PlannedChange> = plan.pending().collect();
    if pending.is_empty() {
        return Ok(ExecuteSummary::default());
    }

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(ExecuteSummary::default());
    }

    if !opts.yes && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(ExecuteSummary {
            skipped: pending.len(),
            ..Default::default()
        });
    }

    println!();
    println!(
        "  {} Applying {} credential changes...",
        "→".cyan(),
        pending.len()
    );

    let results = execute_parallel(reconciler, &pending, opts.jobs)?;
    let summary = record_results(state, &results);

    for result in &results {
        if let ApplyOutcome::Failed { error, .. } = &result.outcome {
            println!("    {} {}: {}", "✗".red(), result.address, error);
        }
    }

    print_summary(&summary);
    Ok(summary)
}

/// Apply one change through the reconciler
pub fn apply_change<S: CredentialStore>(
    reconciler: &Reconciler<S>,
    change: &PlannedChange,
) -> ApplyOutcome {
    let failed = |err: credential::Error, deleted: bool| ApplyOutcome::Failed {
        error: err.to_string(),
        deleted,
    };

    match (change.action, &change.prior, &change.desired) {
        (Action::Create, _, Some(desired)) => match reconciler.create(desired) {
            Ok(created) => ApplyOutcome::Created(created),
            Err(e) => failed(e, false),
        },
        (Action::Update, Some(prior), Some(desired)) => match reconciler.update(prior, desired) {
            Ok(updated) => ApplyOutcome::Updated(updated),
            Err(e) => failed(e, false),
        },
        (Action::Replace, Some(prior), Some(desired)) => {
            if let Err(e) = reconciler.delete(prior) {
                return failed(e, false);
            }
            match reconciler.create(desired) {
                Ok(created) => ApplyOutcome::Replaced(created),
                Err(e) => failed(e, true),
            }
        }
        (Action::Delete, Some(prior), _) => match reconciler.delete(prior) {
            Ok(()) => ApplyOutcome::Deleted,
            Err(e) => failed(e, false),
        },
        (action, _, _) => ApplyOutcome::Failed {
            error: format!("inconsistent {action} plan for {}", change.address),
            deleted: false,
        },
    }
}

/// Fold apply results into state and count them
pub fn record_results(state: &mut CredctlState, results: &[ApplyResult]) -> ExecuteSummary {
    let mut summary = ExecuteSummary::default();

    for result in results {
        match &result.outcome {
            ApplyOutcome::Created(desc) => {
                state.record(&result.address, desc.clone());
                summary.created += 1;
            }
            ApplyOutcome::Updated(desc) => {
                state.record(&result.address, desc.clone());
                summary.updated += 1;
            }
            ApplyOutcome::Replaced(desc) => {
                state.record(&result.address, desc.clone());
                summary.replaced += 1;
            }
            ApplyOutcome::Deleted => {
                state.forget(&result.address);
                summary.deleted += 1;
            }
            ApplyOutcome::Failed { deleted, .. } => {
                if *deleted {
                    state.forget(&result.address);
                }
                summary.failed += 1;
            }
        }
    }

    summary
}

/// Order in which actions run.
///
/// Deletes free a (cloud, name) pair before anything else can claim it, and
/// creates run last so a renamed address never races the delete of its old one.
fn apply_phase(action: Action) -> u8 {
    match action {
        Action::Delete => 0,
        Action::Update | Action::Replace | Action::NoOp => 1,
        Action::Create => 2,
    }
}

/// Apply changes in parallel, one phase at a time
fn execute_parallel<S: CredentialStore>(
    reconciler: &Reconciler<S>,
    changes: &[&PlannedChange],
    jobs: usize,
) -> Result<Vec<ApplyResult>> {
    let pb = progress::bar(changes.len() as u64, "Applying");
    let results: Arc<Mutex<Vec<ApplyResult>>> = Arc::new(Mutex::new(Vec::new()));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .context("Failed to create apply thread pool")?;

    let mut phases: BTreeMap<u8, Vec<&PlannedChange>> = BTreeMap::new();
    for change in changes {
        phases
            .entry(apply_phase(change.action))
            .or_default()
            .push(change);
    }

    for (phase, batch) in &phases {
        log::debug!("Apply phase {phase}: {} change(s)", batch.len());
        pool.install(|| {
            batch.par_iter().for_each(|change| {
                let outcome = apply_change(reconciler, change);

                let symbol = match &outcome {
                    ApplyOutcome::Failed { .. } => "✗",
                    _ => "✓",
                };
                pb.set_message(format!("{} {}", symbol, change.address));
                pb.inc(1);

                push_apply_result(
                    &results,
                    ApplyResult {
                        address: change.address.clone(),
                        outcome,
                    },
                );
            });
        });
    }

    pb.finish_and_clear();

    let mut collected = into_apply_results(results)?;
    collected.sort_by(|a, b| a.address.cmp(&b.address));
    Ok(collected)
}

fn push_apply_result(results: &Arc<Mutex<Vec<ApplyResult>>>, result: ApplyResult) {
    match results.lock() {
        Ok(mut locked) => locked.push(result),
        Err(poisoned) => poisoned.into_inner().push(result),
    }
}

fn into_apply_results(results: Arc<Mutex<Vec<ApplyResult>>>) -> Result<Vec<ApplyResult>> {
    let mutex = Arc::try_unwrap(results)
        .map_err(|_| anyhow::anyhow!("Failed to collect apply results: shared result state"))?;

    match mutex.into_inner() {
        Ok(collected) => Ok(collected),
        Err(poisoned) => Ok(poisoned.into_inner()),
    }
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(false)
        .interact()?;

    Ok(confirmed)
}

/// Print final summary
fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Credentials applied successfully!", "✓".green().bold());
    } else {
        println!("  {} Credentials applied with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} updated", summary.updated);
    }
    if summary.replaced > 0 {
        println!("    • {} replaced", summary.replaced);
    }
    if summary.deleted > 0 {
        println!("    • {} deleted", summary.deleted);
    }
    if summary.skipped > 0 {
        println!("    • {} skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {}", summary.failed, "failed".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credential::MemoryStore;
    use credential::backend::StoreOp;

    fn desired(entries: &[(&str, ResourceDescriptor)]) -> BTreeMap<String, ResourceDescriptor> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn opts() -> ExecuteOptions {
        ExecuteOptions {
            yes: true,
            jobs: 2,
            ..Default::default()
        }
    }

    fn cred(name: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(name, "aws", "userpass").with_attributes([("user", "a")])
    }

    #[test]
    fn test_apply_creates_and_records() {
        let reconciler = Reconciler::new(MemoryStore::new());
        let mut state = CredctlState::default();

        let config = desired(&[("a", cred("cred1")), ("b", cred("cred2"))]);
        let plan = Plan::build(&config, &state.resources);
        let summary = execute(&reconciler, &plan, &mut state, &opts()).unwrap();

        assert_eq!(summary.created, 2);
        assert!(summary.is_success());
        assert_eq!(
            state.get("a").unwrap().id.as_deref(),
            Some("cred1:aws:false:true")
        );

        // Second run is a no-op
        let plan = Plan::build(&config, &state.resources);
        assert!(!plan.has_changes());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let reconciler = Reconciler::new(MemoryStore::new());
        let mut state = CredctlState::default();

        let plan = Plan::build(&desired(&[("a", cred("cred1"))]), &state.resources);
        let opts = ExecuteOptions {
            dry_run: true,
            ..opts()
        };
        let summary = execute(&reconciler, &plan, &mut state, &opts).unwrap();

        assert_eq!(summary.total_changes(), 0);
        assert!(state.is_empty());
        assert_eq!(reconciler.store().call_count(), 0);
    }

    #[test]
    fn test_failed_delete_keeps_state() {
        let reconciler = Reconciler::new(MemoryStore::new());
        let mut state = CredctlState::default();
        let created = reconciler.create(&cred("cred1")).unwrap();
        state.record("a", created.clone());

        reconciler.store().fail_on(StoreOp::Destroy, "controller unreachable");
        let plan = Plan::destroy(&state.resources);
        let summary = execute(&reconciler, &plan, &mut state, &opts()).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(state.get("a"), Some(&created));
    }

    #[test]
    fn test_update_and_delete() {
        let reconciler = Reconciler::new(MemoryStore::new());
        let mut state = CredctlState::default();
        state.record("a", reconciler.create(&cred("cred1")).unwrap());
        state.record("b", reconciler.create(&cred("cred2")).unwrap());

        let config = desired(&[("a", cred("cred1").with_scopes(true, true))]);
        let plan = Plan::build(&config, &state.resources);
        let summary = execute(&reconciler, &plan, &mut state, &opts()).unwrap();

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.deleted, 1);
        assert_eq!(
            state.get("a").unwrap().id.as_deref(),
            Some("cred1:aws:true:true")
        );
        assert!(state.get("b").is_none());
    }

    #[test]
    fn test_replace_failure_forgets_deleted_credential() {
        let reconciler = Reconciler::new(MemoryStore::new());
        let mut state = CredctlState::default();
        state.record("a", reconciler.create(&cred("cred1")).unwrap());

        reconciler.store().fail_on(StoreOp::Create, "quota exceeded");
        let plan = Plan::build(&desired(&[("a", cred("renamed"))]), &state.resources);
        assert_eq!(plan.changes[0].action, Action::Replace);

        let summary = execute(&reconciler, &plan, &mut state, &opts()).unwrap();
        assert_eq!(summary.failed, 1);
        assert!(state.get("a").is_none());

        // Next plan creates it from scratch
        reconciler.store().clear_failure(StoreOp::Create);
        let plan = Plan::build(&desired(&[("a", cred("renamed"))]), &state.resources);
        assert_eq!(plan.changes[0].action, Action::Create);
    }

    #[test]
    fn push_apply_result_handles_poisoned_mutex() {
        let results: Arc<Mutex<Vec<ApplyResult>>> = Arc::new(Mutex::new(Vec::new()));
        let poisoned = Arc::clone(&results);

        let _ = std::thread::spawn(move || {
            let _guard = poisoned
                .lock()
                .expect("lock should succeed before poisoning");
            panic!("intentional poison");
        })
        .join();

        push_apply_result(
            &results,
            ApplyResult {
                address: "a".into(),
                outcome: ApplyOutcome::Deleted,
            },
        );

        let collected = into_apply_results(results).expect("poisoned mutex should be recovered");
        assert_eq!(collected.len(), 1);
    }

    #[test]
    fn test_renamed_address_deletes_before_create() {
        let reconciler = Reconciler::new(MemoryStore::new());
        let mut state = CredctlState::default();
        state.record("old", reconciler.create(&cred("cred1")).unwrap());

        let config = desired(&[("new", cred("cred1"))]);
        let plan = Plan::build(&config, &state.resources);
        let opts = ExecuteOptions { jobs: 1, ..opts() };
        let summary = execute(&reconciler, &plan, &mut state, &opts).unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.created, 1);
        assert!(state.get("old").is_none());
        assert_eq!(
            state.get("new").unwrap().id.as_deref(),
            Some("cred1:aws:false:true")
        );
        assert_eq!(reconciler.store().document().len(), 1);

        let ops: Vec<StoreOp> = reconciler.store().calls().iter().map(|c| c.op).collect();
        assert_eq!(ops, vec![StoreOp::Create, StoreOp::Destroy, StoreOp::Create]);
    }

    #[test]
    fn test_apply_phase_order() {
        assert!(apply_phase(Action::Delete) < apply_phase(Action::Replace));
        assert!(apply_phase(Action::Replace) < apply_phase(Action::Create));
        assert_eq!(apply_phase(Action::Update), apply_phase(Action::Replace));
    }
}
