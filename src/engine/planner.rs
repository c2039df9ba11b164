//! Execution planner - decides what each credential needs
//!
//! Planning compares desired descriptors from config against the recorded
//! (usually freshly refreshed) descriptors from state:
//!
//! | config | state | outcome                                     |
//! |--------|-------|---------------------------------------------|
//! | yes    | no    | Create                                      |
//! | no     | yes   | Delete                                      |
//! | yes    | yes   | Replace if name or cloud changed            |
//! |        |       | Update if any mutable field changed         |
//! |        |       | NoOp otherwise                              |

use credential::{ResourceDescriptor, is_noop_update, schema};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// What apply will do to a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    /// Delete, then create again
    Replace,
    Delete,
    NoOp,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Replace => write!(f, "replace"),
            Action::Delete => write!(f, "delete"),
            Action::NoOp => write!(f, "no-op"),
        }
    }
}

/// Planned change for one address
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub address: String,
    pub action: Action,
    /// Recorded descriptor, absent for creates
    pub prior: Option<ResourceDescriptor>,
    /// Desired descriptor, absent for deletes
    pub desired: Option<ResourceDescriptor>,
    /// Attributes that force a replace
    pub replace_reasons: Vec<&'static str>,
}

impl PlannedChange {
    pub fn is_noop(&self) -> bool {
        self.action == Action::NoOp
    }
}

/// Counts of pending actions
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlanCounts {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
}

impl PlanCounts {
    pub fn total(&self) -> usize {
        self.create + self.update + self.replace + self.delete
    }
}

/// Ordered set of planned changes
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Plan {
    pub changes: Vec<PlannedChange>,
}

impl Plan {
    /// Plan converging `recorded` towards `desired`
    pub fn build(
        desired: &BTreeMap<String, ResourceDescriptor>,
        recorded: &BTreeMap<String, ResourceDescriptor>,
    ) -> Self {
        let addresses: BTreeSet<&String> = desired.keys().chain(recorded.keys()).collect();

        let changes = addresses
            .into_iter()
            .map(|address| plan_one(address, desired.get(address), recorded.get(address)))
            .collect();

        Self { changes }
    }

    /// Plan deleting every recorded credential
    pub fn destroy(recorded: &BTreeMap<String, ResourceDescriptor>) -> Self {
        let changes = recorded
            .iter()
            .map(|(address, prior)| plan_one(address, None, Some(prior)))
            .collect();

        Self { changes }
    }

    /// Keep only changes whose address matches `target`
    pub fn filtered(mut self, target: Option<&str>) -> Self {
        if let Some(target) = target {
            self.changes.retain(|c| matches_target(&c.address, target));
        }
        self
    }

    /// Changes that require work
    pub fn pending(&self) -> impl Iterator<Item = &PlannedChange> {
        self.changes.iter().filter(|c| !c.is_noop())
    }

    pub fn has_changes(&self) -> bool {
        self.pending().next().is_some()
    }

    pub fn counts(&self) -> PlanCounts {
        let mut counts = PlanCounts::default();
        for change in &self.changes {
            match change.action {
                Action::Create => counts.create += 1,
                Action::Update => counts.update += 1,
                Action::Replace => counts.replace += 1,
                Action::Delete => counts.delete += 1,
                Action::NoOp => {}
            }
        }
        counts
    }
}

fn plan_one(
    address: &str,
    desired: Option<&ResourceDescriptor>,
    prior: Option<&ResourceDescriptor>,
) -> PlannedChange {
    let (action, replace_reasons) = match (prior, desired) {
        (None, Some(_)) => (Action::Create, Vec::new()),
        (Some(_), None) => (Action::Delete, Vec::new()),
        (Some(prior), Some(desired)) => {
            let reasons = schema::replace_reasons(prior, desired);
            if !reasons.is_empty() {
                (Action::Replace, reasons)
            } else if !is_noop_update(prior, desired) {
                (Action::Update, Vec::new())
            } else {
                (Action::NoOp, Vec::new())
            }
        }
        (None, None) => (Action::NoOp, Vec::new()),
    };

    PlannedChange {
        address: address.to_string(),
        action,
        prior: prior.cloned(),
        desired: desired.cloned(),
        replace_reasons,
    }
}

/// Whether an address is selected by a target.
///
/// A target is an exact address, or a prefix ending in `*`.
pub fn matches_target(address: &str, target: &str) -> bool {
    match target.strip_suffix('*') {
        Some(prefix) => address.starts_with(prefix),
        None => address == target,
    }
}
