//! Execution engine for credctl
//!
//! The engine orchestrates:
//! 1. Planning - Compare config against recorded state
//! 2. Diffing - Show what would change for each credential
//! 3. Executing - Drive the reconciler in parallel and record the results

pub mod differ;
pub mod executor;
pub mod planner;

pub use executor::{ExecuteOptions, execute};
pub use planner::Plan;
