use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use credential::ResourceDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// ============================================================================
// State Structures
// ============================================================================

/// Recorded state of every managed credential
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CredctlState {
    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,

    /// Descriptor of each credential as last reconciled, keyed by address
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDescriptor>,
}

impl Default for CredctlState {
    fn default() -> Self {
        Self {
            last_updated: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

// ============================================================================
// CredctlState Implementation
// ============================================================================

impl CredctlState {
    /// Load state from `path`, or return default if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content = toml::to_string_pretty(&self).context("Failed to serialize state to TOML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    /// Update the last_updated timestamp and save
    pub fn touch(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Utc::now();
        self.save_to(path)
    }

    // ========================================================================
    // Resource Helpers
    // ========================================================================

    pub fn get(&self, address: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(address)
    }

    /// Record the descriptor returned by a successful operation
    pub fn record(&mut self, address: &str, desc: ResourceDescriptor) {
        self.resources.insert(address.to_string(), desc);
    }

    /// Forget a credential after it was deleted
    pub fn forget(&mut self, address: &str) -> Option<ResourceDescriptor> {
        self.resources.remove(address)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
