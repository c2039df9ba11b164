// Declarative commands: plan, apply, refresh, destroy
pub mod declarative;

// Single-resource commands
pub mod id;
pub mod import;
pub mod show;

use anyhow::{Context as AnyhowContext, Result};
use credential::{FileStore, Reconciler};
use std::path::{Path, PathBuf};

use crate::Context;
use crate::config::CredctlConfig;
use crate::state::CredctlState;

/// Config and state loaded for one command run
pub struct Session {
    pub config: CredctlConfig,
    pub config_path: PathBuf,
    pub state: CredctlState,
    pub state_path: PathBuf,
}

impl Session {
    /// Load config and state for `ctx`
    pub fn open(ctx: &Context) -> Result<Self> {
        let config_path = ctx.config_path()?;
        let state_path = ctx.state_path()?;

        let config = CredctlConfig::load_from(&config_path)?;
        config.validate()?;
        let state = CredctlState::load_from(&state_path)?;

        Ok(Self {
            config,
            config_path,
            state,
            state_path,
        })
    }

    /// Directory relative paths in the config resolve against
    fn config_base(&self) -> &Path {
        self.config_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Reconciler over the configured store
    pub fn reconciler(&self) -> Result<Reconciler<FileStore>> {
        Reconciler::try_new(self.config.open_store(self.config_base())).with_context(|| {
            format!(
                "No [store] section in {}",
                self.config_path.display()
            )
        })
    }

    /// Stamp and persist state
    pub fn save_state(&mut self) -> Result<()> {
        self.state.touch(&self.state_path)
    }
}
