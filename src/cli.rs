use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "credctl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative management of cloud credentials", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: $CREDCTL_CONFIG_DIR/credctl.toml)
    #[arg(short, long, global = true, env = "CREDCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// State file (default: $CREDCTL_STATE_DIR/state.toml)
    #[arg(long, global = true, env = "CREDCTL_STATE")]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(PlanArgs),

    /// Make the credential store match the config
    Apply(ApplyArgs),

    /// Re-read every tracked credential and report drift
    Refresh(TargetArgs),

    /// Start tracking an existing credential
    Import {
        /// Address to track it under
        address: String,

        /// Identifier, name:cloud:client:controller
        id: String,
    },

    /// Delete tracked credentials
    Destroy(DestroyArgs),

    /// Show tracked credentials
    Show(ShowArgs),

    /// Encode or decode credential identifiers
    #[command(subcommand)]
    Id(IdCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Plan / Apply / Destroy
// ============================================================================

#[derive(Parser)]
pub struct TargetArgs {
    /// Only this address (a trailing * matches a prefix)
    pub target: Option<String>,
}

#[derive(Parser)]
pub struct PlanArgs {
    /// Only this address (a trailing * matches a prefix)
    pub target: Option<String>,

    /// Plan against recorded state without reading the store
    #[arg(long)]
    pub no_refresh: bool,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Only this address (a trailing * matches a prefix)
    pub target: Option<String>,

    /// Dry run - show what would be done
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Apply against recorded state without reading the store first
    #[arg(long)]
    pub no_refresh: bool,
}

#[derive(Parser)]
pub struct DestroyArgs {
    /// Only this address (a trailing * matches a prefix)
    pub target: Option<String>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}

#[derive(Parser)]
pub struct ShowArgs {
    /// Only this address (a trailing * matches a prefix)
    pub target: Option<String>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// Identifier Commands
// ============================================================================

#[derive(Subcommand)]
pub enum IdCommand {
    /// Build an identifier from its parts
    Encode {
        /// Credential name
        name: String,

        /// Cloud name
        cloud: String,

        /// Credential is added to the client
        #[arg(long)]
        client: bool,

        /// Credential is not added to the controller
        #[arg(long)]
        no_controller: bool,
    },

    /// Split an identifier into its parts
    Decode {
        /// Identifier, name:cloud:client:controller
        id: String,
    },
}
