//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// rootcache - remember verified ledger roots
///
/// Keeps the last verified root state per server and database so a
/// client can refuse states that roll the ledger back.
#[derive(Parser, Debug)]
#[command(name = "rootcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ROOTCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding state files (overrides cache.dir)
    #[arg(short, long, global = true, env = "ROOTCACHE_DIR")]
    pub dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the cached root state of a database
    Get(GetArgs),

    /// Record a verified root state
    Set(StateArgs),

    /// Check an offered root state against the cached one
    Check(CheckArgs),

    /// Mark a database as having no trustworthy previous state
    Forget(TargetArgs),

    /// List cached databases of a server
    List(ListArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Server and database a command operates on
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Server identity (UUID reported by the server)
    pub server: String,

    /// Database name
    pub database: String,
}

/// Arguments for the get command
#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments describing a root state
#[derive(Args, Debug)]
pub struct StateArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Transaction counter of the root
    #[arg(long)]
    pub tx_id: u64,

    /// Hex digest of the root
    #[arg(long)]
    pub tx_hash: String,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub state: StateArgs,

    /// Record the offered state when it passes
    #[arg(long)]
    pub commit: bool,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Server identity
    pub server: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}
