//! rootcache - verified ledger root cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use rootcache::cli::{Cli, Commands};
use rootcache::config::ConfigManager;
use rootcache::error::RootCacheResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> RootCacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;
    if let Some(dir) = cli.dir {
        config.cache.dir = Some(dir);
    }

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("rootcache=warn"),
        1 => EnvFilter::new("rootcache=info"),
        _ => EnvFilter::new("rootcache=debug"),
    };

    if config.general.json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }

    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::Get(args) => rootcache::cli::commands::get(args, &config).await,
        Commands::Set(args) => rootcache::cli::commands::set(args, &config).await,
        Commands::Check(args) => rootcache::cli::commands::check(args, &config).await,
        Commands::Forget(args) => rootcache::cli::commands::forget(args, &config).await,
        Commands::List(args) => rootcache::cli::commands::list(args, &config).await,
        Commands::Config(args) => {
            rootcache::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
