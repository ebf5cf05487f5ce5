//! Forget command - write a tombstone for a database

use crate::cli::args::TargetArgs;
use crate::config::Config;
use crate::error::RootCacheResult;
use console::style;

/// Execute the forget command
pub async fn execute(args: TargetArgs, config: &Config) -> RootCacheResult<()> {
    let mut cache = super::lock_cache(config, &args.server).await?;
    cache.invalidate(&args.server, &args.database)?;
    cache.unlock()?;

    println!(
        "{} Forgot previous state of {}",
        style("✓").green(),
        args.database
    );
    Ok(())
}
