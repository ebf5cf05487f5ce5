//! Set command - record a verified root state

use crate::cli::args::StateArgs;
use crate::config::Config;
use crate::error::RootCacheResult;
use console::style;
use tracing::info;

/// Execute the set command
pub async fn execute(args: StateArgs, config: &Config) -> RootCacheResult<()> {
    let state = super::state_from_args(&args)?;

    let mut cache = super::lock_cache(config, &args.target.server).await?;
    cache.set(&args.target.server, &args.target.database, &state)?;
    cache.unlock()?;

    info!("Recorded {} for server {}", state, args.target.server);
    println!(
        "{} Stored {} at tx {} ({})",
        style("✓").green(),
        state.database,
        state.tx_id,
        state.fingerprint()
    );
    Ok(())
}
