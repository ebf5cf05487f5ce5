//! Check command - compare an offered root state with the cached one

use crate::cli::args::CheckArgs;
use crate::config::Config;
use crate::error::RootCacheResult;
use console::style;
use tracing::{debug, warn};

/// Execute the check command
///
/// Exits with an error on rollback. With `--commit`, a passing state is
/// written back under the same lock so no other client can slip in between
/// the check and the update.
pub async fn execute(args: CheckArgs, config: &Config) -> RootCacheResult<()> {
    let offered = super::state_from_args(&args.state)?;
    let target = &args.state.target;

    let mut cache = super::lock_cache(config, &target.server).await?;

    match cache.get(&target.server, &target.database) {
        Ok(cached) => {
            if let Err(e) = cached.check_successor(&offered) {
                warn!("Rejected state for {}: {}", target.database, e);
                return Err(e);
            }
            println!(
                "{} tx {} follows cached tx {}",
                style("✓").green(),
                offered.tx_id,
                cached.tx_id
            );
        }
        Err(e) if e.is_benign() => {
            debug!("No previous state for {}, first contact", target.database);
            println!(
                "{} No previous state for {}, nothing to compare",
                style("○").dim(),
                target.database
            );
        }
        Err(e) => return Err(e),
    }

    if args.commit {
        cache.set(&target.server, &target.database, &offered)?;
        println!("{} Stored tx {}", style("✓").green(), offered.tx_id);
    }

    cache.unlock()
}
