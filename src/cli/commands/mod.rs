//! CLI command implementations

pub mod check;
pub mod config;
pub mod forget;
pub mod get;
pub mod list;
pub mod set;

pub use check::execute as check;
pub use config::execute as config;
pub use forget::execute as forget;
pub use get::execute as get;
pub use list::execute as list;
pub use set::execute as set;

use crate::cache::StateCache;
use crate::cli::args::StateArgs;
use crate::config::{Config, ConfigManager};
use crate::error::{RootCacheError, RootCacheResult};
use crate::state::RootState;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Delay between lock attempts while another process holds the file
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Open the state cache and lock `server`, honoring `cache.lock_timeout_secs`
pub async fn lock_cache(config: &Config, server: &str) -> RootCacheResult<StateCache> {
    let dir = ConfigManager::cache_dir(config);
    ConfigManager::ensure_cache_dir(&dir).await?;
    let mut cache = StateCache::new(dir);

    let timeout_secs = config.cache.lock_timeout_secs;
    if timeout_secs == 0 {
        let server = server.to_string();
        return tokio::task::spawn_blocking(move || -> RootCacheResult<StateCache> {
            cache.lock(&server)?;
            Ok(cache)
        })
        .await
        .map_err(|e| RootCacheError::Internal(format!("lock task failed: {}", e)))?;
    }

    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    loop {
        if cache.try_lock(server)? {
            return Ok(cache);
        }
        if Instant::now() >= deadline {
            return Err(RootCacheError::LockTimeout {
                server: server.to_string(),
                waited_secs: timeout_secs,
            });
        }
        debug!("State file for {} is busy, retrying", server);
        sleep(LOCK_POLL_INTERVAL).await;
    }
}

/// Build the root state described on the command line
pub fn state_from_args(args: &StateArgs) -> RootCacheResult<RootState> {
    let tx_hash = RootState::parse_digest(&args.tx_hash)?;
    Ok(RootState::new(&args.target.database, args.tx_id, tx_hash))
}
