//! Get command - show the cached root state of a database

use crate::cli::args::{GetArgs, OutputFormat};
use crate::config::Config;
use crate::error::RootCacheResult;
use crate::state::RootState;
use console::style;

/// Execute the get command
pub async fn execute(args: GetArgs, config: &Config) -> RootCacheResult<()> {
    let mut cache = super::lock_cache(config, &args.target.server).await?;
    let state = cache.get(&args.target.server, &args.target.database)?;
    cache.unlock()?;

    match args.format {
        OutputFormat::Text => print_state(&state),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
    }
    Ok(())
}

fn print_state(state: &RootState) {
    println!("{:<12} {}", style("database").bold(), state.database);
    println!("{:<12} {}", style("tx").bold(), state.tx_id);
    println!("{:<12} {}", style("hash").bold(), hex::encode(&state.tx_hash));
    println!(
        "{:<12} {}",
        style("recorded").bold(),
        state.recorded_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{:<12} {}", style("fingerprint").bold(), state.fingerprint());
}
