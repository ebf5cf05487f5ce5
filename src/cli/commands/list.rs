//! List command - show the databases cached for a server

use crate::cache::EntryStatus;
use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::Config;
use crate::error::RootCacheResult;
use console::style;

/// Execute the list command
pub async fn execute(args: ListArgs, config: &Config) -> RootCacheResult<()> {
    let mut cache = super::lock_cache(config, &args.server).await?;
    let entries = cache.entries(&args.server)?;
    let path = cache.state_file_path(&args.server);
    cache.unlock()?;

    match args.format {
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No cached states for {}.", args.server);
                return Ok(());
            }
            print_table(&entries);
            println!();
            println!("State file: {}", path.display());
        }
        OutputFormat::Json => print_json(&entries)?,
    }
    Ok(())
}

fn print_table(entries: &[(String, EntryStatus)]) {
    println!("{:<40} {:<10}", "DATABASE", "STATUS");
    println!("{}", "-".repeat(51));

    for (name, status) in entries {
        let status_display = match status {
            EntryStatus::Present => style("present").green().to_string(),
            EntryStatus::Tombstone => style("tombstone").dim().to_string(),
            EntryStatus::Corrupted => style("corrupted").red().to_string(),
        };
        println!("{:<40} {:<10}", name, status_display);
    }

    println!();
    println!("Total: {} database(s)", entries.len());
}

fn print_json(entries: &[(String, EntryStatus)]) -> RootCacheResult<()> {
    #[derive(serde::Serialize)]
    struct EntryJson<'a> {
        database: &'a str,
        status: String,
    }

    let json: Vec<EntryJson> = entries
        .iter()
        .map(|(name, status)| EntryJson {
            database: name,
            status: status.to_string(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
