use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use sessionstore::Store;
use sessionstore::cli::{Cli, Command};
use sessionstore::config::Config;

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store_path = cli.store.unwrap_or(config.store_path);

    info!("sessionstore opening {}", store_path.display());
    let store = Store::open(&store_path)?;

    match cli.command {
        Command::List { collection } => {
            let entries = store.entries(&collection)?;
            if entries.is_empty() {
                println!("No records in {}", collection);
            } else {
                for entry in entries {
                    let modified = chrono::DateTime::from_timestamp_millis(entry.modified_ms)
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_default();
                    println!(
                        "{}  {}  {}",
                        entry.id.cyan(),
                        modified.dimmed(),
                        format!("{}B", entry.bytes).dimmed()
                    );
                }
            }
        }
        Command::Show { collection, id } => match store.get_raw(&collection, &id)? {
            Some(content) => println!("{}", content),
            None => {
                eprintln!("{} No record {} in {}", "✗".red(), id, collection);
                std::process::exit(1);
            }
        },
        Command::Delete { collection, id } => {
            if store.delete_raw(&collection, &id)? {
                println!("{} Deleted {}/{}", "✓".green(), collection, id);
            } else {
                println!("No record {} in {}", id, collection);
            }
        }
        Command::Stats => {
            println!("Store: {}", store.base_path().display().to_string().cyan());
            for stats in store.stats()? {
                println!("  {}: {} records, {} bytes", stats.name, stats.record_count, stats.total_bytes);
            }
        }
    }

    Ok(())
}
