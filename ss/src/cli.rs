//! CLI argument parsing for sessionstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ss")]
#[command(author, version, about = "Inspect the waypoint session store", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the store directory
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the records of a collection
    List {
        /// Collection name (e.g. sessions, plans)
        #[arg(required = true)]
        collection: String,
    },

    /// Print a record as JSON
    Show {
        /// Collection name
        #[arg(required = true)]
        collection: String,

        /// Record id
        #[arg(required = true)]
        id: String,
    },

    /// Delete a record
    Delete {
        /// Collection name
        #[arg(required = true)]
        collection: String,

        /// Record id
        #[arg(required = true)]
        id: String,
    },

    /// Show per-collection statistics
    Stats,
}
