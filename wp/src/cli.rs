//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// Waypoint - conversational trip intake and travel planner
#[derive(Parser)]
#[command(
    name = "wp",
    about = "Conversational trip intake and multi-phase travel planner",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Collect a trip request through conversation (default)
    Chat {
        /// Resume a stored session (id or unique fragment)
        #[arg(short, long)]
        resume: Option<String>,

        /// Plan with scripted step outputs instead of the LLM
        #[arg(long, value_name = "FIXTURES")]
        replay: Option<PathBuf>,
    },

    /// Plan a trip from a request file or a completed session
    Plan {
        /// Request file (JSON or YAML)
        #[arg(value_name = "REQUEST", required_unless_present = "session", conflicts_with = "session")]
        request: Option<PathBuf>,

        /// Completed session to take the request from
        #[arg(short, long)]
        session: Option<String>,

        /// Scripted step outputs instead of the LLM
        #[arg(long, value_name = "FIXTURES")]
        replay: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Also write the plan JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not store the compiled plan
        #[arg(long)]
        no_save: bool,
    },

    /// List stored sessions
    Sessions,

    /// List stored plans
    Plans,

    /// Print a stored plan
    ShowPlan {
        /// Plan id (or unique fragment)
        id: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a stored session
    DeleteSession {
        /// Session id (or unique fragment)
        id: String,
    },

    /// Delete a stored plan
    DeletePlan {
        /// Plan id (or unique fragment)
        id: String,
    },

    /// Print the effective configuration as YAML
    Config,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("waypoint")
        .join("logs")
        .join("waypoint.log")
}

/// Help footer naming the log location
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}\n", get_log_path().display())
}

/// Output format for plan commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
