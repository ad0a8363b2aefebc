use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "weatherwatch",
    version,
    about = "Forecast-driven weather alerts for monitored buildings"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override SQLite data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scheduler: weather checks plus the daily digest (default)
    Run,
    /// Run a single weather check cycle and exit
    Once,
    /// Send the daily digest now, regardless of the configured hour
    Digest,
    /// Print the current status of every building
    Status,
    /// Validate config and test connections
    Check,
    /// Re-run interactive setup
    Init,
    /// Manage monitored buildings
    Location {
        #[command(subcommand)]
        action: LocationCommand,
    },
    /// Manage alert rules
    Rule {
        #[command(subcommand)]
        action: RuleCommand,
    },
    /// Manage interventions referenced by rules
    Intervention {
        #[command(subcommand)]
        action: InterventionCommand,
    },
}

#[derive(Subcommand)]
pub enum LocationCommand {
    /// Add or update a building
    Add {
        building_code: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Comma separated owner emails
        #[arg(long, value_delimiter = ',')]
        owners: Vec<String>,
    },
    List,
    /// Remove a building and its outcome history
    Remove { building_code: String },
}

#[derive(Subcommand)]
pub enum RuleCommand {
    /// Set the global rule for a kind, replacing any existing one
    Set {
        /// Windspeed or Precipitation
        kind: String,
        /// One of >, <, >=, <=, ==
        operator: String,
        threshold: f64,
        intervention: String,
    },
    /// Add a rule that only applies to one building
    Add {
        building_code: String,
        kind: String,
        operator: String,
        threshold: f64,
        intervention: String,
    },
    List,
    Remove { id: i64 },
}

#[derive(Subcommand)]
pub enum InterventionCommand {
    /// Add or update an intervention
    Add {
        id: String,
        title: String,
        #[arg(default_value = "")]
        description: String,
    },
    List,
    Remove { id: String },
}
