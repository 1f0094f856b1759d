//! Command-line interface definitions.
//!
//! Every subcommand except `check config` builds the lifecycle service from
//! the loaded configuration and performs exactly one operation on it.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::server::{ServerStatus, ServerType};

/// Manage VPN, DPI, gateway and analytics servers on Docker or Kubernetes
#[derive(Parser, Debug)]
#[command(name = "server-manager")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file [default: config.toml when present]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision a new server
    Create(CreateArgs),

    /// List servers, newest first
    List(ListArgs),

    /// Show one server
    Get(IdArg),

    /// Change a server's name
    Rename {
        /// Server id
        id: String,
        /// New name (DNS-1123 label)
        name: String,
    },

    /// Start a stopped server
    Start(IdArg),

    /// Stop a running server
    Stop(IdArg),

    /// Stop then start a running server
    Restart(IdArg),

    /// Tear down a server's resources and tombstone it
    Delete(IdArg),

    /// Set the desired replica count of a running server
    Scale {
        /// Server id
        id: String,
        /// Replica count, at least one (use `stop` for zero)
        #[arg(allow_negative_numbers = true)]
        replicas: i32,
    },

    /// Show resource statistics
    Stats(StatsArgs),

    /// Show health verdicts
    Health(HealthArgs),

    /// Compare stored servers against backend resources
    Reconcile,

    /// Run diagnostic checks
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `server-manager check`.
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the configuration without contacting the backend
    Config,
}

/// A single server id argument.
#[derive(Parser, Debug)]
pub struct IdArg {
    /// Server id
    pub id: String,
}

/// Arguments for `create`.
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Server name (DNS-1123 label, becomes the backend resource name)
    pub name: String,

    /// Server type [vpn, dpi, gateway, analytics]
    #[arg(long = "type", short = 't')]
    pub server_type: ServerType,

    /// Deployment region
    #[arg(long, short)]
    pub region: String,

    /// Extra environment variable for the workload, KEY=VALUE (repeatable)
    #[arg(long = "env", short = 'e', value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Override the image command
    #[arg(long, num_args = 1.., allow_hyphen_values = true)]
    pub command: Option<Vec<String>>,
}

/// Arguments for `list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Only servers of this type
    #[arg(long = "type", short = 't')]
    pub server_type: Option<ServerType>,

    /// Only servers in this region
    #[arg(long, short)]
    pub region: Option<String>,

    /// Only servers in this status
    #[arg(long, short)]
    pub status: Option<ServerStatus>,

    /// Maximum number of servers to show
    #[arg(long)]
    pub limit: Option<usize>,

    /// Number of servers to skip
    #[arg(long)]
    pub offset: Option<usize>,
}

/// Arguments for `stats`.
#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Server id
    pub id: String,

    /// Sample the backend and store the result before showing it
    #[arg(long)]
    pub record: bool,

    /// Show this many stored samples instead of the latest one
    #[arg(long, value_name = "N")]
    pub history: Option<usize>,
}

/// Arguments for `health`.
#[derive(Parser, Debug)]
pub struct HealthArgs {
    /// Server id; every server's latest verdict when omitted
    pub id: Option<String>,

    /// Ask the backend for a fresh verdict and store it
    #[arg(long, requires = "id")]
    pub record: bool,
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
