//! Command dispatch.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::command::{CheckCommand, Cli, Commands};
use super::{check, monitor, output, reconcile, server};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;

/// Configuration file used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "config.toml";

/// Resolve and load configuration.
///
/// An explicit path must exist. Without one, `config.toml` in the working
/// directory is used when present, otherwise defaults plus environment.
///
/// # Errors
///
/// Returns the load or validation error.
#[allow(clippy::result_large_err)]
pub fn load_config(explicit: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((Config::load(path)?, Some(path.to_path_buf())));
    }
    let fallback = PathBuf::from(DEFAULT_CONFIG);
    if fallback.is_file() {
        return Ok((Config::load(&fallback)?, Some(fallback)));
    }
    Ok((Config::from_env()?, None))
}

/// Run one parsed command line.
///
/// # Errors
///
/// Returns the first error from configuration, bootstrap or the operation.
pub async fn execute(cli: Cli) -> Result<()> {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet));

    let (config, source) = load_config(cli.config.as_deref())?;
    config.init_logging();
    debug!(source = ?source, backend = %config.orchestrator.kind, "Configuration loaded");

    if let Commands::Check(CheckCommand::Config) = cli.command {
        return check::execute_config(&config, source.as_deref());
    }

    let service = bootstrap::build_service(&config).await?;
    match cli.command {
        Commands::Create(args) => server::create(&service, args).await,
        Commands::List(args) => server::list(&service, args).await,
        Commands::Get(arg) => server::get(&service, &arg.id).await,
        Commands::Rename { id, name } => server::rename(&service, &id, name).await,
        Commands::Start(arg) => server::start(&service, &arg.id).await,
        Commands::Stop(arg) => server::stop(&service, &arg.id).await,
        Commands::Restart(arg) => server::restart(&service, &arg.id).await,
        Commands::Delete(arg) => server::delete(&service, &arg.id).await,
        Commands::Scale { id, replicas } => server::scale(&service, &id, replicas).await,
        Commands::Stats(args) => monitor::stats(&service, args).await,
        Commands::Health(args) => monitor::health(&service, args).await,
        Commands::Reconcile => reconcile::execute(&service).await,
        Commands::Check(CheckCommand::Config) => Ok(()),
    }
}
