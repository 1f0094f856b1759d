use clap::Parser;
use server_manager::adapter::inbound::cli::{self, output, Cli};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tokio::select! {
        result = cli::execute(cli) => {
            if let Err(e) = result {
                error!(error = %e, kind = ?e.kind(), "Command failed");
                output::error(&e.to_string());
                std::process::exit(1);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            std::process::exit(130);
        }
    }
}
