use anyhow::{Context, Result};
use clap::Parser;
use registry_gateway::cli::{self, Commands};
use registry_gateway::config::Config;
use registry_gateway::server::init_logging;

fn main() -> Result<()> {
    init_logging();

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    tracing::info!("Configuration loaded successfully");
    tracing::info!(
        "Index: {}/{} (page size {})",
        config.index.host_address,
        config.index.index_name,
        config.index.page_size
    );

    // Dispatch commands
    match &cli.command {
        Commands::Serve(cmd) => cli::serve::handle(cmd, &config)?,
        Commands::Search(cmd) => cli::search::handle(cmd, &config)?,
        Commands::Plugins(cmd) => cli::plugins::handle(cmd, &config)?,
    }

    Ok(())
}
