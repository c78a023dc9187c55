use crate::cli::PluginsArgs;
use crate::config::Config;
use crate::formatter::Format;
use crate::service::RegistryService;
use anyhow::{Context, Result};

/// Handle plugins command - list plugins of one asset type
pub fn handle(cmd: &PluginsArgs, config: &Config) -> Result<()> {
    let service = RegistryService::from_config(config)?;
    let rt = tokio::runtime::Runtime::new()?;

    let outcome = rt
        .block_on(service.plugins(&cmd.asset_type, &cmd.filters(), cmd.output.page()))
        .with_context(|| format!("Listing {} plugins failed", cmd.asset_type))?;

    Format::from_string(&cmd.output.format).format_hits(&outcome.hits)
}
