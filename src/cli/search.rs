use crate::cli::SearchArgs;
use crate::config::Config;
use crate::formatter::Format;
use crate::service::RegistryService;
use anyhow::{Context, Result};

/// Handle search command - one text search against the index
pub fn handle(cmd: &SearchArgs, config: &Config) -> Result<()> {
    let service = RegistryService::from_config(config)?;
    let rt = tokio::runtime::Runtime::new()?;

    let outcome = rt
        .block_on(service.search(&cmd.query, &cmd.filters(), cmd.output.page()))
        .with_context(|| format!("Search for {:?} failed", cmd.query))?;

    let formatter = Format::from_string(&cmd.output.format);
    formatter.format_hits(&outcome.hits)?;

    if outcome.summary.failed > 0 {
        log::warn!(
            "npm download stats unavailable for {} of {} hits",
            outcome.summary.failed,
            outcome.hits.len()
        );
    }

    Ok(())
}
