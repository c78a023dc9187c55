use crate::query::{FilterSpec, SortOrder};
use crate::service::PageRequest;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Plugin registry gateway - search and list plugins with npm download stats
#[derive(Parser, Debug)]
#[command(name = "registry-gateway")]
#[command(version)]
#[command(about = "Plugin registry gateway with npm download stats", long_about = None)]
pub struct Cli {
    /// YAML config file; environment variables override its values
    #[arg(long, global = true, env = "REGISTRY_GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

// CLI submodule declarations
pub mod plugins;
pub mod search;
pub mod serve;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP gateway
    Serve(ServeArgs),

    /// Run one text search and print the enriched hits
    Search(SearchArgs),

    /// List plugins of one asset type and print the enriched hits
    Plugins(PluginsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host to bind to (overrides SERVER_HOST)
    #[arg(long)]
    pub host: Option<String>,
    /// Port to listen on (overrides SERVER_PORT)
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Args)]
pub struct OutputOptions {
    /// Output format: cli, json, md, csv, names
    #[arg(long, default_value = "cli")]
    pub format: String,
    /// Number of results to return
    #[arg(short = 'n', long)]
    pub size: Option<usize>,
    /// Number of results to skip
    #[arg(long)]
    pub skip: Option<usize>,
    /// Sort by total downloads: asc or desc
    #[arg(long, value_parser = parse_sort)]
    pub sort: Option<SortOrder>,
}

impl OutputOptions {
    pub fn page(&self) -> PageRequest {
        PageRequest {
            result_size: self.size,
            skip_index: self.skip,
        }
    }
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search text
    pub query: String,
    /// Extra field to match against (repeatable)
    #[arg(short, long = "field")]
    pub fields: Vec<String>,
    /// Restrict to an asset type
    #[arg(long)]
    pub asset_type: Option<String>,
    #[command(flatten)]
    pub output: OutputOptions,
}

impl SearchArgs {
    pub fn filters(&self) -> FilterSpec {
        FilterSpec {
            fields: (!self.fields.is_empty()).then(|| self.fields.clone()),
            keywords: None,
            asset_type: self.asset_type.clone(),
            sort_by: self.output.sort,
        }
    }
}

#[derive(Args, Debug)]
pub struct PluginsArgs {
    /// Asset type: EXTENSION or THEME
    pub asset_type: String,
    /// Keyword every plugin must carry (repeatable)
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,
    #[command(flatten)]
    pub output: OutputOptions,
}

impl PluginsArgs {
    pub fn filters(&self) -> FilterSpec {
        FilterSpec {
            fields: None,
            keywords: (!self.keywords.is_empty()).then(|| self.keywords.clone()),
            asset_type: None,
            sort_by: self.output.sort,
        }
    }
}

fn parse_sort(s: &str) -> Result<SortOrder, String> {
    match s.to_lowercase().as_str() {
        "asc" => Ok(SortOrder::Asc),
        "desc" => Ok(SortOrder::Desc),
        other => Err(format!("expected asc or desc, got {:?}", other)),
    }
}
