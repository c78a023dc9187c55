use crate::error::{GatewayError, Result};
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable pointing at an optional YAML config file
pub const CONFIG_PATH_ENV: &str = "REGISTRY_GATEWAY_CONFIG";

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_NPM_BASE_URL: &str = "https://api.npmjs.org";
pub const DEFAULT_PACKAGE_PREFIX: &str = "@phoenix-plugin-registry/";

/// Environment variable names
pub mod env {
    pub const INDEX_HOST_ADDRESS: &str = "ELASTIC_SEARCH_HOST_ADDRESS";
    pub const INDEX_NAME: &str = "ELASTIC_SEARCH_INDEX_NAME";
    pub const PAGE_SIZE: &str = "ELASTIC_SEARCH_PAGE_SIZE";
    pub const STATS_START_DATE: &str = "NPM_STATS_START_DATE";
    pub const STATS_BASE_URL: &str = "NPM_STATS_BASE_URL";
    pub const PACKAGE_PREFIX: &str = "NPM_PACKAGE_PREFIX";
    pub const STATS_CONCURRENCY: &str = "NPM_STATS_CONCURRENCY";
    pub const REGISTERED_CLIENT_IDS: &str = "REGISTERED_CLIENT_IDS";
    pub const SERVER_HOST: &str = "SERVER_HOST";
    pub const SERVER_PORT: &str = "SERVER_PORT";
}

/// Search index connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub host_address: String,
    #[serde(default)]
    pub index_name: String,
    /// Result size used when a request omits `resultSize`
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_index_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            host_address: String::new(),
            index_name: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: default_index_timeout_secs(),
        }
    }
}

/// npm download statistics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_npm_base_url")]
    pub base_url: String,
    #[serde(default = "default_package_prefix")]
    pub package_prefix: String,
    /// First day counted towards npm downloads
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Max lookups in flight per request; 1 keeps them strictly sequential
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            base_url: default_npm_base_url(),
            package_prefix: default_package_prefix(),
            start_date: None,
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub stats: StatsConfig,

    /// Client identifiers allowed to call the API
    #[serde(default)]
    pub registered_clients: Vec<String>,

    #[serde(default)]
    pub listen: ListenConfig,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_index_timeout_secs() -> u64 {
    10
}

fn default_npm_base_url() -> String {
    DEFAULT_NPM_BASE_URL.to_string()
}

fn default_package_prefix() -> String {
    DEFAULT_PACKAGE_PREFIX.to_string()
}

fn default_concurrency() -> usize {
    1
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration: optional YAML file, then environment overrides.
    ///
    /// The file is taken from `path`, falling back to `$REGISTRY_GATEWAY_CONFIG`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(|p| expand_path(&p)));

        let mut config = match file {
            Some(file) => Self::from_file(&file)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let path = expand_path(&path.to_string_lossy());
        info!("Loading configuration from: {:?}", path);
        let content = fs::read_to_string(&path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Override fields with values from `lookup` (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(env::INDEX_HOST_ADDRESS) {
            self.index.host_address = host;
        }
        if let Some(name) = lookup(env::INDEX_NAME) {
            self.index.index_name = name;
        }
        if let Some(size) = lookup(env::PAGE_SIZE) {
            self.index.page_size = parse_var(env::PAGE_SIZE, &size)?;
        }
        if let Some(date) = lookup(env::STATS_START_DATE) {
            let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
                GatewayError::Config(format!("{} must be YYYY-MM-DD: {}", env::STATS_START_DATE, e))
            })?;
            self.stats.start_date = Some(date);
        }
        if let Some(url) = lookup(env::STATS_BASE_URL) {
            self.stats.base_url = url;
        }
        if let Some(prefix) = lookup(env::PACKAGE_PREFIX) {
            self.stats.package_prefix = prefix;
        }
        if let Some(n) = lookup(env::STATS_CONCURRENCY) {
            self.stats.concurrency = parse_var(env::STATS_CONCURRENCY, &n)?;
        }
        if let Some(ids) = lookup(env::REGISTERED_CLIENT_IDS) {
            self.registered_clients = parse_client_ids(&ids);
        }
        if let Some(host) = lookup(env::SERVER_HOST) {
            self.listen.host = host;
        }
        if let Some(port) = lookup(env::SERVER_PORT) {
            self.listen.port = parse_var(env::SERVER_PORT, &port)?;
        }
        Ok(())
    }

    /// Check that every required value is present and sane
    pub fn validate(&self) -> Result<()> {
        if self.index.host_address.trim().is_empty() {
            return Err(missing(env::INDEX_HOST_ADDRESS));
        }
        if self.index.index_name.trim().is_empty() {
            return Err(missing(env::INDEX_NAME));
        }
        if self.stats.start_date.is_none() {
            return Err(missing(env::STATS_START_DATE));
        }
        if self.index.page_size == 0 {
            return Err(GatewayError::Config(format!("{} must be positive", env::PAGE_SIZE)));
        }
        if self.index.timeout_secs == 0 {
            return Err(GatewayError::Config(
                "index.timeout_secs must be positive".to_string(),
            ));
        }
        if self.stats.concurrency == 0 {
            return Err(GatewayError::Config(format!(
                "{} must be positive",
                env::STATS_CONCURRENCY
            )));
        }
        if self.registered_clients.is_empty() {
            warn!("No registered client IDs configured; every request will be rejected");
        }
        Ok(())
    }
}

/// Split a comma-separated client id list, dropping blanks
pub fn parse_client_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| GatewayError::Config(format!("{}={:?}: {}", name, value, e)))
}

fn missing(name: &str) -> GatewayError {
    GatewayError::Config(format!("{} is required", name))
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
