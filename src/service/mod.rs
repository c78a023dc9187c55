// Search pipeline: query construction, index lookup, download enrichment

use crate::config::Config;
use crate::enrich::{EnrichSummary, Enricher};
use crate::error::{GatewayError, Result};
use crate::index::{ElasticsearchClient, Hit, SearchIndex};
use crate::query::{build_plugins_query, build_search_query, FilterSpec, Pagination};
use crate::stats::{DownloadStats, NpmStatsClient};
use std::sync::Arc;

/// Per-request paging as sent by the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub result_size: Option<usize>,
    pub skip_index: Option<usize>,
}

/// Enriched hits plus enrichment counts
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub hits: Vec<Hit>,
    pub summary: EnrichSummary,
}

pub struct RegistryService {
    index: Arc<dyn SearchIndex>,
    enricher: Enricher,
    index_name: String,
    page_size: usize,
}

impl RegistryService {
    /// Wire the HTTP clients described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let index = Arc::new(ElasticsearchClient::new(&config.index)?);
        let stats = Arc::new(NpmStatsClient::new(&config.stats)?);
        Self::with_clients(config, index, stats)
    }

    pub fn with_clients(
        config: &Config,
        index: Arc<dyn SearchIndex>,
        stats: Arc<dyn DownloadStats>,
    ) -> Result<Self> {
        let start_date = config.stats.start_date.ok_or_else(|| {
            GatewayError::Config("download stats start date is not configured".to_string())
        })?;
        let enricher = Enricher::new(stats, config.stats.package_prefix.clone(), start_date)
            .with_concurrency(config.stats.concurrency);

        Ok(Self {
            index,
            enricher,
            index_name: config.index.index_name.clone(),
            page_size: config.index.page_size,
        })
    }

    fn pagination(&self, page: PageRequest) -> Pagination {
        Pagination::new(
            page.result_size.unwrap_or(self.page_size),
            page.skip_index.unwrap_or(0),
        )
    }

    /// Free-text search over plugin metadata
    pub async fn search(
        &self,
        query: &str,
        filters: &FilterSpec,
        page: PageRequest,
    ) -> Result<SearchOutcome> {
        let structured = build_search_query(&self.index_name, query, filters, self.pagination(page))?;
        self.run(&structured).await
    }

    /// Plugins of one asset type, optionally narrowed by keywords
    pub async fn plugins(
        &self,
        asset_type: &str,
        filters: &FilterSpec,
        page: PageRequest,
    ) -> Result<SearchOutcome> {
        let structured =
            build_plugins_query(&self.index_name, asset_type, filters, self.pagination(page))?;
        self.run(&structured).await
    }

    async fn run(&self, query: &crate::query::StructuredQuery) -> Result<SearchOutcome> {
        let hits = self.index.search(query).await?;
        let (hits, summary) = self.enricher.enrich_with_summary(Some(hits)).await?;
        tracing::debug!(
            "{} hits: {} enriched, {} failed, {} skipped",
            hits.len(),
            summary.enriched,
            summary.failed,
            summary.skipped
        );
        Ok(SearchOutcome { hits, summary })
    }
}
