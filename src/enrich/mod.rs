//! Download-count enrichment
//!
//! Folds npm download counts into the index-owned `totalDownloads`
//! counter of each hit. A failed lookup only affects its own hit.

use crate::error::{GatewayError, Result};
use crate::index::Hit;
use crate::stats::DownloadStats;
use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Enriched,
    Failed,
    Skipped,
}

/// Per-call counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichSummary {
    pub enriched: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct Enricher {
    stats: Arc<dyn DownloadStats>,
    package_prefix: String,
    start_date: NaiveDate,
    concurrency: usize,
}

impl Enricher {
    pub fn new(
        stats: Arc<dyn DownloadStats>,
        package_prefix: impl Into<String>,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            stats,
            package_prefix: package_prefix.into(),
            start_date,
            concurrency: 1,
        }
    }

    /// Allow up to `n` lookups in flight. Output order is unaffected.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub async fn enrich(&self, hits: Option<Vec<Hit>>) -> Result<Vec<Hit>> {
        self.enrich_with_summary(hits).await.map(|(hits, _)| hits)
    }

    /// Enrich every hit in order, reporting how many were updated.
    pub async fn enrich_with_summary(
        &self,
        hits: Option<Vec<Hit>>,
    ) -> Result<(Vec<Hit>, EnrichSummary)> {
        let hits = hits.ok_or_else(|| {
            GatewayError::InvalidInput("undefined search results passed to enrichment".to_string())
        })?;

        let end = Utc::now().date_naive();
        let results: Vec<(Hit, Outcome)> = stream::iter(hits)
            .map(|hit| self.enrich_hit(hit, end))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut summary = EnrichSummary::default();
        let hits = results
            .into_iter()
            .map(|(hit, outcome)| {
                match outcome {
                    Outcome::Enriched => summary.enriched += 1,
                    Outcome::Failed => summary.failed += 1,
                    Outcome::Skipped => summary.skipped += 1,
                }
                hit
            })
            .collect();

        Ok((hits, summary))
    }

    async fn enrich_hit(&self, mut hit: Hit, end: NaiveDate) -> (Hit, Outcome) {
        let Some(name) = hit.package_name().map(str::to_owned) else {
            return (hit, Outcome::Skipped);
        };
        let package = format!("{}{}", self.package_prefix, name);

        match self.stats.download_count(&package, self.start_date, end).await {
            Ok(count) => {
                if let Some(source) = hit.source.as_mut() {
                    source.npm_downloads = Some(Value::from(count.downloads));
                    if let Some(total) = source
                        .total_downloads
                        .as_ref()
                        .and_then(|total| add_downloads(total, count.downloads))
                    {
                        source.total_downloads = Some(total);
                    }
                }
                (hit, Outcome::Enriched)
            }
            Err(e) => {
                tracing::warn!("Error updating download data for package {}: {}", package, e);
                (hit, Outcome::Failed)
            }
        }
    }
}

/// Adds `downloads` to an integer counter, saturating at the integer bounds.
fn add_downloads(total: &Value, downloads: u64) -> Option<Value> {
    if let Some(total) = total.as_u64() {
        return Some(Value::from(total.saturating_add(downloads)));
    }
    let total = total.as_i64()?;
    let downloads = i64::try_from(downloads).unwrap_or(i64::MAX);
    Some(Value::from(total.saturating_add(downloads)))
}
