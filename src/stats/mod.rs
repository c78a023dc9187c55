// npm download statistics client

use crate::config::StatsConfig;
use crate::error::{GatewayError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

/// Time allowed until response headers arrive
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(3);
/// Absolute limit for the whole call, body included
pub const DEADLINE: Duration = Duration::from_secs(5);

/// Successful lookup result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadCount {
    pub status_code: u16,
    pub downloads: u64,
}

/// Looks up cumulative download counts for a package
#[async_trait]
pub trait DownloadStats: Send + Sync {
    async fn download_count(
        &self,
        package: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DownloadCount>;
}

#[derive(Debug, Deserialize)]
struct PointResponse {
    downloads: u64,
}

/// Client for the npm downloads "point" API
pub struct NpmStatsClient {
    client: reqwest::Client,
    base_url: String,
    response_timeout: Duration,
    deadline: Duration,
}

impl NpmStatsClient {
    pub fn new(config: &StatsConfig) -> Result<Self> {
        Self::with_timeouts(config, RESPONSE_TIMEOUT, DEADLINE)
    }

    pub fn with_timeouts(
        config: &StatsConfig,
        response_timeout: Duration,
        deadline: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(deadline).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            response_timeout,
            deadline,
        })
    }

    pub fn point_url(&self, package: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/downloads/point/{}:{}/{}",
            self.base_url,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
            package
        )
    }
}

#[async_trait]
impl DownloadStats for NpmStatsClient {
    async fn download_count(
        &self,
        package: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DownloadCount> {
        let url = self.point_url(package, start, end);

        let response = tokio::time::timeout(self.response_timeout, self.client.get(&url).send())
            .await
            .map_err(|_| {
                GatewayError::Stats(format!(
                    "no response from {} within {:?}",
                    url, self.response_timeout
                ))
            })?
            .map_err(|e| GatewayError::Stats(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Stats(format!(
                "{} returned {}",
                url,
                status.as_u16()
            )));
        }

        let body: PointResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Stats(format!("{} exceeded the {:?} deadline", url, self.deadline))
            } else {
                GatewayError::Stats(format!("malformed response from {}: {}", url, e))
            }
        })?;

        Ok(DownloadCount {
            status_code: status.as_u16(),
            downloads: body.downloads,
        })
    }
}
