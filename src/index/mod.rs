// Search index client

use crate::config::IndexConfig;
use crate::error::{GatewayError, Result};
use crate::query::StructuredQuery;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Reads a field that is present in the document, keeping an explicit
/// `null` as `Some(Value::Null)` so it serializes back unchanged.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Indexed document
///
/// Fields the gateway reads are held as raw JSON so that a document with
/// unexpected types still passes through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitSource {
    /// Nested plugin metadata (`name`, `title`, `assetType`, `keywords`, ...)
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Download counter owned by the index
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub total_downloads: Option<Value>,
    /// Downloads reported by npm, set during enrichment
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub npm_downloads: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HitSource {
    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key)?.as_str()
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata_str("name")
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata_str("title")
    }

    pub fn asset_type(&self) -> Option<&str> {
        self.metadata_str("assetType")
    }

    /// True when `totalDownloads` holds an integer
    pub fn has_counter(&self) -> bool {
        self.total_downloads
            .as_ref()
            .is_some_and(|total| total.is_u64() || total.is_i64())
    }
}

/// A single index match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `null` when the query is sorted
    #[serde(
        rename = "_score",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub score: Option<Value>,
    #[serde(rename = "_source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<HitSource>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Hit {
    /// Package name of the plugin, when the hit can be enriched
    pub fn package_name(&self) -> Option<&str> {
        let source = self.source.as_ref()?;
        if !source.has_counter() {
            return None;
        }
        source.name()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

/// Executes structured queries against a document index
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn search(&self, query: &StructuredQuery) -> Result<Vec<Hit>>;
}

/// Elasticsearch `_search` over HTTP
pub struct ElasticsearchClient {
    client: reqwest::Client,
    address: String,
}

impl ElasticsearchClient {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            address: config.host_address.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, index: &str) -> String {
        format!("{}/{}/_search", self.address, index)
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchClient {
    async fn search(&self, query: &StructuredQuery) -> Result<Vec<Hit>> {
        let url = self.search_url(&query.index);
        tracing::debug!("POST {} {}", url, query.to_body());

        let response = self
            .client
            .post(&url)
            .json(&query.to_body())
            .send()
            .await
            .map_err(|e| GatewayError::Index(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Index(format!(
                "{} returned {}: {}",
                url,
                status.as_u16(),
                text
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Index(format!("malformed search response: {}", e)))?;

        Ok(body.hits.hits)
    }
}
