#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use registry_gateway::config::{Config, IndexConfig, StatsConfig};
use registry_gateway::error::{GatewayError, Result};
use registry_gateway::index::{Hit, SearchIndex};
use registry_gateway::query::StructuredQuery;
use registry_gateway::server::{build_router, ServerState};
use registry_gateway::service::RegistryService;
use registry_gateway::stats::{DownloadCount, DownloadStats};
use registry_gateway::validator::ClientRegistry;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const PREFIX: &str = "@phoenix-plugin-registry/";

/// Config pointing at fake upstreams, with `okid` registered.
pub fn test_config() -> Config {
    Config {
        index: IndexConfig {
            host_address: "http://index.test".to_string(),
            index_name: "plugins".to_string(),
            page_size: 10,
            timeout_secs: 5,
        },
        stats: StatsConfig {
            start_date: NaiveDate::from_ymd_opt(2022, 1, 1),
            ..StatsConfig::default()
        },
        registered_clients: vec!["okid".to_string()],
        ..Config::default()
    }
}

/// Index that records every query and answers with canned hits
#[derive(Default)]
pub struct FakeIndex {
    pub hits: Vec<Hit>,
    pub fail: bool,
    pub queries: Mutex<Vec<StructuredQuery>>,
}

impl FakeIndex {
    pub fn with_hits(hits: Vec<Hit>) -> Self {
        Self {
            hits,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn last_query(&self) -> StructuredQuery {
        self.queries
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("index was never queried")
    }
}

#[async_trait]
impl SearchIndex for FakeIndex {
    async fn search(&self, query: &StructuredQuery) -> Result<Vec<Hit>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(GatewayError::Index("connection refused".to_string()));
        }
        Ok(self.hits.clone())
    }
}

/// Stats source keyed by plain plugin name; unknown names fail
#[derive(Default)]
pub struct FakeStats {
    pub counts: HashMap<String, u64>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeStats {
    pub fn with(counts: &[(&str, u64)]) -> Self {
        Self {
            counts: counts
                .iter()
                .map(|(name, n)| (format!("{}{}", PREFIX, name), *n))
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl DownloadStats for FakeStats {
    async fn download_count(
        &self,
        package: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<DownloadCount> {
        self.calls.lock().unwrap().push(package.to_string());
        self.counts
            .get(package)
            .map(|n| DownloadCount {
                status_code: 200,
                downloads: *n,
            })
            .ok_or_else(|| GatewayError::Stats(format!("{} returned 404", package)))
    }
}

/// Hit for a named plugin with an index-owned counter
pub fn plugin_hit(name: &str, total: u64) -> Hit {
    serde_json::from_value(json!({
        "_index": "plugins",
        "_id": name,
        "_source": {
            "metadata": { "name": name, "title": format!("{} title", name), "assetType": "EXTENSION" },
            "totalDownloads": total
        }
    }))
    .unwrap()
}

pub fn test_state(index: Arc<FakeIndex>, stats: Arc<FakeStats>) -> ServerState {
    let config = test_config();
    let service = RegistryService::with_clients(&config, index, stats).unwrap();
    ServerState::new(service, ClientRegistry::new(config.registered_clients))
}

pub fn test_app(index: Arc<FakeIndex>, stats: Arc<FakeStats>) -> Router {
    build_router(test_state(index, stats))
}

/// Send one request through the router and decode the JSON body (Null when empty).
pub async fn send(
    app: Router,
    method: &str,
    path: &str,
    body: Option<&str>,
    headers: &[(&str, &str)],
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, value)
}

pub async fn post_json(app: Router, path: &str, body: Value) -> (StatusCode, HeaderMap, Value) {
    send(app, "POST", path, Some(&body.to_string()), &[]).await
}

/// Serve `router` on an ephemeral local port
pub async fn spawn_upstream(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}
