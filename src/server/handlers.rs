// HTTP request handlers

use crate::error::GatewayError;
use crate::index::Hit;
use crate::query::FilterSpec;
use crate::server::observability::RequestId;
use crate::server::ServerState;
use crate::service::PageRequest;
use crate::validator::{client_ip, ValidationRule, PLUGINS_RULE, SEARCH_RULE};
use axum::{
    extract::{ConnectInfo, State},
    http::{header::HeaderMap, Extensions, StatusCode},
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;

// ── Request/Response types ───────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub query: String,
    #[serde(default)]
    pub filters: Option<FilterSpec>,
    #[serde(default)]
    pub result_size: Option<usize>,
    #[serde(default)]
    pub skip_index: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginsRequest {
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub asset_type: String,
    #[serde(default)]
    pub filters: Option<FilterSpec>,
    #[serde(default)]
    pub result_size: Option<usize>,
    #[serde(default)]
    pub skip_index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Validate the raw body against `rule`, then decode it.
fn accept<T: DeserializeOwned>(
    state: &ServerState,
    rule: &ValidationRule,
    headers: &HeaderMap,
    extensions: &Extensions,
    body: &Bytes,
) -> Result<T, GatewayError> {
    let peer = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(headers, peer);

    let body: Option<Value> = serde_json::from_slice(body).ok();
    state
        .clients
        .validate(body.as_ref(), rule, &ip)
        .into_result()?;

    serde_json::from_value(body.unwrap_or(Value::Null)).map_err(|e| GatewayError::Validation {
        status: 400,
        message: format!("Invalid Argument: {}", e),
    })
}

// ── Handlers ────────────────────────────────────────────────────────

/// Text search over plugin metadata
pub async fn search(
    State(state): State<ServerState>,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
) -> Result<Json<Vec<Hit>>, GatewayError> {
    state.metrics.inc_search();
    let req: SearchRequest = accept(&state, &SEARCH_RULE, &headers, &extensions, &body)?;

    let filters = req.filters.unwrap_or_default();
    let page = PageRequest {
        result_size: req.result_size,
        skip_index: req.skip_index,
    };

    let outcome = state.service.search(&req.query, &filters, page).await?;
    state.metrics.record_enrichment(&outcome.summary);
    tracing::info!(
        "[{}] Search API request from {} succeeded with {} hits",
        RequestId::of(&extensions),
        req.client_id,
        outcome.hits.len()
    );

    Ok(Json(outcome.hits))
}

/// Plugins of one asset type
pub async fn get_plugins(
    State(state): State<ServerState>,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
) -> Result<Json<Vec<Hit>>, GatewayError> {
    state.metrics.inc_plugins();
    let req: PluginsRequest = accept(&state, &PLUGINS_RULE, &headers, &extensions, &body)?;

    let filters = req.filters.unwrap_or_default();
    let page = PageRequest {
        result_size: req.result_size,
        skip_index: req.skip_index,
    };

    let outcome = state.service.plugins(&req.asset_type, &filters, page).await?;
    state.metrics.record_enrichment(&outcome.summary);
    tracing::info!(
        "[{}] GetPlugins API request from {} succeeded with {} hits",
        RequestId::of(&extensions),
        req.client_id,
        outcome.hits.len()
    );

    Ok(Json(outcome.hits))
}

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<ServerState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
