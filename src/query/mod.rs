//! Structured query construction
//!
//! Maps a primary term plus optional filters onto the nested boolean
//! query sent to the index. Everything here is a pure function of its
//! arguments: filters and pagination are request-scoped values.

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Path of the nested object every clause is scoped to
pub const NESTED_PATH: &str = "metadata";

/// Fields a text search always matches against
pub const DEFAULT_SEARCH_FIELDS: [&str; 4] = [
    "metadata.title",
    "metadata.name",
    "metadata.keywords",
    "metadata.author.name",
];

pub const ASSET_TYPE_FIELD: &str = "metadata.assetType";
pub const KEYWORDS_FIELD: &str = "metadata.keywords";
pub const SORT_FIELD: &str = "totalDownloads";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Optional refinements carried by a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    /// Extra fields to match the search term against (search only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    /// Phrases every plugin must carry (plugins only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Asset type to match (search only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub size: usize,
    pub from: usize,
}

impl Pagination {
    pub fn new(size: usize, from: usize) -> Self {
        Self { size, from }
    }
}

/// Query ready to be executed against a named index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredQuery {
    #[serde(skip)]
    pub index: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<usize>,
    pub size: usize,
    pub query: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Value>,
}

impl StructuredQuery {
    /// Boolean clauses under the nested query, for the given occurrence
    /// (`should` or `must`).
    pub fn clauses(&self, occur: &str) -> Option<&Vec<Value>> {
        self.query
            .pointer(&format!("/nested/query/bool/{}", occur))
            .and_then(Value::as_array)
    }

    /// Request body for the index `_search` endpoint
    pub fn to_body(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Build a free-text search across metadata fields.
///
/// When a sort is requested the `from` offset is not sent, so sorted
/// searches always start at the first result.
pub fn build_search_query(
    index: &str,
    term: &str,
    filters: &FilterSpec,
    page: Pagination,
) -> Result<StructuredQuery> {
    if term.trim().is_empty() {
        return Err(GatewayError::InvalidInput(
            "text query is a required parameter.".to_string(),
        ));
    }

    let mut should: Vec<Value> = DEFAULT_SEARCH_FIELDS
        .iter()
        .map(|field| match_clause(field, term))
        .collect();

    if let Some(fields) = &filters.fields {
        should.extend(fields.iter().map(|field| match_clause(field, term)));
    }

    if let Some(asset_type) = &filters.asset_type {
        should.push(match_clause(ASSET_TYPE_FIELD, asset_type));
    }

    let sort = filters.sort_by.map(sort_clause);
    if sort.is_some() && page.from > 0 {
        tracing::warn!(
            "skipIndex {} dropped: sorted searches always start at the first result",
            page.from
        );
    }

    Ok(StructuredQuery {
        index: index.to_string(),
        from: if sort.is_some() { None } else { Some(page.from) },
        size: page.size,
        query: nested_bool("should", should),
        sort,
    })
}

/// Build a listing of plugins of one asset type, narrowed by keywords.
pub fn build_plugins_query(
    index: &str,
    asset_type: &str,
    filters: &FilterSpec,
    page: Pagination,
) -> Result<StructuredQuery> {
    if asset_type.trim().is_empty() {
        return Err(GatewayError::InvalidInput(
            "assetType is a required parameter.".to_string(),
        ));
    }

    let mut must = vec![match_clause(ASSET_TYPE_FIELD, asset_type)];
    if let Some(keywords) = &filters.keywords {
        must.extend(keywords.iter().map(|kw| {
            json!({ "match_phrase": { KEYWORDS_FIELD: kw } })
        }));
    }

    Ok(StructuredQuery {
        index: index.to_string(),
        from: Some(page.from),
        size: page.size,
        query: nested_bool("must", must),
        sort: filters.sort_by.map(sort_clause),
    })
}

fn match_clause(field: &str, value: &str) -> Value {
    let mut inner = serde_json::Map::new();
    inner.insert(field.to_string(), Value::String(value.to_string()));
    json!({ "match": inner })
}

fn nested_bool(occur: &str, clauses: Vec<Value>) -> Value {
    let mut boolean = serde_json::Map::new();
    boolean.insert(occur.to_string(), Value::Array(clauses));
    json!({
        "nested": {
            "path": NESTED_PATH,
            "query": { "bool": boolean }
        }
    })
}

fn sort_clause(order: SortOrder) -> Value {
    json!([{ SORT_FIELD: { "order": order } }])
}
