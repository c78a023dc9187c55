// Client allow-list validation

use crate::error::GatewayError;
use axum::http::HeaderMap;
use serde_json::Value;
use std::collections::HashSet;
use std::net::SocketAddr;

pub const CLIENT_ID_FIELD: &str = "clientID";

/// Mandatory fields and naming for one endpoint
#[derive(Debug, Clone, Copy)]
pub struct ValidationRule {
    /// Name used in messages, e.g. "search"
    pub api: &'static str,
    /// Field required next to `clientID`
    pub primary_field: &'static str,
    /// Log the full request body along with the client IP
    pub log_body: bool,
}

pub const SEARCH_RULE: ValidationRule = ValidationRule {
    api: "search",
    primary_field: "query",
    log_body: true,
};

pub const PLUGINS_RULE: ValidationRule = ValidationRule {
    api: "getPlugins",
    primary_field: "assetType",
    log_body: false,
};

impl ValidationRule {
    pub fn required_fields(&self) -> [&'static str; 2] {
        [CLIENT_ID_FIELD, self.primary_field]
    }

    pub fn missing_fields_message(&self) -> String {
        format!(
            "Invalid Argument: {} & {} are mandatory parameters.",
            CLIENT_ID_FIELD, self.primary_field
        )
    }

    pub fn unauthorised_message(&self) -> String {
        format!("AuthenticationError: Not Authorised to access {} API.", self.api)
    }
}

/// Outcome of validating one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResponse {
    pub is_valid: bool,
    pub status_code: u16,
    pub error_message: String,
}

impl ValidationResponse {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            status_code: 200,
            error_message: String::new(),
        }
    }

    fn reject(status_code: u16, error_message: String) -> Self {
        Self {
            is_valid: false,
            status_code,
            error_message,
        }
    }

    /// Convert a rejection into an error, passing accepted requests through
    pub fn into_result(self) -> Result<(), GatewayError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(GatewayError::Validation {
                status: self.status_code,
                message: self.error_message,
            })
        }
    }
}

/// Registered client identifiers, fixed at startup
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    ids: HashSet<String>,
}

impl ClientRegistry {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, client_id: &str) -> bool {
        self.ids.contains(client_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Check the request body against `rule`.
    ///
    /// `body` is `None` when the request carried no parseable JSON.
    pub fn validate(
        &self,
        body: Option<&Value>,
        rule: &ValidationRule,
        client_ip: &str,
    ) -> ValidationResponse {
        match (rule.log_body, body) {
            (true, Some(body)) => tracing::info!(
                "Received {} request from clientIP: {} Request: {}",
                rule.api,
                client_ip,
                body
            ),
            _ => tracing::info!("Received {} request from clientIP: {}", rule.api, client_ip),
        }

        let Some(fields) = body.and_then(Value::as_object) else {
            return ValidationResponse::reject(400, rule.missing_fields_message());
        };

        if rule
            .required_fields()
            .iter()
            .any(|field| !fields.contains_key(*field))
        {
            return ValidationResponse::reject(400, rule.missing_fields_message());
        }

        let client_id = fields.get(CLIENT_ID_FIELD).and_then(Value::as_str);
        if !client_id.is_some_and(|id| self.contains(id)) {
            return ValidationResponse::reject(403, rule.unauthorised_message());
        }

        ValidationResponse::ok()
    }
}

/// Originating client address: `X-Real-IP`, then `X-Forwarded-For`, then the socket peer
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return first.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
