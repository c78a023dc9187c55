// HTTP middleware

use crate::server::observability::{generate_request_id, RequestId};
use crate::server::ServerState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request tracing and accounting middleware
pub async fn track_request_mw(
    State(state): State<ServerState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = generate_request_id();
    let start = Instant::now();

    request.extensions_mut().insert(RequestId(request_id.clone()));
    state.metrics.inc_requests_total();
    state.metrics.inc_requests_in_flight();

    let span = tracing::info_span!("request", id = %request_id);
    let mut response = async {
        tracing::debug!("→ {} {}", method, uri);
        next.run(request).await
    }
    .instrument(span.clone())
    .await;

    let duration = start.elapsed();
    let status = response.status();
    state.metrics.dec_requests_in_flight();
    state.metrics.record_request_duration(duration.as_millis() as u64);
    state.metrics.record_status(status.as_u16());

    span.in_scope(|| {
        tracing::debug!(
            "← {} {} {} ({:?})",
            method,
            uri,
            status.as_u16(),
            duration
        );
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
