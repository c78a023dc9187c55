// Observability for the gateway HTTP server
// Provides counters and request correlation

pub mod metrics;
pub mod tracing_mod;

pub use metrics::Metrics;
pub use tracing_mod::{generate_request_id, RequestId};
