//! API middleware components

pub mod context;
pub mod logging;
pub mod metrics;
pub mod security;

pub use context::{extract_bearer_token, request_context_middleware, Context};
pub use logging::logging_middleware;
pub use metrics::metrics_middleware;
pub use security::security_headers_middleware;
