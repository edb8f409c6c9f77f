//! Middleware components for the HTTP layer.

pub mod key_throttle;
pub mod logging;
pub mod metrics;
pub mod security_headers;
pub mod trace_id;

pub use key_throttle::KeyAttemptLimiter;
pub use metrics::{metrics_handler, metrics_middleware};
pub use security_headers::security_headers_middleware;
pub use trace_id::trace_id;
