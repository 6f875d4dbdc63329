//! HTTP middleware components.

pub mod logging;
pub mod metrics;
pub mod route_access;
pub mod security_headers;
pub mod trace_id;

pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use route_access::{bearer_token, route_access, RouteAllowlist, UserAuth};
pub use security_headers::security_headers_middleware;
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
