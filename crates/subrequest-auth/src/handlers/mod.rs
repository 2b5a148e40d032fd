//! HTTP request handlers.

pub mod health;
pub mod metrics;
pub mod validate;

pub use health::healthz;
pub use metrics::metrics_handler;
pub use validate::validate;
