//! Rendering of metric snapshots for the serving layer
//!
//! Both renderers work on a [`MetricsSnapshot`](crate::models::MetricsSnapshot)
//! copy and never touch the store lock.

mod prometheus;
mod status;

pub use prometheus::{render_metrics, PROMETHEUS_CONTENT_TYPE};
pub use status::{StatusTemplate, HTML_CONTENT_TYPE};
