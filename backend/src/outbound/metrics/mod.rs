//! Outbound adapters for metrics exporting.
//!
//! Prometheus-backed implementations of the domain metrics port, compiled only
//! with the `metrics` feature.

mod prometheus_generation;

pub use prometheus_generation::PrometheusGenerationMetrics;
