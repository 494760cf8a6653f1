//! Observability for the authorization layer.
//!
//! The library only emits through the `metrics` facade; installing an
//! exporter is the embedding service's job.

pub mod metrics;
