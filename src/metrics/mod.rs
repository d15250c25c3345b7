//! Prometheus metrics for hull runs.
//!
//! A run fills a [`MetricsSnapshot`] from its [`RunSummary`] and pushes it
//! into the registry, which renders the Prometheus text format. The CLI
//! writes that text to `--metrics-out` when asked.
//!
//! # Metrics Exposed
//!
//! ## Computation
//! - `hull_batches_processed_total` - Batches labeled
//! - `hull_frames_labeled_total` - Frames that received a temporal label
//!
//! ## Hull
//! - `hull_occupied_cells` - Cells that moved at least once
//! - `hull_coverage_ratio` - Occupied fraction of the hull field
//! - `hull_max_label` - Most recent frame label present
//!
//! ## Meshes
//! - `hull_mesh_vertices` - Vertices of the hull mesh
//! - `hull_mesh_faces` - Faces of the hull mesh
//! - `hull_animation_meshes` - Per-frame meshes written
//!
//! [`RunSummary`]: crate::pipeline::RunSummary

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
