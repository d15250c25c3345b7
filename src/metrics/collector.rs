//! Metrics collection and registry.

use crate::pipeline::RunSummary;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of run state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Batches processed so far.
    pub batches_processed: u64,
    /// Frames labeled so far.
    pub frames_labeled: u64,
    /// Cells holding a non-zero label.
    pub occupied_cells: usize,
    /// Occupied fraction of the hull field.
    pub coverage_ratio: f64,
    /// Largest label in the hull field.
    pub max_label: f64,
    /// Vertices of the hull mesh.
    pub mesh_vertices: usize,
    /// Faces of the hull mesh.
    pub mesh_faces: usize,
    /// Per-frame meshes written.
    pub animation_meshes: usize,
}

impl MetricsSnapshot {
    /// Creates a snapshot from a finished run.
    pub fn from_summary(summary: &RunSummary) -> Self {
        Self {
            batches_processed: summary.batches as u64,
            frames_labeled: summary.frames_labeled,
            occupied_cells: summary.statistics.occupied_cells,
            coverage_ratio: summary.statistics.coverage,
            max_label: summary.statistics.max_label as f64,
            mesh_vertices: summary.mesh_vertices,
            mesh_faces: summary.mesh_faces,
            animation_meshes: summary.animation_meshes,
        }
    }
}

/// Prometheus metrics registry for hull runs.
pub struct MetricsRegistry {
    registry: Registry,

    // Computation
    batches_processed: IntCounter,
    frames_labeled: IntCounter,

    // Hull
    occupied_cells: IntGauge,
    coverage_ratio: Gauge,
    max_label: Gauge,

    // Meshes
    mesh_vertices: IntGauge,
    mesh_faces: IntGauge,
    animation_meshes: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new registry with all hull metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let batches_processed =
            IntCounter::new("hull_batches_processed_total", "Total number of batches labeled")?;
        let frames_labeled = IntCounter::new(
            "hull_frames_labeled_total",
            "Total number of frames that received a temporal label",
        )?;

        let occupied_cells =
            IntGauge::new("hull_occupied_cells", "Hull cells that moved at least once")?;
        let coverage_ratio =
            Gauge::new("hull_coverage_ratio", "Occupied fraction of the hull field")?;
        let max_label = Gauge::new("hull_max_label", "Most recent frame label in the hull field")?;

        let mesh_vertices = IntGauge::new("hull_mesh_vertices", "Vertices of the hull mesh")?;
        let mesh_faces = IntGauge::new("hull_mesh_faces", "Faces of the hull mesh")?;
        let animation_meshes =
            IntGauge::new("hull_animation_meshes", "Per-frame animation meshes written")?;

        registry.register(Box::new(batches_processed.clone()))?;
        registry.register(Box::new(frames_labeled.clone()))?;
        registry.register(Box::new(occupied_cells.clone()))?;
        registry.register(Box::new(coverage_ratio.clone()))?;
        registry.register(Box::new(max_label.clone()))?;
        registry.register(Box::new(mesh_vertices.clone()))?;
        registry.register(Box::new(mesh_faces.clone()))?;
        registry.register(Box::new(animation_meshes.clone()))?;

        Ok(Self {
            registry,
            batches_processed,
            frames_labeled,
            occupied_cells,
            coverage_ratio,
            max_label,
            mesh_vertices,
            mesh_faces,
            animation_meshes,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward
        let current_batches = self.batches_processed.get();
        if snapshot.batches_processed > current_batches {
            self.batches_processed
                .inc_by(snapshot.batches_processed - current_batches);
        }
        let current_frames = self.frames_labeled.get();
        if snapshot.frames_labeled > current_frames {
            self.frames_labeled.inc_by(snapshot.frames_labeled - current_frames);
        }

        self.occupied_cells.set(snapshot.occupied_cells as i64);
        self.coverage_ratio.set(snapshot.coverage_ratio);
        self.max_label.set(snapshot.max_label);

        self.mesh_vertices.set(snapshot.mesh_vertices as i64);
        self.mesh_faces.set(snapshot.mesh_faces as i64);
        self.animation_meshes.set(snapshot.animation_meshes as i64);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
