//! End-to-end hull run.
//!
//! ```text
//! frames → BatchReader → HullCalculator → hulls.ckpt
//!                              ↓
//!                     IsosurfaceExtractor → hulls.obj
//!
//! frames → export_animation → animation_<i>.obj   (optional)
//! ```
//!
//! Batches are processed strictly in order; parallelism lives inside the
//! array kernels and the per-frame animation export.

use crate::analysis::HullStatistics;
use crate::config::{ConfigError, HullConfig};
use crate::frames::{BatchReader, DiskFrameStore, FrameError, FrameStore};
use crate::hull::{CheckpointError, FeatureError, HullCalculator};
use crate::mesh::{self, Coloring, IsosurfaceExtractor, Marching, MeshError};
use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Any failure of a hull run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    #[error("feature error: {0}")]
    Feature(#[from] FeatureError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("mesh error: {0}")]
    Mesh(#[from] MeshError),
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub batches: usize,
    pub frames_read: usize,
    pub frames_labeled: u64,
    /// Resume offset for a run continuing after this one.
    pub next_offset: u64,
    pub statistics: HullStatistics,
    pub mesh_vertices: usize,
    pub mesh_faces: usize,
    pub animation_meshes: usize,
    pub hull_mesh: PathBuf,
    pub checkpoint: PathBuf,
    /// Time spent reading and labeling batches.
    pub compute_time: Duration,
    /// Time spent extracting and writing meshes.
    pub extract_time: Duration,
}

/// Runs the pipeline over the frame files named by `config`.
pub fn run(config: &HullConfig, metrics: Option<&MetricsRegistry>) -> Result<RunSummary, PipelineError> {
    let store = DiskFrameStore::new(config.frames.clone(), config.extents);
    store.check_present()?;
    run_with_store(config, store, metrics)
}

/// Runs the pipeline over any frame store.
pub fn run_with_store<S: FrameStore>(
    config: &HullConfig,
    store: S,
    metrics: Option<&MetricsRegistry>,
) -> Result<RunSummary, PipelineError> {
    config.validate()?;
    std::fs::create_dir_all(&config.output_dir).map_err(|source| PipelineError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    info!(
        width = config.extents.width,
        height = config.extents.height,
        depth = config.extents.depth,
        frames = config.duration(),
        batches = config.batches,
        mode = ?config.mode,
        "Computing hulls"
    );

    let started = Instant::now();
    let mut calculator = HullCalculator::new(config)?;
    let mut reader = BatchReader::new(store, config.kernel.t, config.batches)?;
    for _ in 0..config.batches {
        let batch = reader.next_batch()?;
        calculator.process_batch(&batch)?;
    }
    let hulls = calculator.hulls()?;
    let statistics = HullStatistics::analyze(calculator.accumulator().cells());
    let compute_time = started.elapsed();

    info!(
        occupied = statistics.occupied_cells,
        coverage = statistics.coverage,
        max_label = statistics.max_label,
        elapsed_ms = compute_time.as_millis() as u64,
        "Hulls computed"
    );

    let started = Instant::now();
    let mut extractor = IsosurfaceExtractor::new(Marching::for_extents(config.extents));
    let hull_mesh = config.hull_mesh_path();
    let surface = extractor.extract(hulls.view(), Coloring::ByValue);
    mesh::save_obj(surface, &hull_mesh)?;
    let (mesh_vertices, mesh_faces) = (surface.vertex_count(), surface.face_count());

    let animation_meshes = if config.export_animation {
        mesh::export_animation(reader.store(), |i| config.animation_mesh_path(i))?
    } else {
        0
    };
    let extract_time = started.elapsed();

    info!(
        path = %hull_mesh.display(),
        vertices = mesh_vertices,
        faces = mesh_faces,
        animation_meshes,
        elapsed_ms = extract_time.as_millis() as u64,
        "Meshes written"
    );

    let summary = RunSummary {
        batches: calculator.batches_processed(),
        frames_read: reader.frames_read(),
        frames_labeled: calculator.frames_labeled(),
        next_offset: calculator.next_offset(),
        statistics,
        mesh_vertices,
        mesh_faces,
        animation_meshes,
        hull_mesh,
        checkpoint: config.checkpoint_path(),
        compute_time,
        extract_time,
    };

    if let Some(registry) = metrics {
        registry.update(&MetricsSnapshot::from_summary(&summary));
    }
    Ok(summary)
}
