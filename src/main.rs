//! Spatio-Temporal Hull CLI
//!
//! Computes the hulls of a frame sequence described by a dimension file and
//! writes the hull mesh (and optionally one mesh per frame) as OBJ.

use clap::Parser;
use spatio_temporal_hulls::{
    config::{DimensionFile, FeatureMode, HullConfig, RunOptions},
    metrics::MetricsRegistry,
    pipeline,
};
use std::path::PathBuf;
use tracing::{error, info};

/// Compute spatio-temporal hulls and extract them as meshes.
#[derive(Debug, Parser)]
#[command(name = "hull-compute", version, about)]
struct Cli {
    /// Dimension file: extents, frame count, then one frame path per line.
    dimensions: PathBuf,

    /// TOML file with run options; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of overlapping batches to stream the frames in.
    #[arg(short, long)]
    batches: Option<usize>,

    /// Feature threshold; squared features below threshold^2 are dropped.
    #[arg(long)]
    threshold: Option<f32>,

    /// Kernel size along x.
    #[arg(long = "kernel-x-size")]
    kernel_x: Option<usize>,

    /// Kernel size along y.
    #[arg(long = "kernel-y-size")]
    kernel_y: Option<usize>,

    /// Kernel size along z (ignored for planar data).
    #[arg(long = "kernel-z-size")]
    kernel_z: Option<usize>,

    /// Kernel size along time.
    #[arg(long = "kernel-t-size")]
    kernel_t: Option<usize>,

    /// Feature mode: 0 = full, 1 = diagonal, 2 = motion.
    #[arg(short, long, alias = "special")]
    mode: Option<u8>,

    /// Also write one uncolored mesh per raw frame.
    #[arg(long)]
    export_animation: bool,

    /// Frames labeled by previous runs; resumes from the checkpoint.
    #[arg(long)]
    resume_offset: Option<u64>,

    /// Directory for meshes and the checkpoint.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Write Prometheus metrics of the run to this file.
    #[arg(long)]
    metrics_out: Option<PathBuf>,
}

impl Cli {
    fn options(&self) -> Result<RunOptions, Box<dyn std::error::Error>> {
        let mut options = match &self.config {
            Some(path) => RunOptions::from_file(path)?,
            None => RunOptions::default(),
        };

        if let Some(batches) = self.batches {
            options.batches = batches;
        }
        if let Some(threshold) = self.threshold {
            options.threshold = threshold;
        }
        if let Some(x) = self.kernel_x {
            options.kernel.x = x;
        }
        if let Some(y) = self.kernel_y {
            options.kernel.y = y;
        }
        if let Some(z) = self.kernel_z {
            options.kernel.z = z;
        }
        if let Some(t) = self.kernel_t {
            options.kernel.t = t;
        }
        if let Some(mode) = self.mode {
            options.mode = FeatureMode::try_from(mode)?;
        }
        if self.export_animation {
            options.export_animation = true;
        }
        if let Some(offset) = self.resume_offset {
            options.resume_offset = offset;
        }
        if let Some(dir) = &self.output_dir {
            options.output_dir = dir.clone();
        }
        Ok(options)
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let dimensions = DimensionFile::from_file(&cli.dimensions)?;
    let config = HullConfig::new(dimensions, cli.options()?)?;

    let registry = match cli.metrics_out {
        Some(_) => Some(MetricsRegistry::new()?),
        None => None,
    };

    let summary = pipeline::run(&config, registry.as_ref())?;

    info!(
        batches = summary.batches,
        frames_labeled = summary.frames_labeled,
        next_offset = summary.next_offset,
        occupied = summary.statistics.occupied_cells,
        faces = summary.mesh_faces,
        "Done"
    );

    if let (Some(path), Some(registry)) = (&cli.metrics_out, &registry) {
        std::fs::write(path, registry.encode()?)?;
        info!(path = %path.display(), "Metrics written");
    }
    Ok(())
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    info!("Spatio-temporal hulls v{}", spatio_temporal_hulls::VERSION);

    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}
