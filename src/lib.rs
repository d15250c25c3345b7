//! Spatio-Temporal Hulls Library
//!
//! Computes, for a time series of 2D images or 3D volumes, a single field
//! recording where and how recently motion happened, and extracts its
//! boundary as a colored triangle mesh.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! config → frames → hull → mesh
//!             ↓       ↓      ↓
//!          analysis / metrics (run summary)
//! ```
//!
//! # Design Principles
//!
//! - **Bounded memory**: frames stream in a fixed number of overlapping
//!   batches; only one batch and the accumulator are resident
//! - **Batching is invisible**: shared border frames make the result
//!   identical for any valid batch count
//! - **Validate first**: every parameter is checked before the first frame
//!   is read
//! - **Resumable**: the accumulator is checkpointed so later runs can
//!   continue labeling
//!
//! # Example
//!
//! ```no_run
//! use spatio_temporal_hulls::{
//!     config::{DimensionFile, HullConfig, RunOptions},
//!     pipeline,
//! };
//!
//! let dims = DimensionFile::from_file("data/dims.txt").unwrap();
//! let config = HullConfig::new(dims, RunOptions::default()).unwrap();
//!
//! let summary = pipeline::run(&config, None).unwrap();
//! println!(
//!     "{} cells moved, mesh has {} faces",
//!     summary.statistics.occupied_cells, summary.mesh_faces
//! );
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod config;
pub mod field;
pub mod frames;
pub mod hull;
pub mod mesh;
pub mod metrics;
pub mod pipeline;

// Re-export commonly used types at crate root
pub use analysis::HullStatistics;
pub use config::{ConfigError, DimensionFile, FeatureMode, HullConfig, KernelSize, RunOptions};
pub use field::{Batch, Extents, HullField};
pub use frames::{BatchReader, DiskFrameStore, Frame, FrameError, FrameStore, MemoryFrameStore};
pub use hull::{Checkpoint, CheckpointError, FeatureError, HullCalculator};
pub use mesh::{Coloring, IsosurfaceExtractor, Marching, Mesh, MeshError};
pub use pipeline::{PipelineError, RunSummary};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
