//! Spatio-temporal hull computation.
//!
//! Each batch is turned into a feature field of squared second-derivative
//! estimates, thresholded, labeled with the global index of the frame each
//! surviving voxel belongs to, and folded into a running per-voxel maximum.
//! The result records, for every cell, the most recent frame in which it
//! moved.

mod accumulator;
mod checkpoint;
mod stencil;

pub use accumulator::{apply_threshold, label_frames, HullAccumulator};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use stencil::{FeatureSet, FeatureTerm, Stencil};

use crate::config::HullConfig;
use crate::field::{Batch, Extents, HullField, TIME};
use ndarray::Axis;
use std::path::PathBuf;

/// Feature computation errors.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("derivative order {order} on axis {axis} needs a kernel larger than {size}")]
    InsufficientKernel { axis: char, order: usize, size: usize },
    #[error("hull shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },
    #[error("batch frames are {found:?}, expected {expected:?}")]
    BatchExtents {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },
    #[error("batch of {frames} frames is shorter than the temporal kernel {kernel}")]
    BatchTooShort { frames: usize, kernel: usize },
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// Outcome of one processed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Zero-based batch index within this run.
    pub index: usize,
    /// Frames that received a label from this batch.
    pub frames_labeled: usize,
    /// Label given to the first of those frames.
    pub first_label: u64,
    /// Cells that carried a feature in this batch.
    pub cells_labeled: usize,
}

/// Streaming hull engine.
pub struct HullCalculator {
    extents: Extents,
    kernel: [usize; 4],
    threshold: f32,
    features: FeatureSet,
    accumulator: HullAccumulator,
    resume_offset: u64,
    frames_labeled: u64,
    expected_labels: u64,
    batches_processed: usize,
    checkpoint_path: PathBuf,
}

impl HullCalculator {
    /// Creates an engine for `config`.
    ///
    /// A non-zero resume offset restores the accumulator from the
    /// checkpoint in the output directory.
    pub fn new(config: &HullConfig) -> Result<Self, FeatureError> {
        let kernel = config.kernel_axes();
        let features = FeatureSet::new(config.mode, kernel, config.extents.is_volumetric())?;
        let shape = config.hull_shape();
        let checkpoint_path = config.checkpoint_path();

        let accumulator = if config.resume_offset == 0 {
            HullAccumulator::new(shape)
        } else {
            let checkpoint = Checkpoint::load(&checkpoint_path)?;
            if checkpoint.cells.dim() != shape {
                return Err(CheckpointError::ShapeMismatch {
                    expected: shape,
                    found: checkpoint.cells.dim(),
                }
                .into());
            }
            if checkpoint.next_offset != config.resume_offset {
                tracing::warn!(
                    stored = checkpoint.next_offset,
                    requested = config.resume_offset,
                    "Resume offset differs from checkpoint"
                );
            }
            tracing::info!(
                path = %checkpoint_path.display(),
                created_at = %checkpoint.created_at,
                "Resuming from checkpoint"
            );
            HullAccumulator::from_cells(checkpoint.cells)
        };

        tracing::debug!(
            mode = ?config.mode,
            terms = features.terms().len(),
            ?kernel,
            ?shape,
            "Hull calculator ready"
        );

        Ok(Self {
            extents: config.extents,
            kernel,
            threshold: config.threshold,
            features,
            accumulator,
            resume_offset: config.resume_offset,
            frames_labeled: 0,
            expected_labels: config.resume_offset + config.labeled_frames(),
            batches_processed: 0,
            checkpoint_path,
        })
    }

    /// Labels one batch and folds it into the accumulator.
    pub fn process_batch(&mut self, batch: &Batch) -> Result<BatchReport, FeatureError> {
        let (frames, d, h, w) = batch.dim();
        if (d, h, w) != self.extents.shape() {
            return Err(FeatureError::BatchExtents {
                expected: self.extents.shape(),
                found: (d, h, w),
            });
        }
        if frames < self.kernel[TIME] {
            return Err(FeatureError::BatchTooShort {
                frames,
                kernel: self.kernel[TIME],
            });
        }

        let base = self.resume_offset + self.frames_labeled;
        let mut features = self.features.evaluate(batch.view());
        apply_threshold(&mut features, self.threshold);
        label_frames(&mut features, base);
        let cells_labeled = self.accumulator.merge_batch(&features)?;

        let labeled = features.len_of(Axis(TIME));
        self.frames_labeled += labeled as u64;
        let report = BatchReport {
            index: self.batches_processed,
            frames_labeled: labeled,
            first_label: base + 1,
            cells_labeled,
        };
        self.batches_processed += 1;

        tracing::debug!(
            batch = report.index,
            frames = labeled,
            first_label = report.first_label,
            cells = cells_labeled,
            "Batch labeled"
        );
        Ok(report)
    }

    /// Persists the accumulator and returns hulls rescaled to `[0, 255]`.
    pub fn hulls(&self) -> Result<HullField, FeatureError> {
        Checkpoint::new(self.accumulator.cells().clone(), self.next_offset()).save(&self.checkpoint_path)?;
        Ok(self.accumulator.rescaled(self.expected_labels))
    }

    pub fn accumulator(&self) -> &HullAccumulator {
        &self.accumulator
    }

    /// Frames labeled by this run so far.
    pub fn frames_labeled(&self) -> u64 {
        self.frames_labeled
    }

    pub fn batches_processed(&self) -> usize {
        self.batches_processed
    }

    /// Resume offset for a run continuing after this one.
    pub fn next_offset(&self) -> u64 {
        self.resume_offset + self.frames_labeled
    }

    /// Denominator used when rescaling labels.
    pub fn expected_labels(&self) -> u64 {
        self.expected_labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DimensionFile, FeatureMode, RunOptions};
    use crate::frames::{BatchReader, MemoryFrameStore};

    const DURATION: usize = 5;

    fn config(dir: &std::path::Path, batches: usize, resume_offset: u64) -> HullConfig {
        let dims = DimensionFile {
            extents: Extents::new(5, 5, 5),
            frames: (0..DURATION).map(|i| PathBuf::from(format!("{}.raw", i))).collect(),
        };
        let options = RunOptions {
            batches,
            threshold: 20.0,
            mode: FeatureMode::Diagonal,
            resume_offset,
            output_dir: dir.to_path_buf(),
            ..Default::default()
        };
        HullConfig::new(dims, options).unwrap()
    }

    /// One bright voxel walking the main diagonal, one step per frame.
    fn diagonal_store() -> MemoryFrameStore {
        MemoryFrameStore::from_fn(Extents::new(5, 5, 5), DURATION, |t, z, y, x| {
            if t == z && z == y && y == x {
                255
            } else {
                0
            }
        })
    }

    fn run(config: &HullConfig) -> HullCalculator {
        let mut calculator = HullCalculator::new(config).unwrap();
        let mut reader = BatchReader::new(diagonal_store(), 3, config.batches).unwrap();
        for _ in 0..config.batches {
            calculator.process_batch(&reader.next_batch().unwrap()).unwrap();
        }
        calculator
    }

    #[test]
    fn test_diagonal_trail_labels_recency() {
        let dir = tempfile::tempdir().unwrap();
        let calculator = run(&config(dir.path(), 1, 0));
        let cells = calculator.accumulator().cells();

        assert_eq!(cells.dim(), (3, 3, 3));
        assert_eq!(cells[[0, 0, 0]], 1.0);
        assert_eq!(cells[[1, 1, 1]], 2.0);
        assert_eq!(cells[[2, 2, 2]], 3.0);
        assert_eq!(calculator.accumulator().occupied(), 3);

        let hulls = calculator.hulls().unwrap();
        assert!((hulls[[0, 0, 0]] - 85.0).abs() < 1e-3);
        assert!((hulls[[1, 1, 1]] - 170.0).abs() < 1e-3);
        assert!((hulls[[2, 2, 2]] - 255.0).abs() < 1e-3);
        assert!(dir.path().join("hulls.ckpt").exists());
    }

    #[test]
    fn test_unit_threshold_keeps_last_qualifying_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), 1, 0);
        config.threshold = 1.0;
        let calculator = run(&config);
        let cells = calculator.accumulator().cells();

        // every window sees the moving voxel; only three cells miss the last one
        let second_last = [[1, 1, 2], [1, 2, 1], [2, 1, 1]];
        for ((z, y, x), &label) in cells.indexed_iter() {
            let expected = if second_last.contains(&[z, y, x]) { 2.0 } else { 3.0 };
            assert_eq!(label, expected, "cell ({}, {}, {})", z, y, x);
        }
        assert_eq!(calculator.accumulator().occupied(), 27);
    }

    #[test]
    fn test_batching_does_not_change_result() {
        let dir = tempfile::tempdir().unwrap();
        let single = run(&config(dir.path(), 1, 0));
        let split = run(&config(dir.path(), 3, 0));

        assert_eq!(split.batches_processed(), 3);
        assert_eq!(split.frames_labeled(), 3);
        assert_eq!(single.accumulator().cells(), split.accumulator().cells());
    }

    #[test]
    fn test_resume_continues_labels() {
        let dir = tempfile::tempdir().unwrap();
        let first = run(&config(dir.path(), 1, 0));
        first.hulls().unwrap();
        assert_eq!(first.next_offset(), 3);

        let second = run(&config(dir.path(), 1, 3));
        let cells = second.accumulator().cells();
        assert_eq!(cells[[0, 0, 0]], 4.0);
        assert_eq!(cells[[2, 2, 2]], 6.0);
        assert_eq!(second.expected_labels(), 6);
    }

    #[test]
    fn test_resume_without_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            HullCalculator::new(&config(dir.path(), 1, 3)),
            Err(FeatureError::Checkpoint(CheckpointError::Io(_)))
        ));
    }

    #[test]
    fn test_resume_rejects_other_shape() {
        let dir = tempfile::tempdir().unwrap();
        Checkpoint::new(HullField::zeros((2, 2, 2)), 3)
            .save(dir.path().join("hulls.ckpt"))
            .unwrap();
        assert!(matches!(
            HullCalculator::new(&config(dir.path(), 1, 3)),
            Err(FeatureError::Checkpoint(CheckpointError::ShapeMismatch { .. }))
        ));
    }

    #[test]
    fn test_rejects_foreign_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut calculator = HullCalculator::new(&config(dir.path(), 1, 0)).unwrap();

        assert!(matches!(
            calculator.process_batch(&Batch::zeros((5, 4, 5, 5))),
            Err(FeatureError::BatchExtents { .. })
        ));
        assert!(matches!(
            calculator.process_batch(&Batch::zeros((2, 5, 5, 5))),
            Err(FeatureError::BatchTooShort { frames: 2, kernel: 3 })
        ));
    }

    #[test]
    fn test_static_scene_has_empty_hull() {
        let dir = tempfile::tempdir().unwrap();
        let mut calculator = HullCalculator::new(&config(dir.path(), 1, 0)).unwrap();
        let report = calculator.process_batch(&Batch::from_elem((5, 5, 5, 5), 1.0)).unwrap();

        assert_eq!(report.frames_labeled, 3);
        assert_eq!(report.cells_labeled, 0);
        assert_eq!(calculator.accumulator().occupied(), 0);
    }
}
