//! Temporal labeling and hull accumulation.
//!
//! Each surviving feature voxel is replaced by the 1-based global index of
//! the frame it belongs to, then the batch is flattened by taking the
//! latest label per voxel. The accumulator keeps the per-voxel maximum
//! across batches, so a cell always holds the most recent frame in which
//! it carried a feature.

use super::FeatureError;
use crate::field::{self, Batch, HullField, DISPLAY_MAX, TIME};
use ndarray::{Axis, Zip};

/// Zeroes features below `threshold^2`.
pub fn apply_threshold(features: &mut Batch, threshold: f32) {
    let cutoff = threshold * threshold;
    features.par_mapv_inplace(|v| if v < cutoff { 0.0 } else { v });
}

/// Replaces every non-zero value in frame `i` with `base + i + 1`.
pub fn label_frames(features: &mut Batch, base: u64) {
    for (i, mut frame) in features.axis_iter_mut(Axis(TIME)).enumerate() {
        let label = (base + i as u64 + 1) as f32;
        frame.par_mapv_inplace(|v| if v != 0.0 { label } else { 0.0 });
    }
}

/// Running per-voxel maximum of temporal labels.
#[derive(Debug, Clone)]
pub struct HullAccumulator {
    cells: HullField,
}

impl HullAccumulator {
    /// Creates an all-zero accumulator of shape `(depth, height, width)`.
    pub fn new(shape: (usize, usize, usize)) -> Self {
        Self {
            cells: HullField::zeros(shape),
        }
    }

    /// Wraps previously accumulated labels.
    pub fn from_cells(cells: HullField) -> Self {
        Self { cells }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.cells.dim()
    }

    /// Raw accumulated labels.
    pub fn cells(&self) -> &HullField {
        &self.cells
    }

    /// Flattens a labeled batch over time and merges it in.
    ///
    /// Returns the number of cells labeled by this batch.
    pub fn merge_batch(&mut self, labeled: &Batch) -> Result<usize, FeatureError> {
        let flat = field::max_over_time(labeled.view());
        self.merge(&flat)?;
        Ok(flat.iter().filter(|&&v| v != 0.0).count())
    }

    /// Elementwise maximum with a flattened batch.
    pub fn merge(&mut self, flat: &HullField) -> Result<(), FeatureError> {
        if flat.dim() != self.cells.dim() {
            return Err(FeatureError::ShapeMismatch {
                expected: self.cells.dim(),
                found: flat.dim(),
            });
        }
        Zip::from(&mut self.cells)
            .and(flat)
            .par_for_each(|cell, &v| *cell = cell.max(v));
        Ok(())
    }

    /// Number of cells that ever carried a feature.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|&&v| v != 0.0).count()
    }

    /// Largest label seen so far.
    pub fn max_label(&self) -> f32 {
        self.cells.iter().fold(0.0, |acc, &v| acc.max(v))
    }

    /// Labels mapped onto `[0, 255]`, `label / labeled_frames * 255`.
    pub fn rescaled(&self, labeled_frames: u64) -> HullField {
        let scale = DISPLAY_MAX / labeled_frames.max(1) as f32;
        self.cells.mapv(|v| v * scale)
    }
}
