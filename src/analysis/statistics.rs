//! Occupancy statistics over accumulated labels.

use crate::field::HullField;

/// Summary of a hull field of raw frame labels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HullStatistics {
    /// Cells that carried a feature in at least one frame.
    pub occupied_cells: usize,
    /// Total number of cells in the field.
    pub total_cells: usize,
    /// `occupied_cells / total_cells`.
    pub coverage: f64,
    /// Earliest most-recent label among occupied cells.
    pub min_label: Option<f32>,
    /// Latest label in the field (0 when empty).
    pub max_label: f32,
    /// Mean label over occupied cells.
    pub mean_label: f64,
}

impl HullStatistics {
    /// Computes statistics over raw (unscaled) labels.
    pub fn analyze(cells: &HullField) -> Self {
        let total_cells = cells.len();
        let (occupied_cells, sum, min, max) = cells
            .iter()
            .filter(|&&v| v != 0.0)
            .fold((0usize, 0.0f64, f32::INFINITY, 0.0f32), |(n, sum, min, max), &v| {
                (n + 1, sum + v as f64, min.min(v), max.max(v))
            });

        Self {
            occupied_cells,
            total_cells,
            coverage: Self::ratio(occupied_cells, total_cells),
            min_label: (occupied_cells > 0).then_some(min),
            max_label: max,
            mean_label: if occupied_cells > 0 {
                sum / occupied_cells as f64
            } else {
                0.0
            },
        }
    }

    fn ratio(part: usize, whole: usize) -> f64 {
        if whole == 0 {
            return 0.0;
        }
        part as f64 / whole as f64
    }

    /// Returns true if no cell ever moved.
    pub fn is_empty(&self) -> bool {
        self.occupied_cells == 0
    }

    /// Number of distinct frames spanned by the occupied labels.
    pub fn label_span(&self) -> u64 {
        self.min_label
            .map(|min| (self.max_label - min) as u64 + 1)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_field() {
        let stats = HullStatistics::analyze(&HullField::zeros((2, 2, 2)));

        assert!(stats.is_empty());
        assert_eq!(stats.total_cells, 8);
        assert_eq!(stats.coverage, 0.0);
        assert_eq!(stats.min_label, None);
        assert_eq!(stats.label_span(), 0);
    }

    #[test]
    fn test_diagonal_labels() {
        let mut cells = HullField::zeros((3, 3, 3));
        cells[[0, 0, 0]] = 1.0;
        cells[[1, 1, 1]] = 2.0;
        cells[[2, 2, 2]] = 3.0;
        let stats = HullStatistics::analyze(&cells);

        assert_eq!(stats.occupied_cells, 3);
        assert!((stats.coverage - 3.0 / 27.0).abs() < 1e-12);
        assert_eq!(stats.min_label, Some(1.0));
        assert_eq!(stats.max_label, 3.0);
        assert!((stats.mean_label - 2.0).abs() < 1e-12);
        assert_eq!(stats.label_span(), 3);
    }

    #[test]
    fn test_zero_sized_field() {
        let stats = HullStatistics::analyze(&HullField::zeros((0, 3, 3)));
        assert_eq!(stats.coverage, 0.0);
        assert!(stats.is_empty());
    }
}
