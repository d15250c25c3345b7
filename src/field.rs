//! N-dimensional scalar field vocabulary.
//!
//! Batches are 4D arrays laid out as `(time, depth, height, width)` and
//! hull fields are 3D arrays `(depth, height, width)`. A 2D input is simply
//! a volume with `depth == 1`, so every operation here is written once
//! against the 3 spatial + 1 temporal layout.
//!
//! All elementwise arithmetic goes through [`ndarray::Zip`] with the rayon
//! backend; no operation depends on neighbouring output voxels.

use ndarray::{s, Array3, Array4, ArrayView3, ArrayView4, Axis, Slice, Zip};

/// Time axis of a batch.
pub const TIME: usize = 0;
/// Depth (z) axis of a batch.
pub const DEPTH: usize = 1;
/// Height (y) axis of a batch.
pub const HEIGHT: usize = 2;
/// Width (x) axis of a batch.
pub const WIDTH: usize = 3;

/// Full display magnitude of a voxel intensity or rescaled hull label.
pub const DISPLAY_MAX: f32 = 255.0;

/// A run of consecutive frames, `(time, depth, height, width)`.
pub type Batch = Array4<f32>;

/// A time-free scalar field, `(depth, height, width)`.
pub type HullField = Array3<f32>;

/// Spatial extents of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extents {
    /// Voxels along x.
    pub width: usize,
    /// Voxels along y.
    pub height: usize,
    /// Voxels along z (1 for planar data).
    pub depth: usize,
}

impl Extents {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Number of voxels in one frame.
    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// True when the data has a real depth axis.
    #[inline]
    pub fn is_volumetric(&self) -> bool {
        self.depth != 1
    }

    /// Shape of one frame as an ndarray shape `(depth, height, width)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.depth, self.height, self.width)
    }
}

fn adjacent_pair<'a>(field: &'a ArrayView4<'_, f32>, axis: usize) -> (ArrayView4<'a, f32>, ArrayView4<'a, f32>) {
    let lower = field.slice_axis(Axis(axis), Slice::new(0, Some(-1), 1));
    let upper = field.slice_axis(Axis(axis), Slice::new(1, None, 1));
    (lower, upper)
}

/// One discrete difference along `axis`: `f[i] - f[i + 1]`.
///
/// The result is one sample shorter along `axis`.
pub fn difference(field: ArrayView4<'_, f32>, axis: usize) -> Batch {
    let (lower, upper) = adjacent_pair(&field, axis);
    Zip::from(&lower)
        .and(&upper)
        .par_map_collect(|&a, &b| a - b)
}

/// One smoothing pass along `axis`: `f[i] + f[i + 1]`.
///
/// Repeated passes build binomial weights, the smoothing half of a
/// Sobel-style operator.
pub fn smooth(field: ArrayView4<'_, f32>, axis: usize) -> Batch {
    let (lower, upper) = adjacent_pair(&field, axis);
    Zip::from(&lower)
        .and(&upper)
        .par_map_collect(|&a, &b| a + b)
}

/// Collapses the time axis by per-voxel maximum.
pub fn max_over_time(field: ArrayView4<'_, f32>) -> HullField {
    field.map_axis(Axis(TIME), |lane| {
        lane.iter().fold(0.0f32, |acc, &v| acc.max(v))
    })
}

/// Refines a field 2x per axis for mesh extraction.
///
/// Even coordinates carry the original samples; an odd coordinate on
/// exactly one axis carries the maximum of the two samples it sits
/// between. Positions with more than one odd coordinate are never used as
/// vertices and stay zero. An axis of length 1 stays length 1.
pub fn refine_max(field: ArrayView3<'_, f32>) -> HullField {
    let (d, h, w) = field.dim();
    let mut refined = Array3::<f32>::zeros((2 * d - 1, 2 * h - 1, 2 * w - 1));

    refined.slice_mut(s![..;2, ..;2, ..;2]).assign(&field);

    for axis in 0..3 {
        if field.len_of(Axis(axis)) < 2 {
            continue;
        }
        let lower = field.slice_axis(Axis(axis), Slice::new(0, Some(-1), 1));
        let upper = field.slice_axis(Axis(axis), Slice::new(1, None, 1));
        let mut target = match axis {
            0 => refined.slice_mut(s![1..;2, ..;2, ..;2]),
            1 => refined.slice_mut(s![..;2, 1..;2, ..;2]),
            _ => refined.slice_mut(s![..;2, ..;2, 1..;2]),
        };
        Zip::from(&mut target)
            .and(&lower)
            .and(&upper)
            .par_for_each(|t, &a, &b| *t = a.max(b));
    }

    refined
}
