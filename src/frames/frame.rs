//! Frame type representing one raw volume at one instant.

use super::FrameError;
use crate::field::Extents;
use ndarray::Array3;

/// A single raw frame read from storage.
///
/// Holds one unsigned byte per voxel in row-major `(depth, height, width)`
/// order, together with its position in the frame list.
#[derive(Clone)]
pub struct Frame {
    /// Raw voxel data.
    voxels: Vec<u8>,
    /// Spatial extents of the frame.
    extents: Extents,
    /// Index of this frame in the run's frame list.
    sequence: u64,
}

impl Frame {
    /// Creates a frame, failing unless `voxels` holds exactly one byte
    /// per voxel of `extents`.
    pub fn new(voxels: Vec<u8>, extents: Extents, sequence: u64) -> Result<Self, FrameError> {
        if voxels.len() != extents.voxel_count() {
            return Err(FrameError::WrongSize {
                index: sequence as usize,
                expected: extents.voxel_count(),
                actual: voxels.len(),
            });
        }
        Ok(Self {
            voxels,
            extents,
            sequence,
        })
    }

    /// Returns a reference to the raw voxel data.
    #[inline]
    pub fn voxels(&self) -> &[u8] {
        &self.voxels
    }

    /// Returns the frame extents.
    #[inline]
    pub fn extents(&self) -> Extents {
        self.extents
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the frame as a `(depth, height, width)` byte volume.
    pub fn to_volume(&self) -> Array3<u8> {
        Array3::from_shape_fn(self.extents.shape(), |(z, y, x)| {
            self.voxels[(z * self.extents.height + y) * self.extents.width + x]
        })
    }

    /// Returns the raw intensities as floats in `[0, 255]`.
    pub fn to_field(&self) -> Array3<f32> {
        self.to_volume().mapv(f32::from)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("extents", &self.extents)
            .field("sequence", &self.sequence)
            .field("voxel_bytes", &self.voxels.len())
            .finish()
    }
}
