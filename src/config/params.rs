//! Hull computation parameters.
//!
//! Every precondition is checked here, before any frame is read: a
//! skipped or substituted frame would shift every later temporal label.

use super::DimensionFile;
use crate::field::Extents;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Smallest kernel size along any axis.
pub const MIN_KERNEL_SIZE: usize = 3;

/// Which second-derivative terms make up the feature field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FeatureMode {
    /// Pure second partials on every axis plus every mixed pair (weight 2).
    #[default]
    Full,
    /// Pure second partials only.
    Diagonal,
    /// Second time derivative coupled with each spatial axis.
    Motion,
}

impl TryFrom<u8> for FeatureMode {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Full),
            1 => Ok(Self::Diagonal),
            2 => Ok(Self::Motion),
            other => Err(ConfigError::InvalidMode(other)),
        }
    }
}

impl From<FeatureMode> for u8 {
    fn from(mode: FeatureMode) -> Self {
        match mode {
            FeatureMode::Full => 0,
            FeatureMode::Diagonal => 1,
            FeatureMode::Motion => 2,
        }
    }
}

/// Kernel size along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelSize {
    /// Width-axis kernel size.
    pub x: usize,
    /// Height-axis kernel size.
    pub y: usize,
    /// Depth-axis kernel size (ignored for planar data).
    pub z: usize,
    /// Temporal kernel size.
    pub t: usize,
}

impl Default for KernelSize {
    fn default() -> Self {
        Self {
            x: MIN_KERNEL_SIZE,
            y: MIN_KERNEL_SIZE,
            z: MIN_KERNEL_SIZE,
            t: MIN_KERNEL_SIZE,
        }
    }
}

impl KernelSize {
    /// Kernel sizes in batch axis order `(t, z, y, x)`.
    ///
    /// Planar data has no depth axis to convolve, so z collapses to 1.
    pub fn batch_axes(&self, volumetric: bool) -> [usize; 4] {
        [self.t, if volumetric { self.z } else { 1 }, self.y, self.x]
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    #[error("malformed dimension file: {0}")]
    MalformedDimensions(String),
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    #[error("dimension file lists {found} frames, expected {expected}")]
    FrameCountMismatch { expected: usize, found: usize },
    #[error("threshold must be positive, got {0}")]
    InvalidThreshold(f32),
    #[error("kernel {axis} size {size} too small, must be at least 3")]
    KernelTooSmall { axis: char, size: usize },
    #[error("kernel {axis} size {size} exceeds extent {extent}")]
    KernelTooLarge { axis: char, size: usize, extent: usize },
    #[error("batch count {batches} out of range (must be 1..={max})")]
    InvalidBatches { batches: usize, max: usize },
    #[error("invalid feature mode {0} (must be 0, 1 or 2)")]
    InvalidMode(u8),
}

/// Run options loaded from a TOML file and/or the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Number of batches the frames are streamed in.
    pub batches: usize,
    /// Feature threshold; features below `threshold^2` are discarded.
    pub threshold: f32,
    /// Derivative term selection.
    pub mode: FeatureMode,
    /// Also export one uncolored mesh per raw frame.
    pub export_animation: bool,
    /// Frames labeled by previous runs; non-zero resumes from a checkpoint.
    pub resume_offset: u64,
    /// Directory receiving meshes and the checkpoint.
    pub output_dir: PathBuf,
    /// Kernel sizes.
    pub kernel: KernelSize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            batches: 1,
            threshold: 100.0,
            mode: FeatureMode::Full,
            export_animation: false,
            resume_offset: 0,
            output_dir: PathBuf::from("."),
            kernel: KernelSize::default(),
        }
    }
}

impl RunOptions {
    /// Loads options from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Validated configuration consumed by the hull pipeline.
#[derive(Debug, Clone)]
pub struct HullConfig {
    pub extents: Extents,
    pub frames: Vec<PathBuf>,
    pub kernel: KernelSize,
    pub threshold: f32,
    pub mode: FeatureMode,
    pub batches: usize,
    pub export_animation: bool,
    pub resume_offset: u64,
    pub output_dir: PathBuf,
}

impl HullConfig {
    /// Merges a dimension file with run options and validates the result.
    pub fn new(dimensions: DimensionFile, options: RunOptions) -> Result<Self, ConfigError> {
        let config = Self {
            extents: dimensions.extents,
            frames: dimensions.frames,
            kernel: options.kernel,
            threshold: options.threshold,
            mode: options.mode,
            batches: options.batches,
            export_animation: options.export_animation,
            resume_offset: options.resume_offset,
            output_dir: options.output_dir,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks every parameter against the data extents.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.extents;
        if e.width == 0 || e.height == 0 || e.depth == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if !(self.threshold > 0.0) {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }

        check_kernel('x', self.kernel.x, e.width)?;
        check_kernel('y', self.kernel.y, e.height)?;
        if e.is_volumetric() {
            check_kernel('z', self.kernel.z, e.depth)?;
        }
        check_kernel('t', self.kernel.t, self.duration())?;

        let max = self.max_batches();
        if self.batches == 0 || self.batches > max {
            return Err(ConfigError::InvalidBatches {
                batches: self.batches,
                max,
            });
        }
        Ok(())
    }

    /// Number of frames in the run.
    #[inline]
    pub fn duration(&self) -> usize {
        self.frames.len()
    }

    /// Largest batch count that still gives every batch `kt` frames.
    pub fn max_batches(&self) -> usize {
        (self.duration() + 1).saturating_sub(self.kernel.t)
    }

    /// Kernel sizes in batch axis order `(t, z, y, x)`.
    pub fn kernel_axes(&self) -> [usize; 4] {
        self.kernel.batch_axes(self.extents.is_volumetric())
    }

    /// Shape of the hull accumulator, `(depth, height, width)` minus kernels.
    pub fn hull_shape(&self) -> (usize, usize, usize) {
        let [_, kz, ky, kx] = self.kernel_axes();
        (
            self.extents.depth + 1 - kz,
            self.extents.height + 1 - ky,
            self.extents.width + 1 - kx,
        )
    }

    /// Frames that receive a temporal label in this run.
    pub fn labeled_frames(&self) -> u64 {
        (self.duration() + 1 - self.kernel.t) as u64
    }

    /// Path of the accumulator checkpoint.
    pub fn checkpoint_path(&self) -> PathBuf {
        self.output_dir.join("hulls.ckpt")
    }

    /// Path of the final hull mesh.
    pub fn hull_mesh_path(&self) -> PathBuf {
        self.output_dir.join("hulls.obj")
    }

    /// Path of the mesh for raw frame `index`.
    pub fn animation_mesh_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("animation_{}.obj", index))
    }
}

fn check_kernel(axis: char, size: usize, extent: usize) -> Result<(), ConfigError> {
    if size > extent {
        return Err(ConfigError::KernelTooLarge { axis, size, extent });
    }
    if size < MIN_KERNEL_SIZE {
        return Err(ConfigError::KernelTooSmall { axis, size });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: usize, height: usize, depth: usize, duration: usize) -> DimensionFile {
        DimensionFile {
            extents: Extents::new(width, height, depth),
            frames: (0..duration).map(|i| PathBuf::from(format!("f{}.raw", i))).collect(),
        }
    }

    #[test]
    fn test_default_options_valid() {
        let config = HullConfig::new(dims(8, 8, 8, 10), RunOptions::default()).unwrap();
        assert_eq!(config.hull_shape(), (6, 6, 6));
        assert_eq!(config.labeled_frames(), 8);
        assert_eq!(config.max_batches(), 8);
    }

    #[test]
    fn test_planar_ignores_z_kernel() {
        let options = RunOptions {
            kernel: KernelSize {
                z: 99,
                ..Default::default()
            },
            ..Default::default()
        };
        let config = HullConfig::new(dims(6, 5, 1, 4), options).unwrap();
        assert_eq!(config.kernel_axes(), [3, 1, 3, 3]);
        assert_eq!(config.hull_shape(), (1, 3, 4));
    }

    #[test]
    fn test_invalid_threshold() {
        let options = RunOptions {
            threshold: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            HullConfig::new(dims(8, 8, 8, 10), options),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_kernel_bounds() {
        let small = RunOptions {
            kernel: KernelSize {
                x: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            HullConfig::new(dims(8, 8, 8, 10), small),
            Err(ConfigError::KernelTooSmall { axis: 'x', size: 2 })
        ));

        let large = RunOptions {
            kernel: KernelSize {
                t: 11,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            HullConfig::new(dims(8, 8, 8, 10), large),
            Err(ConfigError::KernelTooLarge { axis: 't', .. })
        ));
    }

    #[test]
    fn test_batch_bounds() {
        for batches in [0, 9] {
            let options = RunOptions {
                batches,
                ..Default::default()
            };
            assert!(matches!(
                HullConfig::new(dims(8, 8, 8, 10), options),
                Err(ConfigError::InvalidBatches { max: 8, .. })
            ));
        }
    }

    #[test]
    fn test_mode_conversion() {
        assert_eq!(FeatureMode::try_from(2).unwrap(), FeatureMode::Motion);
        assert!(matches!(
            FeatureMode::try_from(3),
            Err(ConfigError::InvalidMode(3))
        ));
        assert_eq!(u8::from(FeatureMode::Diagonal), 1);
    }

    #[test]
    fn test_options_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(
            &path,
            "batches = 4\nthreshold = 2.5\nmode = 1\n\n[kernel]\nt = 5\n",
        )
        .unwrap();

        let options = RunOptions::from_file(&path).unwrap();
        assert_eq!(options.batches, 4);
        assert_eq!(options.mode, FeatureMode::Diagonal);
        assert_eq!(options.kernel.t, 5);
        assert_eq!(options.kernel.x, 3);
        assert!(!options.export_animation);
    }

    #[test]
    fn test_options_reject_bad_mode() {
        let result: Result<RunOptions, _> = toml::from_str("mode = 7");
        assert!(result.is_err());
    }
}
