//! Frame storage abstraction.
//!
//! This module provides a trait-based abstraction over where raw frames
//! live, allowing the batch reader to stream either from disk or from an
//! in-memory list in tests.

use super::Frame;
use crate::field::Extents;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while reading frames.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read frame file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("frame {index} has {actual} bytes, expected {expected}")]
    WrongSize {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("frame index {index} out of range (store holds {len} frames)")]
    OutOfRange { index: usize, len: usize },
    #[error("all {0} batches have already been read")]
    Exhausted(usize),
    #[error("projection slice {slice} out of range for depth {depth}")]
    InvalidSlice { slice: usize, depth: usize },
}

/// Trait for frame sources.
///
/// Reads take `&self` so a store can be shared between threads, e.g. when
/// frames are meshed in parallel for animation export.
pub trait FrameStore: Sync {
    /// Spatial extents every frame must have.
    fn extents(&self) -> Extents;

    /// Number of frames available.
    fn len(&self) -> usize;

    /// Returns true if the store holds no frames.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads a single frame by index.
    fn read(&self, index: usize) -> Result<Frame, FrameError>;
}

/// Reads raw frame files from disk.
///
/// Each file holds exactly `width * height * depth` bytes, one unsigned
/// byte per voxel, row-major, no header.
#[derive(Debug, Clone)]
pub struct DiskFrameStore {
    paths: Vec<PathBuf>,
    extents: Extents,
}

impl DiskFrameStore {
    pub fn new(paths: Vec<PathBuf>, extents: Extents) -> Self {
        Self { paths, extents }
    }

    /// Returns the frame paths in order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Fails if any frame file is missing.
    ///
    /// Called before the first batch so that a missing file never leaves a
    /// partially labeled hull behind.
    pub fn check_present(&self) -> Result<(), FrameError> {
        match self.paths.iter().find(|p| !p.is_file()) {
            Some(missing) => Err(FrameError::NotFound(missing.clone())),
            None => Ok(()),
        }
    }

    fn read_path(&self, index: usize, path: &Path) -> Result<Frame, FrameError> {
        let voxels = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FrameError::NotFound(path.to_path_buf()),
            _ => FrameError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let frame = Frame::new(voxels, self.extents, index as u64)?;
        tracing::trace!(index, path = %path.display(), "Read frame");
        Ok(frame)
    }
}

impl FrameStore for DiskFrameStore {
    fn extents(&self) -> Extents {
        self.extents
    }

    fn len(&self) -> usize {
        self.paths.len()
    }

    fn read(&self, index: usize) -> Result<Frame, FrameError> {
        let path = self.paths.get(index).ok_or(FrameError::OutOfRange {
            index,
            len: self.paths.len(),
        })?;
        self.read_path(index, path)
    }
}

/// In-memory frame store for tests and synthetic input.
#[derive(Debug, Clone)]
pub struct MemoryFrameStore {
    frames: Vec<Vec<u8>>,
    extents: Extents,
}

impl MemoryFrameStore {
    pub fn new(frames: Vec<Vec<u8>>, extents: Extents) -> Self {
        Self { frames, extents }
    }

    /// Builds a store by evaluating `f(t, z, y, x)` for every voxel.
    pub fn from_fn(
        extents: Extents,
        duration: usize,
        f: impl Fn(usize, usize, usize, usize) -> u8,
    ) -> Self {
        let frames = (0..duration)
            .map(|t| {
                let mut voxels = Vec::with_capacity(extents.voxel_count());
                for z in 0..extents.depth {
                    for y in 0..extents.height {
                        for x in 0..extents.width {
                            voxels.push(f(t, z, y, x));
                        }
                    }
                }
                voxels
            })
            .collect();
        Self::new(frames, extents)
    }
}

impl FrameStore for MemoryFrameStore {
    fn extents(&self) -> Extents {
        self.extents
    }

    fn len(&self) -> usize {
        self.frames.len()
    }

    fn read(&self, index: usize) -> Result<Frame, FrameError> {
        let voxels = self.frames.get(index).ok_or(FrameError::OutOfRange {
            index,
            len: self.frames.len(),
        })?;
        Frame::new(voxels.clone(), self.extents, index as u64)
    }
}
