//! Surface extraction and mesh output.
//!
//! Hull fields and raw frames become triangle meshes through marching
//! cubes (volumes) or marching squares (planar data) on a 2x refined
//! lattice, and are written as Wavefront OBJ.

mod animation;
mod buffers;
mod cubes;
mod extractor;
mod obj;
mod squares;
mod tables;
mod weld;

pub use animation::{export_animation, ANIMATION_CUTOFF};
pub use buffers::{GrowBuffer, Mesh, INITIAL_CAPACITY};
pub use extractor::IsosurfaceExtractor;
pub use obj::{save_obj, write_obj};
pub use weld::WeldMap;

use crate::field::{Extents, DISPLAY_MAX};
use crate::frames::FrameError;
use std::path::PathBuf;

/// Values above this are inside the surface.
pub const EPSILON: f32 = 0.001;

/// Grey used for every vertex of an uncolored mesh.
pub const COLORLESS: f32 = 98.0 / 255.0;

/// Mesh output errors.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("failed to write mesh {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// How vertex colors are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coloring {
    /// Red for old labels through blue for recent ones.
    ByValue,
    /// Flat grey.
    Uniform,
}

impl Coloring {
    /// Color of a vertex whose refined field value is `value`.
    pub fn color(self, value: f32) -> [f32; 3] {
        match self {
            Coloring::ByValue => {
                let v = value / DISPLAY_MAX;
                [1.0 - v, 0.0, v]
            }
            Coloring::Uniform => [COLORLESS; 3],
        }
    }
}

/// Which marching algorithm polygonizes a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Marching {
    /// Closed surfaces of volumetric data.
    #[default]
    Cubes,
    /// Flat outlines of planar data, taken from the first depth plane.
    Squares,
}

impl Marching {
    /// Cubes for volumes, squares for single-plane data.
    pub fn for_extents(extents: Extents) -> Self {
        if extents.is_volumetric() {
            Marching::Cubes
        } else {
            Marching::Squares
        }
    }
}
