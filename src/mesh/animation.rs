//! Per-frame mesh export.
//!
//! Frames are independent, so each one is clipped, meshed and written on
//! the rayon pool. Workers keep one extractor each and reuse its buffers.

use super::{obj, Coloring, IsosurfaceExtractor, Marching, MeshError};
use crate::frames::FrameStore;
use rayon::prelude::*;
use std::path::PathBuf;

/// Raw intensities below this are treated as background.
pub const ANIMATION_CUTOFF: f32 = 224.0;

/// Writes one uncolored mesh per frame of `store`.
///
/// `path_for` maps a frame index to its output path. Returns the number of
/// meshes written.
pub fn export_animation<S, F>(store: &S, path_for: F) -> Result<usize, MeshError>
where
    S: FrameStore,
    F: Fn(usize) -> PathBuf + Sync,
{
    let frames = store.len();
    let marching = Marching::for_extents(store.extents());
    tracing::info!(frames, ?marching, "Exporting animation meshes");

    (0..frames)
        .into_par_iter()
        .try_for_each_init(|| IsosurfaceExtractor::new(marching), |extractor, index| {
            let mut field = store.read(index)?.to_field();
            field.mapv_inplace(|v| if v < ANIMATION_CUTOFF { 0.0 } else { v });
            let mesh = extractor.extract(field.view(), Coloring::Uniform);
            obj::save_obj(mesh, path_for(index))
        })?;

    Ok(frames)
}
