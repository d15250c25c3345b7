//! Marching cubes over volumetric fields.

use super::tables::{triangles, CUBE_CORNERS, CUBE_EDGE_POINTS, CUBE_TRIANGLES};
use super::{Coloring, Mesh, WeldMap, EPSILON};
use ndarray::ArrayView3;

/// Polygonizes every cell of `field`, welding vertices through `weld`.
///
/// `refined` is the 2x refined field supplying vertex values. Triangles
/// are emitted with outward winding.
pub(super) fn march(
    field: ArrayView3<'_, f32>,
    refined: ArrayView3<'_, f32>,
    coloring: Coloring,
    mesh: &mut Mesh,
    weld: &mut WeldMap,
) {
    let (d, h, w) = field.dim();
    for z in 0..d.saturating_sub(1) {
        for y in 0..h.saturating_sub(1) {
            for x in 0..w.saturating_sub(1) {
                let mut case = 0usize;
                for (bit, [cx, cy, cz]) in CUBE_CORNERS.iter().enumerate() {
                    if field[[z + cz, y + cy, x + cx]] > EPSILON {
                        case |= 1 << bit;
                    }
                }

                for [e0, e1, e2] in triangles(&CUBE_TRIANGLES[case]) {
                    let face = [e0, e2, e1].map(|edge| {
                        let [px, py, pz] = CUBE_EDGE_POINTS[edge];
                        let point = [2 * x + px, 2 * y + py, 2 * z + pz];
                        weld.get_or_insert_with(point, || {
                            let value = refined[[point[2], point[1], point[0]]];
                            mesh.add_vertex(point.map(|c| c as f32), coloring.color(value))
                        })
                    });
                    mesh.add_face(face);
                }
            }
        }
    }
}
