//! Marching squares over planar fields.

use super::tables::{triangles, SQUARE_POINTS, SQUARE_TRIANGLES};
use super::{Coloring, Mesh, WeldMap, EPSILON};
use ndarray::ArrayView3;

/// Fills the occupied part of every cell of a `(1, height, width)` field.
pub(super) fn march(
    field: ArrayView3<'_, f32>,
    refined: ArrayView3<'_, f32>,
    coloring: Coloring,
    mesh: &mut Mesh,
    weld: &mut WeldMap,
) {
    let (_, h, w) = field.dim();
    let inside = |y: usize, x: usize| field[[0, y, x]] > EPSILON;

    for y in 0..h.saturating_sub(1) {
        for x in 0..w.saturating_sub(1) {
            let mut case = 0usize;
            if inside(y, x) {
                case |= 8;
            }
            if inside(y + 1, x) {
                case |= 4;
            }
            if inside(y + 1, x + 1) {
                case |= 2;
            }
            if inside(y, x + 1) {
                case |= 1;
            }

            for tri in triangles(&SQUARE_TRIANGLES[case]) {
                let face = tri.map(|p| {
                    let [px, py] = SQUARE_POINTS[p];
                    let point = [2 * x + px, 2 * y + py, 0];
                    weld.get_or_insert_with(point, || {
                        let value = refined[[0, point[1], point[0]]];
                        mesh.add_vertex(point.map(|c| c as f32), coloring.color(value))
                    })
                });
                mesh.add_face(face);
            }
        }
    }
}
