//! Isosurface extraction.

use super::{cubes, squares, Coloring, Marching, Mesh, WeldMap};
use crate::field;
use ndarray::{s, ArrayView3};

/// Turns scalar fields into triangle meshes.
///
/// The extractor owns its mesh so repeated extractions reuse the vertex
/// and face allocations.
#[derive(Debug, Default)]
pub struct IsosurfaceExtractor {
    marching: Marching,
    mesh: Mesh,
}

impl IsosurfaceExtractor {
    pub fn new(marching: Marching) -> Self {
        Self {
            marching,
            mesh: Mesh::new(),
        }
    }

    pub fn marching(&self) -> Marching {
        self.marching
    }

    /// Extracts the `> EPSILON` boundary of a `(depth, height, width)` field.
    ///
    /// Marching squares reads the first depth plane and gives every vertex
    /// a `+z` normal. Marching cubes averages face normals, and a field one
    /// plane deep has no cubes to march. Positions end up divided by twice
    /// the field extent on each axis.
    pub fn extract(&mut self, field: ArrayView3<'_, f32>, coloring: Coloring) -> &Mesh {
        self.mesh.clear();
        let (d, h, w) = field.dim();
        if d == 0 || h == 0 || w == 0 {
            return &self.mesh;
        }

        match self.marching {
            Marching::Squares => {
                let plane = field.slice(s![..1, .., ..]);
                let refined = field::refine_max(plane);
                let mut weld = WeldMap::new(refined.dim());
                squares::march(plane, refined.view(), coloring, &mut self.mesh, &mut weld);
                self.mesh.set_uniform_normal([0.0, 0.0, 1.0]);
            }
            Marching::Cubes => {
                let refined = field::refine_max(field.view());
                let mut weld = WeldMap::new(refined.dim());
                cubes::march(field.view(), refined.view(), coloring, &mut self.mesh, &mut weld);
                let degenerate = self.mesh.compute_normals();
                if degenerate > 0 {
                    tracing::warn!(vertices = degenerate, "Vertex normals cancelled out, left at zero");
                }
            }
        }
        self.mesh.scale([2.0 * w as f32, 2.0 * h as f32, 2.0 * d as f32]);

        tracing::trace!(
            vertices = self.mesh.vertex_count(),
            faces = self.mesh.face_count(),
            "Surface extracted"
        );
        &self.mesh
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::HullField;
    use crate::mesh::COLORLESS;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};

    fn extract(field: &HullField, coloring: Coloring) -> Mesh {
        let mut extractor = IsosurfaceExtractor::new(Marching::Cubes);
        extractor.extract(field.view(), coloring);
        extractor.into_mesh()
    }

    fn extract_planar(field: &HullField, coloring: Coloring) -> Mesh {
        let mut extractor = IsosurfaceExtractor::new(Marching::Squares);
        extractor.extract(field.view(), coloring);
        extractor.into_mesh()
    }

    /// Every undirected edge of a closed, consistently wound mesh is used
    /// once in each direction.
    fn assert_closed_and_oriented(mesh: &Mesh) {
        let mut directed = HashMap::new();
        for &[a, b, c] in mesh.faces() {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *directed.entry((u, v)).or_insert(0) += 1;
            }
        }
        for (&(u, v), &count) in &directed {
            assert_eq!(count, 1, "edge {}-{} repeated", u, v);
            assert_eq!(directed.get(&(v, u)), Some(&1), "edge {}-{} unmatched", u, v);
        }
    }

    #[test]
    fn test_empty_field_gives_empty_mesh() {
        let mesh = extract(&HullField::zeros((4, 4, 4)), Coloring::ByValue);
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_single_voxel_is_closed_octahedron() {
        let mut field = HullField::zeros((3, 3, 3));
        field[[1, 1, 1]] = 255.0;
        let mesh = extract(&field, Coloring::ByValue);

        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.face_count(), 8);
        assert_closed_and_oriented(&mesh);

        // refined (1, 2, 2) scaled by 2 * 3 per axis
        let expected = [1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0];
        assert!(mesh
            .positions()
            .iter()
            .any(|p| (0..3).all(|k| (p[k] - expected[k]).abs() < 1e-6)));
    }

    #[test]
    fn test_normals_point_outwards() {
        let mut field = HullField::zeros((3, 3, 3));
        field[[1, 1, 1]] = 255.0;
        let mesh = extract(&field, Coloring::ByValue);
        // voxel (1, 1, 1) sits at refined 2, scaled by 1 / 6
        let centre = [1.0 / 3.0; 3];

        for (p, n) in mesh.positions().iter().zip(mesh.normals()) {
            let outward: f32 = (0..3).map(|k| (p[k] - centre[k]) * n[k]).sum();
            assert!(outward > 0.0);
            let len: f32 = n.iter().map(|c| c * c).sum::<f32>().sqrt();
            assert!((len - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_corner_voxel_gives_one_triangle() {
        let mut field = HullField::zeros((2, 2, 2));
        field[[0, 0, 0]] = 10.0;
        let mesh = extract(&field, Coloring::ByValue);

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_vertices_are_welded() {
        let mut field = HullField::zeros((5, 5, 5));
        for z in 1..4 {
            for y in 1..4 {
                for x in 1..3 {
                    field[[z, y, x]] = 100.0;
                }
            }
        }
        let mesh = extract(&field, Coloring::ByValue);

        let unique: HashSet<[u32; 3]> = mesh
            .positions()
            .iter()
            .map(|p| p.map(f32::to_bits))
            .collect();
        assert_eq!(unique.len(), mesh.vertex_count());
        assert_closed_and_oriented(&mesh);
    }

    #[test]
    fn test_colors_follow_values() {
        let mut field = HullField::zeros((3, 3, 3));
        field[[1, 1, 1]] = 170.0;
        let mesh = extract(&field, Coloring::ByValue);
        for c in mesh.colors() {
            assert!((c[0] - 1.0 / 3.0).abs() < 1e-5);
            assert_eq!(c[1], 0.0);
            assert!((c[2] - 2.0 / 3.0).abs() < 1e-5);
        }

        let grey = extract(&field, Coloring::Uniform);
        assert!(grey.colors().iter().all(|c| *c == [COLORLESS; 3]));
    }

    #[test]
    fn test_planar_field_uses_squares() {
        let mut field = HullField::zeros((1, 3, 3));
        field[[0, 1, 1]] = 50.0;
        let mesh = extract_planar(&field, Coloring::ByValue);

        // one corner triangle in each of the four cells
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(mesh.vertex_count(), 5);
        assert!(mesh.normals().iter().all(|n| *n == [0.0, 0.0, 1.0]));
        assert!(mesh.positions().iter().all(|p| p[2] == 0.0));
    }

    #[test]
    fn test_full_plane_is_two_triangles_per_cell() {
        let field = HullField::ones((1, 3, 4));
        let mesh = extract_planar(&field, Coloring::Uniform);
        assert_eq!(mesh.face_count(), 2 * 2 * 3);
    }

    #[test]
    fn test_single_plane_of_volume_has_no_cubes() {
        let mut field = HullField::zeros((1, 3, 3));
        field[[0, 1, 1]] = 50.0;
        let mesh = extract(&field, Coloring::ByValue);
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_marching_follows_extents() {
        use crate::field::Extents;
        assert_eq!(Marching::for_extents(Extents::new(6, 6, 3)), Marching::Cubes);
        assert_eq!(Marching::for_extents(Extents::new(6, 6, 1)), Marching::Squares);
        assert_eq!(IsosurfaceExtractor::default().marching(), Marching::Cubes);
    }

    proptest! {
        #[test]
        fn prop_enclosed_volumes_are_closed_and_welded(
            cells in proptest::collection::vec(any::<bool>(), 64)
        ) {
            // 4^3 interior inside a zero border
            let mut field = HullField::zeros((6, 6, 6));
            for (i, &on) in cells.iter().enumerate() {
                if on {
                    field[[1 + i / 16, 1 + (i / 4) % 4, 1 + i % 4]] = 200.0;
                }
            }
            let mesh = extract(&field, Coloring::ByValue);

            let unique: HashSet<[u32; 3]> = mesh
                .positions()
                .iter()
                .map(|p| p.map(f32::to_bits))
                .collect();
            prop_assert_eq!(unique.len(), mesh.vertex_count());
            prop_assert_eq!(mesh.is_empty(), !cells.contains(&true));
            assert_closed_and_oriented(&mesh);
        }
    }

    #[test]
    fn test_extractor_reuse_resets_mesh() {
        let mut field = HullField::zeros((3, 3, 3));
        field[[1, 1, 1]] = 255.0;
        let mut extractor = IsosurfaceExtractor::new(Marching::Cubes);
        extractor.extract(field.view(), Coloring::ByValue);
        extractor.extract(HullField::zeros((3, 3, 3)).view(), Coloring::ByValue);
        assert!(extractor.mesh().is_empty());
    }
}
