//! Growable mesh storage.

/// Initial vertex and face capacity of a fresh mesh.
pub const INITIAL_CAPACITY: usize = 100;

/// Append-only buffer that doubles its capacity when full.
///
/// Clearing keeps the allocation so a mesh reused across frames stops
/// reallocating once it has seen its largest frame.
#[derive(Debug, Clone)]
pub struct GrowBuffer<T> {
    items: Vec<T>,
}

impl<T> GrowBuffer<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity.max(1)),
        }
    }

    /// Appends `item`, returning its zero-based index.
    pub fn push(&mut self, item: T) -> usize {
        if self.items.len() == self.items.capacity() {
            let grow = self.items.capacity().max(1);
            self.items.reserve_exact(grow);
        }
        self.items.push(item);
        self.items.len() - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Vertex attributes and triangles of one extracted surface.
///
/// Vertex ids are 1-based, as written to OBJ files; 0 never names a vertex.
#[derive(Debug, Clone)]
pub struct Mesh {
    positions: GrowBuffer<[f32; 3]>,
    colors: GrowBuffer<[f32; 3]>,
    normals: GrowBuffer<[f32; 3]>,
    faces: GrowBuffer<[u32; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY, INITIAL_CAPACITY)
    }

    pub fn with_capacity(vertices: usize, faces: usize) -> Self {
        Self {
            positions: GrowBuffer::with_capacity(vertices),
            colors: GrowBuffer::with_capacity(vertices),
            normals: GrowBuffer::with_capacity(vertices),
            faces: GrowBuffer::with_capacity(faces),
        }
    }

    /// Adds a vertex with a zero normal and returns its 1-based id.
    pub fn add_vertex(&mut self, position: [f32; 3], color: [f32; 3]) -> u32 {
        self.colors.push(color);
        self.normals.push([0.0; 3]);
        (self.positions.push(position) + 1) as u32
    }

    /// Adds a triangle of 1-based vertex ids.
    pub fn add_face(&mut self, face: [u32; 3]) {
        self.faces.push(face);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        self.positions.as_slice()
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        self.colors.as_slice()
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        self.normals.as_slice()
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        self.faces.as_slice()
    }

    /// Vertex and face capacity currently allocated.
    pub fn capacity(&self) -> (usize, usize) {
        (self.positions.capacity(), self.faces.capacity())
    }

    /// Empties the mesh, keeping its allocations.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.normals.clear();
        self.faces.clear();
    }

    /// Area-weighted vertex normals.
    ///
    /// Every face adds its raw cross product, whose length is twice its
    /// area, to each of its vertices and the sums are normalized. Vertices whose contributions cancel keep a
    /// zero normal; their count is returned.
    pub fn compute_normals(&mut self) -> usize {
        let positions = self.positions.as_slice();
        let normals = self.normals.as_mut_slice();
        normals.fill([0.0; 3]);

        for face in self.faces.as_slice() {
            let [a, b, c] = face.map(|id| positions[id as usize - 1]);
            let u = sub(b, a);
            let v = sub(c, a);
            let n = [
                u[1] * v[2] - u[2] * v[1],
                u[2] * v[0] - u[0] * v[2],
                u[0] * v[1] - u[1] * v[0],
            ];
            for id in face {
                let target = &mut normals[*id as usize - 1];
                for k in 0..3 {
                    target[k] += n[k];
                }
            }
        }

        let mut degenerate = 0;
        for normal in normals.iter_mut() {
            *normal = normalized(*normal);
            if *normal == [0.0; 3] {
                degenerate += 1;
            }
        }
        degenerate
    }

    /// Gives every vertex the same normal.
    pub fn set_uniform_normal(&mut self, normal: [f32; 3]) {
        self.normals.as_mut_slice().fill(normal);
    }

    /// Divides each position component by the matching entry of `divisor`.
    pub fn scale(&mut self, divisor: [f32; 3]) {
        for p in self.positions.as_mut_slice() {
            for k in 0..3 {
                p[k] /= divisor[k];
            }
        }
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn normalized(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0; 3]
    }
}
