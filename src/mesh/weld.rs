//! Vertex welding on the refined lattice.

/// Maps refined lattice points to vertex ids so that neighbouring cells
/// share vertices. Id 0 marks an unassigned point.
#[derive(Debug, Clone)]
pub struct WeldMap {
    shape: (usize, usize, usize),
    ids: Vec<u32>,
}

impl WeldMap {
    /// Creates an empty map over a refined `(depth, height, width)` lattice.
    pub fn new(shape: (usize, usize, usize)) -> Self {
        Self {
            shape,
            ids: vec![0; shape.0 * shape.1 * shape.2],
        }
    }

    #[inline]
    fn index(&self, [x, y, z]: [usize; 3]) -> usize {
        (z * self.shape.1 + y) * self.shape.2 + x
    }

    /// Id at `point`, if one has been assigned.
    pub fn get(&self, point: [usize; 3]) -> Option<u32> {
        match self.ids[self.index(point)] {
            0 => None,
            id => Some(id),
        }
    }

    /// Returns the id at `point`, assigning one from `insert` on first use.
    pub fn get_or_insert_with(&mut self, point: [usize; 3], insert: impl FnOnce() -> u32) -> u32 {
        let index = self.index(point);
        if self.ids[index] == 0 {
            self.ids[index] = insert();
        }
        self.ids[index]
    }

    /// Number of assigned points.
    pub fn assigned(&self) -> usize {
        self.ids.iter().filter(|&&id| id != 0).count()
    }
}
