//! Overlapping temporal batches over a frame store.
//!
//! Consecutive batches share `kt - 1` border frames so that derivative
//! kernels spanning a batch boundary see the same samples they would in a
//! single pass. Border frames are copied from the previous batch, never
//! re-read from storage, so every frame file is read exactly once.

use super::{FrameError, FrameStore};
use crate::field::{Batch, DISPLAY_MAX, TIME};
use ndarray::{s, Array3, Axis};

/// Streams a frame store as a fixed number of overlapping batches.
pub struct BatchReader<S> {
    store: S,
    /// Frames shared between consecutive batches (`kt - 1`).
    border: usize,
    /// Total number of batches to serve.
    batches: usize,
    /// Batches handed out so far.
    served: usize,
    /// Next frame index to read from the store.
    pointer: usize,
    /// Current batch, raw intensities in `[0, 255]`.
    batch: Batch,
}

impl<S: FrameStore> BatchReader<S> {
    /// Creates a reader and primes the first batch.
    ///
    /// `kernel_t` is the temporal kernel size; `batches` must already be
    /// validated against the store length.
    pub fn new(store: S, kernel_t: usize, batches: usize) -> Result<Self, FrameError> {
        let batches = batches.max(1);
        let mut reader = Self {
            store,
            border: kernel_t.saturating_sub(1),
            batches,
            served: 0,
            pointer: 0,
            batch: Batch::zeros((0, 0, 0, 0)),
        };

        let len = reader.batch_len(0);
        reader.batch = reader.allocate(len);
        for i in 0..len {
            reader.fill(i)?;
        }

        tracing::info!(
            frames = reader.store.len(),
            batches,
            first_batch = len,
            border = reader.border,
            "Batch reader primed"
        );
        Ok(reader)
    }

    /// Number of frames in batch `n`.
    ///
    /// Partitions `duration + (B - 1) * border` frames as evenly as possible
    /// over `B` batches; the sizes sum to exactly that total.
    pub fn batch_len(&self, n: usize) -> usize {
        (self.store.len() + (self.batches - 1) * self.border + n) / self.batches
    }

    /// Returns the next batch, normalized to `[0, 1]`.
    ///
    /// The first call returns the batch primed by [`BatchReader::new`].
    pub fn next_batch(&mut self) -> Result<Batch, FrameError> {
        if self.served >= self.batches {
            return Err(FrameError::Exhausted(self.batches));
        }

        if self.served != 0 {
            let len = self.batch_len(self.served);
            let mut next = self.allocate(len);

            // Copy shared border
            let border = self.border as isize;
            next.slice_mut(s![..self.border, .., .., ..])
                .assign(&self.batch.slice(s![-border.., .., .., ..]));
            self.batch = next;

            for i in self.border..len {
                self.fill(i)?;
            }
        }

        self.served += 1;
        tracing::debug!(
            batch = self.served,
            frames = self.batch.len_of(Axis(TIME)),
            next_frame = self.pointer,
            "Serving batch"
        );
        Ok(self.batch.mapv(|v| v / DISPLAY_MAX))
    }

    /// Frames shared between consecutive batches.
    #[inline]
    pub fn border(&self) -> usize {
        self.border
    }

    /// Total number of batches this reader serves.
    #[inline]
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Number of batches already handed out.
    #[inline]
    pub fn batches_served(&self) -> usize {
        self.served
    }

    /// Number of distinct frames read from storage so far.
    #[inline]
    pub fn frames_read(&self) -> usize {
        self.pointer
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Full-resolution projection of every frame for display.
    ///
    /// Returns a `(height, width, frames)` volume holding depth slice
    /// `slice` of each frame, rows flipped so that y grows upwards.
    pub fn projection(&self, slice: usize) -> Result<Array3<u8>, FrameError> {
        let extents = self.store.extents();
        if slice >= extents.depth {
            return Err(FrameError::InvalidSlice {
                slice,
                depth: extents.depth,
            });
        }

        let frames = self.store.len();
        let mut animation = Array3::<u8>::zeros((extents.height, extents.width, frames));
        for t in 0..frames {
            let volume = self.store.read(t)?.to_volume();
            let plane = volume.index_axis(Axis(0), slice);
            animation
                .index_axis_mut(Axis(2), t)
                .assign(&plane.slice(s![..;-1, ..]));
        }
        Ok(animation)
    }

    fn allocate(&self, len: usize) -> Batch {
        let (d, h, w) = self.store.extents().shape();
        Batch::zeros((len, d, h, w))
    }

    fn fill(&mut self, slot: usize) -> Result<(), FrameError> {
        let frame = self.store.read(self.pointer)?;
        self.batch
            .index_axis_mut(Axis(TIME), slot)
            .assign(&frame.to_field());
        self.pointer += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Extents;
    use crate::frames::MemoryFrameStore;
    use proptest::prelude::*;

    fn store(duration: usize) -> MemoryFrameStore {
        MemoryFrameStore::from_fn(Extents::new(2, 2, 1), duration, |t, _, y, x| {
            (t * 10 + y * 2 + x) as u8
        })
    }

    #[test]
    fn test_single_batch_holds_everything() {
        let mut reader = BatchReader::new(store(5), 3, 1).unwrap();
        let batch = reader.next_batch().unwrap();

        assert_eq!(batch.dim(), (5, 1, 2, 2));
        assert_eq!(reader.frames_read(), 5);
        assert!((batch[[4, 0, 1, 1]] - 43.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_exhausted_after_all_batches() {
        let mut reader = BatchReader::new(store(6), 3, 2).unwrap();
        reader.next_batch().unwrap();
        reader.next_batch().unwrap();
        assert!(matches!(reader.next_batch(), Err(FrameError::Exhausted(2))));
    }

    #[test]
    fn test_batch_sizes_cover_all_frames() {
        // duration 10, kt 3, 3 batches: 10 + 2 * 2 = 14 frames -> 4, 5, 5
        let mut reader = BatchReader::new(store(10), 3, 3).unwrap();
        let sizes: Vec<usize> = (0..3)
            .map(|_| reader.next_batch().unwrap().len_of(Axis(TIME)))
            .collect();

        assert_eq!(sizes, vec![4, 5, 5]);
        assert_eq!(reader.frames_read(), 10);
    }

    #[test]
    fn test_projection_flips_rows() {
        let reader = BatchReader::new(store(3), 3, 1).unwrap();
        let projection = reader.projection(0).unwrap();

        assert_eq!(projection.dim(), (2, 2, 3));
        // frame 2, source row 1 becomes output row 0
        assert_eq!(projection[[0, 1, 2]], 23);
        assert_eq!(projection[[1, 0, 2]], 20);
        assert!(matches!(
            reader.projection(1),
            Err(FrameError::InvalidSlice { slice: 1, depth: 1 })
        ));
    }

    proptest! {
        #[test]
        fn prop_border_frames_are_shared(
            duration in 3usize..24,
            kt in 3usize..5,
            batches_hint in 1usize..8,
        ) {
            prop_assume!(kt <= duration);
            let batches = batches_hint.min(duration - kt + 1);
            let mut reader = BatchReader::new(store(duration), kt, batches).unwrap();
            let border = kt - 1;

            let mut previous: Option<Batch> = None;
            let mut total = 0;
            for _ in 0..batches {
                let batch = reader.next_batch().unwrap();
                let len = batch.len_of(Axis(TIME));
                prop_assert!(len >= kt);
                total += len;
                if let Some(prev) = previous {
                    let tail = prev.slice(s![-(border as isize).., .., .., ..]);
                    let head = batch.slice(s![..border, .., .., ..]);
                    prop_assert_eq!(tail, head);
                }
                previous = Some(batch);
            }

            prop_assert_eq!(total, duration + (batches - 1) * border);
            prop_assert_eq!(reader.frames_read(), duration);
        }
    }
}
