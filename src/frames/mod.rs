//! Raw frame input and batch streaming.
//!
//! This module reads the per-frame binary payloads and hands them to the
//! hull calculator as overlapping temporal batches. A frame is treated as
//! opaque voxel intensities; nothing here knows about features or hulls.

mod frame;
mod reader;
mod store;

pub use frame::Frame;
pub use reader::BatchReader;
pub use store::{DiskFrameStore, FrameError, FrameStore, MemoryFrameStore};
