//! Run configuration.
//!
//! Parses the dimension file and run options and validates them into the
//! [`HullConfig`] the rest of the pipeline consumes. Nothing downstream
//! re-checks these values.

mod dimensions;
mod params;

pub use dimensions::DimensionFile;
pub use params::{ConfigError, FeatureMode, HullConfig, KernelSize, RunOptions, MIN_KERNEL_SIZE};
