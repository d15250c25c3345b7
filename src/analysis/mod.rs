//! Hull occupancy analysis.
//!
//! Summaries of an accumulated hull field, used for run logging and the
//! exported metrics. They describe the result; nothing in the pipeline
//! branches on them.

mod statistics;

pub use statistics::HullStatistics;
