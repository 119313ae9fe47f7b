//! Utility modules for the fetch jobs.

pub mod fs;

pub use fs::{write_atomic, write_json_pretty};
