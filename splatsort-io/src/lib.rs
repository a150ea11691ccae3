//! I/O operations for splat datasets
//!
//! This crate reads and writes the fixed-record binary splat format and can
//! generate random datasets for testing.

pub mod error;
pub mod splat_file;

pub use error::*;
pub use splat_file::{encode_splats, parse_splats, random_splats, read_splat_file, write_splat_file};

use splatsort_core::{Result, SplatSet};

/// Load a dataset, converting failures into the core error type
pub fn load_dataset<P: AsRef<std::path::Path>>(path: P) -> Result<SplatSet> {
    Ok(read_splat_file(path)?)
}
