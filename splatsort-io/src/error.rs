//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while loading or saving splat datasets
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file length: {len} bytes is not a multiple of the {record_size}-byte splat record")]
    InvalidLength { len: u64, record_size: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for splatsort_core::Error {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Io(io) => splatsort_core::Error::Io(io),
            other => splatsort_core::Error::InvalidData(other.to_string()),
        }
    }
}
