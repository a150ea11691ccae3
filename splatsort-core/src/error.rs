//! Error types for splatsort

use thiserror::Error;

/// Main error type for splatsort operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    /// A completed sort produced an unsorted or non-bijective order.
    #[error("Ordering invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl Error {
    /// Whether the failure may clear up on a later frame.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Gpu(_))
    }
}

/// Result type alias for splatsort operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "gpu")]
impl From<wgpu::BufferAsyncError> for Error {
    fn from(e: wgpu::BufferAsyncError) -> Self {
        Error::Gpu(e.to_string())
    }
}

#[cfg(feature = "gpu")]
impl From<wgpu::Error> for Error {
    fn from(e: wgpu::Error) -> Self {
        Error::Gpu(e.to_string())
    }
}
