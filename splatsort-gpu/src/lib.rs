//! # Splatsort GPU
//!
//! Per-frame depth transform and bitonic sort of resident splat datasets
//! using WGPU compute shaders.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use splatsort_gpu::{GpuContext, GpuDepthSorter};
//! use splatsort_core::{DepthSorter, Matrix4, SortConfig, SplatSet, VerifyMode};
//!
//! async fn example(splats: &SplatSet) -> splatsort_core::Result<()> {
//!     let gpu_context = GpuContext::new().await?;
//!     let mut sorter = GpuDepthSorter::new(&gpu_context, SortConfig::default())?;
//!
//!     sorter.load(splats)?;
//!     sorter.sort(&Matrix4::identity())?;
//!     // starts a readback that a later frame picks up
//!     sorter.verify(VerifyMode::Monotonic)?;
//!     if let Some(report) = sorter.finish_verification()? {
//!         println!("checked {} splats", report.checked);
//!     }
//!     Ok(())
//! }
//! ```

pub mod buffers;
pub mod device;
pub mod readback;
pub mod sort;
pub mod types;

pub use buffers::*;
pub use device::*;
pub use readback::*;
pub use sort::*;
pub use types::*;
