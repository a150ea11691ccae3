//! Core data structures and traits for splatsort
//!
//! This crate provides the splat element types, the index permutation that
//! describes drawing order, the arcball camera, sort configuration and frame
//! scheduling, and the [`DepthSorter`] trait implemented by the CPU and GPU
//! backends.

pub mod camera;
pub mod config;
pub mod error;
pub mod frame;
pub mod permutation;
pub mod splat;
pub mod splat_set;
pub mod traits;

pub use camera::*;
pub use config::*;
pub use error::*;
pub use frame::*;
pub use permutation::*;
pub use splat::*;
pub use splat_set::*;
pub use traits::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};
