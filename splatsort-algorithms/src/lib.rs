//! Depth ordering algorithms for splatsort
//!
//! This crate contains the CPU side of the depth-ordering engine: the depth
//! transform stage, the bitonic network planner, the parallel sort pass
//! executor, the sequential reference sort and the correctness oracle.

pub mod depth;
pub mod executor;
pub mod oracle;
pub mod plan;
pub mod reference;
pub mod sorter;

pub use depth::{clip_position, compute_depths, depth_key, transform_depths};
pub use executor::{bitonic_order, execute_plan, execute_stage};
pub use oracle::{check_against_reference, check_bijection, check_monotonic, verify_order};
pub use plan::{SortPlan, SortStage};
pub use reference::{depths_in_order, reference_order};
pub use sorter::CpuDepthSorter;
