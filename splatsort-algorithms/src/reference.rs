//! Sequential reference sort
//!
//! Ground truth for the bitonic executors and the fallback when parallel
//! execution is unavailable.

use splatsort_core::{IndexPermutation, Result};

/// Stable sort of `[0, N)` by depth, ties kept in original index order.
pub fn reference_order(depths: &[f32]) -> Result<IndexPermutation> {
    let mut perm = IndexPermutation::identity(depths.len())?;
    perm.as_mut_slice().sort_by(|&a, &b| {
        depths[a as usize]
            .total_cmp(&depths[b as usize])
            .then(a.cmp(&b))
    });
    Ok(perm)
}

/// Depths read in the given drawing order
pub fn depths_in_order(depths: &[f32], order: &[u32]) -> Vec<f32> {
    order.iter().map(|&i| depths[i as usize]).collect()
}
