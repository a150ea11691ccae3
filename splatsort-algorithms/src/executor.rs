//! CPU sort pass executor
//!
//! Executes bitonic stages over an index permutation in place. A stage pairs
//! index `i` with `p = i ^ pattern`; the pair belongs to the lower index and
//! is swapped when `depth[perm[p]] < depth[perm[i]]`, so the lower position
//! always ends up with the smaller depth. Pairs with `p >= N` are skipped.
//!
//! Every pair of a stage lives inside one block of `2 * half` indices (`half`
//! being the pattern's highest bit) with its lower member in the block's
//! first half. Blocks are disjoint slices, so rayon can hand them to
//! different workers without two workers ever writing the same slot. Within
//! a block the lower half `t` maps to upper half `t ^ (pattern & (half - 1))`.

use crate::plan::{SortPlan, SortStage};
use rayon::prelude::*;
use splatsort_core::{Error, IndexPermutation, Result};

/// Run one stage over `perm`.
///
/// # Panics
///
/// Panics if an entry of `perm` is not a valid index into `depths`.
pub fn execute_stage(stage: SortStage, depths: &[f32], perm: &mut [u32]) {
    let half = stage.half_block() as usize;
    if half == 0 || perm.len() <= half {
        return;
    }
    let low = stage.compare_pattern as usize & (half - 1);

    perm.par_chunks_mut(2 * half).for_each(|block| {
        if block.len() <= half {
            return;
        }
        let (lower, upper) = block.split_at_mut(half);
        if low == 0 {
            lower
                .par_iter_mut()
                .zip(upper.par_iter_mut())
                .for_each(|(a, b)| compare_swap(depths, a, b));
        } else if low == half - 1 {
            // flip stage: lower[half - 1 - u] pairs with upper[u]
            lower
                .par_iter_mut()
                .rev()
                .zip(upper.par_iter_mut())
                .for_each(|(a, b)| compare_swap(depths, a, b));
        } else {
            for (u, b) in upper.iter_mut().enumerate() {
                compare_swap(depths, &mut lower[u ^ low], b);
            }
        }
    });
}

#[inline]
fn compare_swap(depths: &[f32], lower: &mut u32, upper: &mut u32) {
    if depths[*upper as usize] < depths[*lower as usize] {
        std::mem::swap(lower, upper);
    }
}

/// Run every stage of `plan` in order, each one finishing before the next starts.
pub fn execute_plan(plan: &SortPlan, depths: &[f32], perm: &mut IndexPermutation) -> Result<()> {
    if perm.len() != depths.len() {
        return Err(Error::InvalidData(format!(
            "permutation has {} entries but {} depths were computed",
            perm.len(),
            depths.len()
        )));
    }
    if plan.len() != perm.len() {
        return Err(Error::InvalidData(format!(
            "sort plan was built for {} elements, got {}",
            plan.len(),
            perm.len()
        )));
    }

    let order = perm.as_mut_slice();
    for stage in plan {
        execute_stage(*stage, depths, order);
    }
    Ok(())
}

/// Sort `depths` from the identity order with a freshly planned network
pub fn bitonic_order(depths: &[f32]) -> Result<IndexPermutation> {
    let plan = SortPlan::new(depths.len())?;
    let mut perm = IndexPermutation::identity(depths.len())?;
    execute_plan(&plan, depths, &mut perm)?;
    Ok(perm)
}
