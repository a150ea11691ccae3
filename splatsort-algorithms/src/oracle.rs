//! Correctness oracle for completed sorts
//!
//! A violation means the planner or an executor is broken, or a sort raced
//! the depth transform. It is reported as [`Error::InvariantViolation`] and
//! never corrected.

use crate::reference::{depths_in_order, reference_order};
use splatsort_core::{bijection_defect, Error, Result, VerificationReport, VerifyMode};

/// Check that depths read in `order` never decrease
pub fn check_monotonic(depths: &[f32], order: &[u32]) -> Result<()> {
    check_lengths(depths, order)?;
    for i in 1..order.len() {
        let (prev, cur) = (order[i - 1] as usize, order[i] as usize);
        let (Some(&a), Some(&b)) = (depths.get(prev), depths.get(cur)) else {
            return Err(violation(format!("order references element {} of {}", prev.max(cur), depths.len())));
        };
        if a > b {
            return Err(violation(format!(
                "depth[perm[{}]] = {} (element {}) exceeds depth[perm[{}]] = {} (element {})",
                i - 1,
                a,
                prev,
                i,
                b,
                cur
            )));
        }
    }
    Ok(())
}

/// Check that `order` is a permutation of `[0, N)`
pub fn check_bijection(order: &[u32]) -> Result<()> {
    match bijection_defect(order) {
        Some(reason) => Err(violation(format!("order is not a permutation: {}", reason))),
        None => Ok(()),
    }
}

/// Re-sort sequentially and compare the resulting depth sequences.
///
/// Permutations may legitimately differ inside groups of equal depth, so only
/// the depth values are compared.
pub fn check_against_reference(depths: &[f32], order: &[u32]) -> Result<()> {
    check_lengths(depths, order)?;
    check_bijection(order)?;
    let reference = reference_order(depths)?;
    let expected = depths_in_order(depths, reference.as_slice());
    let actual = depths_in_order(depths, order);
    if let Some(position) = expected.iter().zip(&actual).position(|(e, a)| e != a) {
        return Err(violation(format!(
            "position {} holds depth {} but the reference sort has {}",
            position, actual[position], expected[position]
        )));
    }
    Ok(())
}

/// Run the checks selected by `mode`; `None` when verification is off.
pub fn verify_order(mode: VerifyMode, depths: &[f32], order: &[u32]) -> Result<Option<VerificationReport>> {
    match mode {
        VerifyMode::Off => return Ok(None),
        VerifyMode::Monotonic => {
            check_bijection(order)?;
            check_monotonic(depths, order)?;
        }
        VerifyMode::Reference => {
            check_monotonic(depths, order)?;
            check_against_reference(depths, order)?;
        }
    }
    Ok(Some(VerificationReport {
        mode,
        checked: order.len(),
    }))
}

fn check_lengths(depths: &[f32], order: &[u32]) -> Result<()> {
    if depths.len() != order.len() {
        return Err(violation(format!(
            "order has {} entries for {} depths",
            order.len(),
            depths.len()
        )));
    }
    Ok(())
}

fn violation(message: String) -> Error {
    log::error!("depth order invariant violated: {}", message);
    Error::InvariantViolation(message)
}
