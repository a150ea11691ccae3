//! Core traits for splatsort

use crate::{config::VerifyMode, splat_set::SplatSet, Result};
use nalgebra::Matrix4;

/// Outcome of a verification that completed without finding a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationReport {
    pub mode: VerifyMode,
    /// Number of elements whose order was checked
    pub checked: usize,
}

/// A backend that keeps a dataset resident and orders it back-to-front each frame.
pub trait DepthSorter {
    /// Short backend name for diagnostics
    fn backend_name(&self) -> &'static str;

    /// Replace the resident dataset.
    ///
    /// New resources are fully built before the old ones are released; on
    /// error the previous dataset stays installed.
    fn load(&mut self, splats: &SplatSet) -> Result<()>;

    /// Number of resident elements
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transform depths with `view_proj` and run the full sort plan.
    fn sort(&mut self, view_proj: &Matrix4<f32>) -> Result<()>;

    /// Advance verification of the most recent sort.
    ///
    /// Returns a report when a check finished, `None` while one is still in
    /// flight, and `Error::InvariantViolation` when the order is wrong.
    fn verify(&mut self, mode: VerifyMode) -> Result<Option<VerificationReport>>;

    /// Wait for any verification still in flight.
    ///
    /// Backends that verify synchronously have nothing outstanding.
    fn finish_verification(&mut self) -> Result<Option<VerificationReport>> {
        Ok(None)
    }
}
