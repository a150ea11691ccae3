//! Bitonic network planner
//!
//! Builds the ordered list of compare patterns for a bitonic sort over `N`
//! keys. `N` need not be a power of two: executors skip any pair whose
//! partner `i ^ pattern` is `>= N`, which behaves like padding the input with
//! keys that never move.

use splatsort_core::{Error, Result};

/// One pass of the sorting network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortStage {
    /// XOR mask pairing index `i` with `i ^ compare_pattern`
    pub compare_pattern: u32,
}

impl SortStage {
    pub fn new(compare_pattern: u32) -> Self {
        Self { compare_pattern }
    }

    /// The index `i` is compared against in this stage
    #[inline]
    pub fn partner(&self, index: u32) -> u32 {
        index ^ self.compare_pattern
    }

    /// Highest set bit of the pattern.
    ///
    /// Pairs never straddle blocks of `2 * half_block()` indices, and the lower
    /// member of every pair sits in the block's first half.
    pub fn half_block(&self) -> u64 {
        match self.compare_pattern {
            0 => 0,
            p => 1u64 << (31 - p.leading_zeros()),
        }
    }
}

/// The complete stage sequence for one element count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortPlan {
    len: usize,
    stages: Vec<SortStage>,
}

impl SortPlan {
    /// Plan a sort over `len` keys.
    ///
    /// Each block size `k = 2, 4, 8, ...` contributes a flip stage with
    /// pattern `k - 1` followed by half-cleaner stages `k/2, k/4, ..., 1`,
    /// until `k / 2 >= len`. Fewer than two keys give an empty plan.
    pub fn new(len: usize) -> Result<Self> {
        if len > u32::MAX as usize {
            return Err(Error::InvalidData(format!(
                "cannot plan a sort over {} elements: indices are limited to u32",
                len
            )));
        }

        let n = len as u64;
        let mut stages = Vec::new();
        let mut k: u64 = 2;
        while (k >> 1) < n {
            stages.push(SortStage::new((k - 1) as u32));
            let mut j = k >> 1;
            while j > 0 {
                stages.push(SortStage::new(j as u32));
                j >>= 1;
            }
            k <<= 1;
        }

        log::debug!("planned {} bitonic stages for {} elements", stages.len(), len);
        Ok(Self { len, stages })
    }

    /// Element count the plan was built for
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stages(&self) -> &[SortStage] {
        &self.stages
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SortStage> {
        self.stages.iter()
    }
}

impl<'a> IntoIterator for &'a SortPlan {
    type Item = &'a SortStage;
    type IntoIter = std::slice::Iter<'a, SortStage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(plan: &SortPlan) -> Vec<u32> {
        plan.iter().map(|s| s.compare_pattern).collect()
    }

    #[test]
    fn test_trivial_sizes_have_no_stages() {
        assert_eq!(SortPlan::new(0).unwrap().stage_count(), 0);
        assert_eq!(SortPlan::new(1).unwrap().stage_count(), 0);
    }

    #[test]
    fn test_two_elements() {
        assert_eq!(patterns(&SortPlan::new(2).unwrap()), vec![1, 1]);
    }

    #[test]
    fn test_non_power_of_two_sequence() {
        let plan = SortPlan::new(5).unwrap();
        assert_eq!(patterns(&plan), vec![1, 1, 3, 2, 1, 7, 4, 2, 1]);
        assert_eq!(plan.len(), 5);
    }

    #[test]
    fn test_stage_count_grows_as_log_squared() {
        // m = ceil(log2 n) block sizes, block 2^t contributing t + 1 stages
        for (n, m) in [(4usize, 2u64), (8, 3), (9, 4), (1000, 10), (1024, 10), (1025, 11)] {
            let expected = m + m * (m + 1) / 2;
            assert_eq!(SortPlan::new(n).unwrap().stage_count() as u64, expected, "n = {}", n);
        }
    }

    #[test]
    fn test_plan_is_deterministic() {
        for n in [3, 17, 640, 4097] {
            assert_eq!(SortPlan::new(n).unwrap(), SortPlan::new(n).unwrap());
        }
    }

    #[test]
    fn test_half_block() {
        assert_eq!(SortStage::new(1).half_block(), 1);
        assert_eq!(SortStage::new(7).half_block(), 4);
        assert_eq!(SortStage::new(8).half_block(), 8);
        assert_eq!(SortStage::new(u32::MAX).half_block(), 1 << 31);
        assert_eq!(SortStage::new(0).half_block(), 0);
    }

    #[test]
    fn test_partner_is_an_involution() {
        let stage = SortStage::new(6);
        for i in 0..32 {
            assert_eq!(stage.partner(stage.partner(i)), i);
        }
    }
}
