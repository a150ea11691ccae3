//! Index permutation describing drawing order

use crate::error::{Error, Result};

/// Maps draw position to original splat index.
///
/// Always a bijection over `[0, len)`: it starts as the identity and is only
/// ever mutated through swaps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexPermutation {
    indices: Vec<u32>,
}

impl IndexPermutation {
    /// Identity permutation over `[0, len)`
    pub fn identity(len: usize) -> Result<Self> {
        let len = u32::try_from(len).map_err(|_| {
            Error::InvalidData(format!("{} elements exceed the u32 index range", len))
        })?;
        Ok(Self {
            indices: (0..len).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.indices
    }

    /// Mutable access restricted to whole-slice swaps by the sort executors.
    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        &mut self.indices
    }

    /// Check that every index in `[0, len)` appears exactly once
    pub fn is_bijection(&self) -> bool {
        bijection_defect(&self.indices).is_none()
    }
}

/// Describe the first reason `indices` is not a permutation of `[0, len)`.
pub fn bijection_defect(indices: &[u32]) -> Option<String> {
    let mut seen = vec![false; indices.len()];
    for (position, &index) in indices.iter().enumerate() {
        let Some(slot) = seen.get_mut(index as usize) else {
            return Some(format!(
                "index {} at position {} is out of range for {} elements",
                index,
                position,
                indices.len()
            ));
        };
        if *slot {
            return Some(format!("index {} appears twice (again at position {})", index, position));
        }
        *slot = true;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let perm = IndexPermutation::identity(4).unwrap();
        assert_eq!(perm.as_slice(), &[0, 1, 2, 3]);
        assert!(perm.is_bijection());
        assert!(IndexPermutation::identity(0).unwrap().is_empty());
    }

    #[test]
    fn test_swaps_keep_bijection() {
        let mut perm = IndexPermutation::identity(3).unwrap();
        perm.as_mut_slice().swap(0, 2);
        assert_eq!(perm.as_slice(), &[2, 1, 0]);
        assert!(perm.is_bijection());
    }

    #[test]
    fn test_defects_are_described() {
        assert!(bijection_defect(&[0, 0, 1]).unwrap().contains("twice"));
        assert!(bijection_defect(&[0, 3, 1]).unwrap().contains("out of range"));
        assert!(bijection_defect(&[2, 0, 1]).is_none());
    }
}
