//! Splat set container

use crate::splat::{Point3f, Splat};
use std::ops::Index;

/// An ordered, contiguous set of splats.
///
/// The set is immutable once built; loading a new dataset replaces it
/// wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplatSet {
    splats: Vec<Splat>,
}

impl SplatSet {
    /// Create a new empty splat set
    pub fn new() -> Self {
        Self { splats: Vec::new() }
    }

    /// Create a splat set from a vector of splats
    pub fn from_splats(splats: Vec<Splat>) -> Self {
        Self { splats }
    }

    /// Get the number of splats in the set
    pub fn len(&self) -> usize {
        self.splats.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.splats.is_empty()
    }

    pub fn as_slice(&self) -> &[Splat] {
        &self.splats
    }

    /// Get an iterator over the splats
    pub fn iter(&self) -> std::slice::Iter<'_, Splat> {
        self.splats.iter()
    }

    /// Mean position of all splats, or the origin for an empty set
    pub fn centroid(&self) -> Point3f {
        if self.splats.is_empty() {
            return Point3f::origin();
        }
        let sum = self
            .splats
            .iter()
            .fold(nalgebra::Vector3::<f64>::zeros(), |acc, s| {
                acc + nalgebra::Vector3::new(s.position[0] as f64, s.position[1] as f64, s.position[2] as f64)
            });
        let mean = sum / self.splats.len() as f64;
        Point3f::new(mean.x as f32, mean.y as f32, mean.z as f32)
    }
}

impl Index<usize> for SplatSet {
    type Output = Splat;

    fn index(&self, index: usize) -> &Self::Output {
        &self.splats[index]
    }
}

impl<'a> IntoIterator for &'a SplatSet {
    type Item = &'a Splat;
    type IntoIter = std::slice::Iter<'a, Splat>;

    fn into_iter(self) -> Self::IntoIter {
        self.splats.iter()
    }
}

impl FromIterator<Splat> for SplatSet {
    fn from_iter<I: IntoIterator<Item = Splat>>(iter: I) -> Self {
        Self {
            splats: Vec::from_iter(iter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splat::Vector3f;
    use approx::assert_relative_eq;

    #[test]
    fn test_centroid() {
        let set: SplatSet = [
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(2.0, 0.0, 0.0),
            Point3f::new(1.0, 3.0, -6.0),
        ]
        .into_iter()
        .map(|p| Splat::new(p, Vector3f::new(1.0, 1.0, 1.0)))
        .collect();

        let c = set.centroid();
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 1.0);
        assert_relative_eq!(c.z, -2.0);
    }

    #[test]
    fn test_empty_centroid_is_origin() {
        assert_eq!(SplatSet::new().centroid(), Point3f::origin());
    }
}
