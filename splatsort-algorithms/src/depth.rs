//! Depth transform stage
//!
//! Projects every splat through the camera's view-projection matrix and keeps
//! one scalar sort key per splat, written at the splat's original index.
//!
//! The key is `-clip.z`. For right-handed perspective and orthographic
//! projections `clip.z` grows with distance from the eye, so sorting keys in
//! ascending order yields farthest-first (back-to-front) drawing order.

use nalgebra::{Matrix4, Vector4};
use rayon::prelude::*;
use splatsort_core::{Error, Result, Splat};

/// Clip-space position of a splat's center
#[inline]
pub fn clip_position(view_proj: &Matrix4<f32>, splat: &Splat) -> Vector4<f32> {
    let [x, y, z] = splat.position;
    view_proj * Vector4::new(x, y, z, 1.0)
}

/// Sort key for a clip-space position; ascending keys are back-to-front.
#[inline]
pub fn depth_key(clip: &Vector4<f32>) -> f32 {
    -clip.z
}

/// Overwrite `depths` with the sort key of each splat.
///
/// Runs in parallel with no dependency between elements.
pub fn transform_depths(splats: &[Splat], view_proj: &Matrix4<f32>, depths: &mut [f32]) -> Result<()> {
    if splats.len() != depths.len() {
        return Err(Error::InvalidData(format!(
            "depth array holds {} entries but {} splats are loaded",
            depths.len(),
            splats.len()
        )));
    }

    depths
        .par_iter_mut()
        .zip(splats.par_iter())
        .for_each(|(depth, splat)| *depth = depth_key(&clip_position(view_proj, splat)));

    Ok(())
}

/// Allocate and fill a depth array for `splats`
pub fn compute_depths(splats: &[Splat], view_proj: &Matrix4<f32>) -> Vec<f32> {
    splats
        .par_iter()
        .map(|splat| depth_key(&clip_position(view_proj, splat)))
        .collect()
}
