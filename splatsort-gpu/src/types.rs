//! Host-side mirrors of the shader structs

use bytemuck::{Pod, Zeroable};
use nalgebra::Matrix4;
use splatsort_core::Splat;

/// Splat in std430 layout: each `vec3` starts on a 16-byte boundary.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuSplat {
    pub position: [f32; 3],
    pub _padding0: f32,
    pub scale: [f32; 3],
    pub color: u32,
    pub rotation: u32,
    pub _padding1: [u32; 3],
}

const _: () = assert!(std::mem::size_of::<GpuSplat>() == 48);

impl From<&Splat> for GpuSplat {
    fn from(splat: &Splat) -> Self {
        Self {
            position: splat.position,
            _padding0: 0.0,
            scale: splat.scale,
            color: splat.color,
            rotation: splat.rotation,
            _padding1: [0; 3],
        }
    }
}

/// Per-frame uniform shared by the transform and sort passes
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub count: u32,
    pub _padding: [u32; 3],
}

impl FrameUniform {
    pub fn new(view_proj: &Matrix4<f32>, count: u32) -> Self {
        Self {
            view_proj: (*view_proj).into(),
            count,
            _padding: [0; 3],
        }
    }
}

/// Per-stage uniform carrying the compare pattern
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SortParams {
    pub compare_pattern: u32,
    pub count: u32,
    pub _padding: [u32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;
    use splatsort_core::{Point3f, Vector3f};

    #[test]
    fn test_gpu_splat_copies_fields() {
        let splat = Splat {
            color: 0x11223344,
            rotation: 0x80808080,
            ..Splat::new(Point3f::new(1.0, 2.0, 3.0), Vector3f::new(0.1, 0.2, 0.3))
        };
        let gpu = GpuSplat::from(&splat);
        assert_eq!(gpu.position, [1.0, 2.0, 3.0]);
        assert_eq!(gpu.scale, [0.1, 0.2, 0.3]);
        assert_eq!(gpu.color, 0x11223344);
        assert_eq!(gpu.rotation, 0x80808080);
    }

    #[test]
    fn test_frame_uniform_is_column_major() {
        let m = Matrix4::new_translation(&nalgebra::Vector3::new(4.0, 5.0, 6.0));
        let uniform = FrameUniform::new(&m, 9);
        // WGSL mat4x4 columns: translation lives in the fourth column
        assert_eq!(uniform.view_proj[3], [4.0, 5.0, 6.0, 1.0]);
        assert_eq!(std::mem::size_of::<FrameUniform>(), 80);
        assert_eq!(std::mem::size_of::<SortParams>(), 16);
    }
}
