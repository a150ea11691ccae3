//! Splat element type and packed attribute decoding

use bytemuck::{Pod, Zeroable};
use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// Size in bytes of one splat record, on disk and in [`Splat`].
pub const SPLAT_RECORD_SIZE: usize = 32;

/// One renderable splat.
///
/// The layout matches the on-disk record exactly: position, scale, packed
/// RGBA color and a packed orientation quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Splat {
    pub position: [f32; 3],
    pub scale: [f32; 3],
    /// RGBA, one byte per channel, red in the lowest byte.
    pub color: u32,
    /// Quaternion as four bytes (w, x, y, z from the lowest byte), each
    /// mapped from `[0, 255]` to roughly `[-1, 1]`.
    pub rotation: u32,
}

const _: () = assert!(std::mem::size_of::<Splat>() == SPLAT_RECORD_SIZE);

impl Splat {
    /// Create a splat from its position and scale with white color and identity orientation
    pub fn new(position: Point3f, scale: Vector3f) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            scale: [scale.x, scale.y, scale.z],
            color: u32::MAX,
            rotation: pack_rotation(&UnitQuaternion::identity()),
        }
    }

    pub fn position(&self) -> Point3f {
        Point3f::new(self.position[0], self.position[1], self.position[2])
    }

    pub fn scale(&self) -> Vector3f {
        Vector3f::new(self.scale[0], self.scale[1], self.scale[2])
    }

    /// Color as `[r, g, b, a]` bytes
    pub fn rgba(&self) -> [u8; 4] {
        self.color.to_le_bytes()
    }

    /// Decode the packed orientation into a unit quaternion
    pub fn orientation(&self) -> UnitQuaternion<f32> {
        let [w, x, y, z] = self.rotation.to_le_bytes().map(|b| (b as f32 - 128.0) / 128.0);
        UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z))
    }
}

impl Default for Splat {
    fn default() -> Self {
        Self::new(Point3f::origin(), Vector3f::new(1.0, 1.0, 1.0))
    }
}

/// Pack RGBA bytes into the splat color encoding
pub fn pack_color(rgba: [u8; 4]) -> u32 {
    u32::from_le_bytes(rgba)
}

/// Pack a unit quaternion into the splat orientation encoding
pub fn pack_rotation(rotation: &UnitQuaternion<f32>) -> u32 {
    let q = rotation.quaternion();
    let encode = |v: f32| (v * 128.0 + 128.0).round().clamp(0.0, 255.0) as u8;
    u32::from_le_bytes([encode(q.w), encode(q.i), encode(q.j), encode(q.k)])
}
