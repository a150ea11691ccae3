//! Arcball camera orbiting the loaded dataset

use nalgebra::{Matrix4, Perspective3, Point3, Unit, UnitQuaternion, Vector2, Vector3};

/// Arcball camera parameters
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    /// Initial and reset distance from the orbit center
    pub distance: f32,
    pub min_distance: f32,
    pub up: Vector3<f32>,
    /// Radians per unit of scaled mouse movement
    pub rotate_sensitivity: f32,
    /// Multiplier applied to raw mouse deltas before scaling by frame time
    pub mouse_speed: f32,
    /// Distance change per wheel notch
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: std::f32::consts::FRAC_PI_4,
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
            distance: 5.0,
            min_distance: 0.1,
            up: Vector3::new(0.0, -1.0, 0.0),
            rotate_sensitivity: 0.01,
            mouse_speed: 10.0,
            zoom_speed: 0.2,
        }
    }
}

/// Per-frame input relevant to the camera, as reported by the windowing layer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraInput {
    /// Mouse movement since the last frame, in pixels
    pub mouse_delta: Vector2<f32>,
    /// Whether the rotate button is held
    pub dragging: bool,
    /// Vertical wheel movement since the last frame
    pub wheel_delta: f32,
    pub reset: bool,
}

impl CameraInput {
    pub fn is_idle(&self) -> bool {
        !self.reset && self.wheel_delta == 0.0 && (!self.dragging || self.mouse_delta == Vector2::zeros())
    }
}

/// A camera orbiting `center` at `distance`, oriented by `rotation`
#[derive(Debug, Clone)]
pub struct ArcballCamera {
    pub center: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub distance: f32,
    pub config: CameraConfig,
    position: Point3<f32>,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl ArcballCamera {
    pub fn new(center: Point3<f32>, config: CameraConfig) -> Self {
        let mut camera = Self {
            center,
            rotation: UnitQuaternion::identity(),
            distance: config.distance,
            config,
            position: Point3::origin(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
        };
        camera.update();
        camera
    }

    /// Recompute eye position, view and projection from the orbit state
    pub fn update(&mut self) {
        let offset = self.rotation * Vector3::new(0.0, 0.0, self.distance);
        self.position = self.center + offset;
        self.view = Matrix4::look_at_rh(&self.position, &self.center, &self.config.up);
        self.projection = Perspective3::new(
            self.config.aspect_ratio,
            self.config.fov,
            self.config.near,
            self.config.far,
        )
        .into_inner();
    }

    /// Rotate by a scaled mouse delta: horizontal around `up`, vertical around the camera's right axis.
    pub fn rotate(&mut self, delta: Vector2<f32>) {
        let sensitivity = self.config.rotate_sensitivity;
        let up = Unit::new_normalize(self.config.up);
        let horizontal = UnitQuaternion::from_axis_angle(&up, -delta.x * sensitivity);

        let forward = self.center - self.position;
        let vertical = Unit::try_new(self.config.up.cross(&forward), 1e-6)
            .map(|right| UnitQuaternion::from_axis_angle(&right, -delta.y * sensitivity))
            .unwrap_or_else(UnitQuaternion::identity);

        self.rotation = vertical * (horizontal * self.rotation);
        self.rotation.renormalize();
    }

    pub fn zoom(&mut self, amount: f32) {
        self.distance = (self.distance + amount).max(self.config.min_distance);
    }

    pub fn reset(&mut self) {
        self.rotation = UnitQuaternion::identity();
        self.distance = self.config.distance;
    }

    /// Apply one frame of input and refresh the matrices.
    ///
    /// Returns whether the view changed, which is what decides a re-sort.
    pub fn apply_input(&mut self, input: &CameraInput, dt: f32) -> bool {
        if input.is_idle() {
            return false;
        }
        if input.reset {
            self.reset();
        }
        if input.dragging {
            self.rotate(input.mouse_delta * (self.config.mouse_speed * dt));
        }
        if input.wheel_delta != 0.0 {
            self.zoom(-input.wheel_delta * self.config.zoom_speed);
        }
        self.update();
        true
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    /// Combined projection * view transform
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view
    }
}

impl Default for ArcballCamera {
    fn default() -> Self {
        Self::new(Point3::origin(), CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_eye_position() {
        let camera = ArcballCamera::default();
        let eye = camera.position();
        assert_relative_eq!(eye.z, 5.0, epsilon = 1e-5);
        assert_relative_eq!(eye.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_zoom_clamps_to_min_distance() {
        let mut camera = ArcballCamera::default();
        camera.zoom(-100.0);
        assert_relative_eq!(camera.distance, 0.1);
        camera.reset();
        assert_relative_eq!(camera.distance, 5.0);
    }

    #[test]
    fn test_rotation_keeps_orbit_distance() {
        let mut camera = ArcballCamera::new(Point3::new(1.0, 2.0, 3.0), CameraConfig::default());
        camera.rotate(Vector2::new(40.0, -25.0));
        camera.update();
        let radius = (camera.position() - camera.center).norm();
        assert_relative_eq!(radius, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn test_idle_input_changes_nothing() {
        let mut camera = ArcballCamera::default();
        let before = camera.view_projection();
        let moved = camera.apply_input(
            &CameraInput {
                mouse_delta: Vector2::new(3.0, 1.0),
                dragging: false,
                ..Default::default()
            },
            0.016,
        );
        assert!(!moved);
        assert_eq!(before, camera.view_projection());
    }

    #[test]
    fn test_wheel_input_moves_camera() {
        let mut camera = ArcballCamera::default();
        let moved = camera.apply_input(
            &CameraInput {
                wheel_delta: 1.0,
                ..Default::default()
            },
            0.016,
        );
        assert!(moved);
        assert_relative_eq!(camera.distance, 4.8, epsilon = 1e-5);
    }

    #[test]
    fn test_far_points_have_larger_clip_z() {
        let camera = ArcballCamera::default();
        let vp = camera.view_projection();
        let near = vp * nalgebra::Vector4::new(0.0, 0.0, 2.0, 1.0);
        let far = vp * nalgebra::Vector4::new(0.0, 0.0, -2.0, 1.0);
        assert!(far.z > near.z);
    }
}
