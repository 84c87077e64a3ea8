use crate::math::{Mat4, Point3, Vec3, TO_RADIANS};

/// The FOV range the host may dial through. Outside it the projection
/// degenerates (scale → 0 or → ∞).
pub const FOV_MIN_DEGREES: f32 = 0.5;
pub const FOV_MAX_DEGREES: f32 = 179.5;

/// A pinhole camera: a position, a yaw/pitch orientation, and a field of
/// view. [`Camera::update_view`] bakes those into the cached orthonormal
/// basis and camera-to-world matrix the dispatcher reads; `fov_scale` is
/// `tan(fov/2)` so per-pixel ray setup stays a multiply.
///
/// Input handling lives with the host — it adjusts the pose fields and the
/// next frame picks them up.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub origin: Point3,
    pub total_yaw: f32,
    pub total_pitch: f32,
    fov_angle: f32,
    fov_scale: f32,

    pub forward: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    pub camera_to_world: Mat4,
}

impl Camera {
    pub fn new(origin: Point3, fov_degrees: f32) -> Self {
        let mut camera = Self {
            origin,
            total_yaw: 0.0,
            total_pitch: 0.0,
            fov_angle: 0.0,
            fov_scale: 0.0,
            forward: Vec3::unit_z(),
            up: Vec3::unit_y(),
            right: Vec3::unit_x(),
            camera_to_world: Mat4::IDENTITY,
        };
        camera.set_fov(fov_degrees);
        camera.update_view();
        camera
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov_angle
    }

    #[inline(always)]
    pub fn fov_scale(&self) -> f32 {
        self.fov_scale
    }

    /// Clamps into the valid range and refreshes the cached scale.
    pub fn set_fov(&mut self, fov_degrees: f32) {
        self.fov_angle = fov_degrees.clamp(FOV_MIN_DEGREES, FOV_MAX_DEGREES);
        self.fov_scale = (self.fov_angle * TO_RADIANS / 2.0).tan();
    }

    /// Recomputes the forward vector from the accumulated yaw/pitch, then
    /// the right/up basis against world up, then the camera-to-world matrix
    /// `[right | up | forward | origin]`. Called once per frame before any
    /// ray is generated.
    pub fn update_view(&mut self) {
        let rotation = Mat4::rotation_x(self.total_pitch) * Mat4::rotation_y(self.total_yaw);
        self.forward = rotation.transform_vector(Vec3::unit_z()).normalized();

        self.right = Vec3::unit_y().cross(self.forward).normalized();
        self.up = self.forward.cross(self.right).normalized();
        self.camera_to_world = Mat4::from_axes(self.right, self.up, self.forward, self.origin);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fov_scale_is_tangent_of_half_angle() {
        let camera = Camera::new(Point3::zero(), 90.0);
        assert!((camera.fov_scale() - 1.0).abs() < 1e-6);

        let narrow = Camera::new(Point3::zero(), 45.0);
        assert!((narrow.fov_scale() - (22.5f32 * TO_RADIANS).tan()).abs() < 1e-6);
    }

    #[test]
    fn fov_is_clamped_to_the_valid_range() {
        let mut camera = Camera::new(Point3::zero(), 90.0);
        camera.set_fov(500.0);
        assert_eq!(camera.fov_degrees(), FOV_MAX_DEGREES);
        camera.set_fov(-20.0);
        assert_eq!(camera.fov_degrees(), FOV_MIN_DEGREES);
    }

    #[test]
    fn basis_is_orthonormal() {
        let mut camera = Camera::new(Point3::new(1.0, 2.0, 3.0), 60.0);
        camera.total_yaw = 0.7;
        camera.total_pitch = -0.3;
        camera.update_view();

        for v in [camera.right, camera.up, camera.forward] {
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
        assert!(camera.right.dot(camera.up).abs() < 1e-5);
        assert!(camera.up.dot(camera.forward).abs() < 1e-5);
        assert!(camera.forward.dot(camera.right).abs() < 1e-5);
    }

    #[test]
    fn camera_to_world_maps_the_view_axis_onto_forward() {
        let mut camera = Camera::new(Point3::new(0.0, 3.0, -9.0), 90.0);
        camera.total_yaw = 1.1;
        camera.update_view();

        let world = camera.camera_to_world.transform_vector(Vec3::unit_z());
        assert!((world - camera.forward).length() < 1e-5);

        // Points pick up the camera origin as translation.
        let p = camera.camera_to_world.transform_point(Point3::zero());
        assert!((p - camera.origin).length() < 1e-5);
    }

    #[test]
    fn yaw_rotates_the_view_around_world_up() {
        let mut camera = Camera::new(Point3::zero(), 90.0);
        camera.total_yaw = 90.0 * TO_RADIANS;
        camera.update_view();
        assert!((camera.forward - Vec3::unit_x()).length() < 1e-5);
    }
}
