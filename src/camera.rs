//! Perspective camera driven by a [`Transform`].
//!
//! The camera looks along its local +Z axis rotated by the transform's
//! rotation. The view matrix is assembled directly from the derived basis
//! (right, up, forward) rather than through a generic look-at, and the
//! projection uses wgpu's `[0, 1]` depth range.

use glam::{Mat3, Mat4, Quat, Vec3, Vec4};

use crate::transform::Transform;

/// Vertical field of view used by [`Camera::new`] and [`Camera::resize`].
pub const FOV_Y: f32 = std::f32::consts::FRAC_PI_4;

/// Near plane applied by [`Camera::resize`], regardless of the value passed
/// to [`Camera::new`].
pub const RESIZE_NEAR: f32 = 0.05;

/// Far plane applied by [`Camera::resize`].
pub const RESIZE_FAR: f32 = 100.0;

/// A view + projection matrix pair.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub transform: Transform,
    pub proj_matrix: Mat4,
    pub view_matrix: Mat4,
}

impl Camera {
    /// Creates a camera at the origin with a 45° vertical field of view.
    pub fn new(width: u32, height: u32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            transform: Transform::new(),
            proj_matrix: perspective(width, height, near, far),
            view_matrix: Mat4::IDENTITY,
        };
        camera.update();
        camera
    }

    /// Recomputes the transform matrix and the view matrix.
    ///
    /// Call after moving or rotating the camera.
    pub fn update(&mut self) {
        self.transform.update();

        let f = self.forward();
        let s = right_of(f);
        let u = s.cross(f);
        let p = self.transform.position;

        self.view_matrix = Mat4::from_cols(
            Vec4::new(s.x, u.x, -f.x, 0.0),
            Vec4::new(s.y, u.y, -f.y, 0.0),
            Vec4::new(s.z, u.z, -f.z, 0.0),
            Vec4::new(-s.dot(p), -u.dot(p), f.dot(p), 1.0),
        );
    }

    /// Recomputes the projection for a new output size.
    ///
    /// Uses [`RESIZE_NEAR`]/[`RESIZE_FAR`], not the planes given at
    /// construction. A zero width or height is ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.proj_matrix = perspective(width, height, RESIZE_NEAR, RESIZE_FAR);
    }

    /// `proj * view * model.matrix`, computed on every call.
    pub fn projection(&self, model: &Transform) -> Mat4 {
        self.proj_matrix * self.view_matrix * model.matrix
    }

    /// Projection for a skybox drawn around the camera.
    ///
    /// The model matrix is the camera's own transform with its rotation
    /// undone, so the view matrix cancels the translation and the box never
    /// moves relative to the eye.
    pub fn sky_projection(&self) -> Mat4 {
        let unrotate = Mat4::from_mat3(Mat3::from_quat(self.transform.rotation).inverse());
        self.proj_matrix * self.view_matrix * self.transform.matrix * unrotate
    }

    /// Look direction: local +Z rotated into world space.
    pub fn forward(&self) -> Vec3 {
        (self.transform.rotation.inverse() * Vec3::Z).normalize()
    }

    pub fn right(&self) -> Vec3 {
        right_of(self.forward())
    }

    pub fn up(&self) -> Vec3 {
        let f = self.forward();
        right_of(f).cross(f)
    }

    /// Rotates the camera to face `target` and refreshes the view.
    ///
    /// Does nothing if `target` coincides with the camera position.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(direction) = (target - self.transform.position).try_normalize() else {
            return;
        };
        self.transform.rotation = Quat::from_rotation_arc(Vec3::Z, direction).inverse();
        self.update();
    }
}

fn perspective(width: u32, height: u32, near: f32, far: f32) -> Mat4 {
    let aspect = width as f32 / height.max(1) as f32;
    Mat4::perspective_rh(FOV_Y, aspect, near, far)
}

// Straight up or down has no defined right vector; +X keeps the basis usable.
fn right_of(forward: Vec3) -> Vec3 {
    forward.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rotations() -> Vec<Quat> {
        vec![
            Quat::IDENTITY,
            Quat::from_rotation_y(1.1),
            Quat::from_rotation_x(-0.6),
            Quat::from_euler(glam::EulerRot::YXZ, 2.5, 0.4, 0.0),
            Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0).normalize(), 0.9),
        ]
    }

    #[test]
    fn view_basis_is_orthonormal_and_right_handed() {
        for rotation in rotations() {
            let mut camera = Camera::new(800, 600, 0.1, 100.0);
            camera.transform.position = Vec3::new(3.0, -1.0, 7.0);
            camera.transform.rotation = rotation;
            camera.update();

            let basis = Mat3::from_mat4(camera.view_matrix);
            for (i, a) in [basis.x_axis, basis.y_axis, basis.z_axis].iter().enumerate() {
                assert_relative_eq!(a.length(), 1.0, epsilon = 1e-5);
                for b in [basis.x_axis, basis.y_axis, basis.z_axis].iter().skip(i + 1) {
                    assert_relative_eq!(a.dot(*b), 0.0, epsilon = 1e-5);
                }
            }
            assert_relative_eq!(basis.determinant(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn view_maps_position_to_origin_looking_down_negative_z() {
        let mut camera = Camera::new(800, 600, 0.1, 100.0);
        camera.transform.position = Vec3::new(0.0, 1.0, -5.0);
        camera.update();

        let eye = camera.view_matrix.transform_point3(camera.transform.position);
        assert!(eye.abs_diff_eq(Vec3::ZERO, 1e-5));

        let ahead = camera.transform.position + camera.forward() * 2.0;
        let ahead_view = camera.view_matrix.transform_point3(ahead);
        assert!(ahead_view.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-5));
    }

    #[test]
    fn projection_is_proj_view_model() {
        let mut camera = Camera::new(1920, 1080, 0.1, 100.0);
        camera.transform.rotation = Quat::from_rotation_y(0.3);
        camera.update();

        let mut model = Transform::new();
        model.position = Vec3::new(1.0, 2.0, 3.0);
        model.scale = Vec3::splat(0.5);
        model.update();

        assert_eq!(
            camera.projection(&model),
            camera.proj_matrix * camera.view_matrix * model.matrix
        );
    }

    #[test]
    fn resize_uses_fixed_planes() {
        let mut camera = Camera::new(800, 600, 1.0, 10.0);
        camera.resize(1024, 512);
        assert_eq!(
            camera.proj_matrix,
            Mat4::perspective_rh(FOV_Y, 2.0, RESIZE_NEAR, RESIZE_FAR)
        );
    }

    #[test]
    fn minimized_resize_keeps_projection() {
        let mut camera = Camera::new(800, 600, 0.1, 100.0);
        let before = camera.proj_matrix;
        camera.resize(0, 600);
        camera.resize(800, 0);
        assert_eq!(camera.proj_matrix, before);
        assert!(camera.proj_matrix.is_finite());
    }

    #[test]
    fn look_at_points_forward_at_target() {
        let mut camera = Camera::new(800, 600, 0.1, 100.0);
        camera.transform.position = Vec3::new(0.0, 3.0, -3.0);
        camera.look_at(Vec3::ZERO);
        assert!(camera.forward().abs_diff_eq(Vec3::new(0.0, -1.0, 1.0).normalize(), 1e-5));
    }

    #[test]
    fn sky_projection_ignores_camera_translation() {
        let mut a = Camera::new(800, 600, 0.1, 100.0);
        a.transform.rotation = Quat::from_rotation_y(0.8);
        a.update();
        let mut b = a;
        b.transform.position = Vec3::new(40.0, -3.0, 12.0);
        b.update();

        assert!(a.sky_projection().abs_diff_eq(b.sky_projection(), 1e-4));
    }
}
