//! Position, rotation and scale with a cached model matrix.

use glam::{Mat4, Quat, Vec3};

/// A 3D transformation representing position, rotation, and scale.
///
/// The combined model matrix is stored in [`Transform::matrix`] and is only
/// recomputed by [`Transform::update`]. Mutating a field leaves the matrix
/// stale until then; renderers read `matrix` as-is.
///
/// ```
/// use umbra::{Transform, Vec3, Quat};
///
/// let mut transform = Transform::new()
///     .position(Vec3::new(0.0, 5.0, -10.0))
///     .rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4))
///     .uniform_scale(2.0);
/// transform.update();
/// ```
///
/// # Transformation Order
///
/// `matrix = translate(position) * rotate(rotation) * scale(scale)`: the mesh
/// is scaled around its local origin, then rotated, then moved into place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World-space position (translation).
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Scale factors for each axis.
    pub scale: Vec3,
    /// Model matrix as of the last [`update`](Self::update).
    pub matrix: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            matrix: Mat4::IDENTITY,
        }
    }
}

impl Transform {
    /// Creates an identity transform (origin, no rotation, unit scale).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an updated transform positioned at the given location.
    pub fn from_position(position: Vec3) -> Self {
        Self::new().position(position)
    }

    /// Sets the position and refreshes the matrix.
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self.update();
        self
    }

    /// Sets the rotation and refreshes the matrix.
    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self.update();
        self
    }

    /// Sets per-axis scale and refreshes the matrix.
    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self.update();
        self
    }

    /// Sets the same scale on all axes and refreshes the matrix.
    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self.update();
        self
    }

    /// Recomputes [`matrix`](Self::matrix) from the current fields.
    pub fn update(&mut self) {
        self.matrix = Mat4::from_translation(self.position)
            * Mat4::from_quat(self.rotation)
            * Mat4::from_scale(self.scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn matrix_is_translate_rotate_scale() {
        let cases = [
            (Vec3::ZERO, Quat::IDENTITY, Vec3::ONE),
            (Vec3::new(1.0, -2.0, 3.5), Quat::from_rotation_y(0.7), Vec3::splat(2.0)),
            (
                Vec3::new(-4.0, 0.25, 9.0),
                Quat::from_euler(glam::EulerRot::XYZ, 0.3, -1.2, 2.4),
                Vec3::new(0.5, 3.0, 1.5),
            ),
        ];

        for (position, rotation, scale) in cases {
            let mut t = Transform::new();
            t.position = position;
            t.rotation = rotation;
            t.scale = scale;
            t.update();

            let expected = Mat4::from_scale_rotation_translation(scale, rotation, position);
            assert!(t.matrix.abs_diff_eq(expected, 1e-5));

            let (s, r, p) = t.matrix.to_scale_rotation_translation();
            assert!(s.abs_diff_eq(scale, 1e-4));
            assert!(p.abs_diff_eq(position, 1e-5));
            assert_relative_eq!(r.dot(rotation).abs(), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn matrix_is_stale_until_update() {
        let mut t = Transform::new();
        t.position = Vec3::new(5.0, 0.0, 0.0);
        assert_eq!(t.matrix, Mat4::IDENTITY);

        t.update();
        assert_eq!(t.matrix.w_axis.truncate(), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn builder_updates_matrix() {
        let t = Transform::new().position(Vec3::Y).uniform_scale(3.0);
        assert_eq!(t.matrix.transform_point3(Vec3::X), Vec3::new(3.0, 1.0, 0.0));
    }
}
