//! Directional light helpers.
//!
//! [`light_space_matrix`] builds the projection the shadow pass renders with.
//! [`shade`] is the lighting pass equation evaluated on the CPU; the screen
//! shader computes the same thing per pixel.

use glam::{Mat4, Vec3, Vec4};

use crate::config::{LightingConfig, ShadowConfig};
use crate::shader::LightingUniforms;

/// Orthographic light projection looking from `light_position` at the origin.
///
/// The view covers `[-extent, extent]` on both axes and `near..far` along the
/// light direction.
pub fn light_space_matrix(light_position: Vec3, extent: f32, near: f32, far: f32) -> Mat4 {
    // Looking straight down the Y axis leaves Y unusable as the up vector.
    let up = if light_position.normalize_or_zero().cross(Vec3::Y).length_squared() < 1e-6 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let projection = Mat4::orthographic_rh(-extent, extent, -extent, extent, near, far);
    projection * Mat4::look_at_rh(light_position, Vec3::ZERO, up)
}

/// [`light_space_matrix`] with the volume from `config`.
pub fn shadow_projection(light_position: Vec3, config: &ShadowConfig) -> Mat4 {
    light_space_matrix(light_position, config.extent, config.near, config.far)
}

/// Shades one g-buffer sample.
///
/// `normal.w == 0` marks an unlit sample (sky or background), returned as
/// its diffuse color. Otherwise the result is
/// `diffuse * (ambient + intensity * max(n·l, 0) * visibility)`, with the
/// light direction and intensity packed in `directional`.
pub fn shade(diffuse: Vec3, normal: Vec4, directional: Vec4, ambient: f32, visibility: f32) -> Vec3 {
    if normal.w == 0.0 {
        return diffuse;
    }
    let n = normal.truncate().normalize_or_zero();
    let l = directional.truncate().normalize_or_zero();
    diffuse * (ambient + directional.w * n.dot(l).max(0.0) * visibility)
}

/// Relative luminance of a linear RGB color.
pub fn luminance(rgb: Vec3) -> f32 {
    rgb.dot(Vec3::new(0.2126, 0.7152, 0.0722))
}

impl From<&LightingConfig> for LightingUniforms {
    fn from(config: &LightingConfig) -> Self {
        Self {
            directional: Vec4::from_array(config.directional),
            ambient: config.ambient,
            show_shadow_map: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const UP: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);

    #[test]
    fn brighter_light_never_darkens() {
        let diffuse = Vec3::new(0.8, 0.6, 0.4);
        let mut previous = 0.0;
        for step in 0..=10 {
            let intensity = step as f32 * 0.25;
            let light = Vec4::new(0.3, 1.0, 0.2, intensity);
            let l = luminance(shade(diffuse, UP, light, 0.05, 1.0));
            assert!(l >= previous, "{l} < {previous} at intensity {intensity}");
            previous = l;
        }
    }

    #[test]
    fn facing_the_light_is_brightest() {
        let diffuse = Vec3::ONE;
        let light = Vec4::new(0.0, 1.0, 0.0, 1.0);
        let facing = shade(diffuse, UP, light, 0.1, 1.0);
        let grazing = shade(diffuse, Vec4::new(1.0, 1.0, 0.0, 1.0), light, 0.1, 1.0);
        let away = shade(diffuse, Vec4::new(0.0, -1.0, 0.0, 1.0), light, 0.1, 1.0);

        assert_relative_eq!(facing.x, 1.1, epsilon = 1e-6);
        assert!(facing.x > grazing.x && grazing.x > away.x);
        assert_relative_eq!(away.x, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn shadowed_samples_keep_ambient_only() {
        let lit = shade(Vec3::ONE, UP, UP, 0.2, 0.0);
        assert_relative_eq!(lit.y, 0.2, epsilon = 1e-6);
    }

    #[test]
    fn unlit_samples_pass_through() {
        let sky = Vec3::new(0.2, 0.4, 0.9);
        assert_eq!(shade(sky, Vec4::ZERO, UP, 0.0, 0.0), sky);
    }

    #[test]
    fn light_space_maps_origin_inside_depth_range() {
        for light in [Vec3::new(0.0, 10.0, 0.0), Vec3::new(4.0, 10.0, -2.0)] {
            let m = light_space_matrix(light, 25.0, -10.0, 40.0);
            let origin = m.project_point3(Vec3::ZERO);
            assert_relative_eq!(origin.x, 0.0, epsilon = 1e-5);
            assert_relative_eq!(origin.y, 0.0, epsilon = 1e-5);
            assert!((0.0..=1.0).contains(&origin.z), "{origin:?}");
            assert!(m.is_finite());
        }
    }

    #[test]
    fn nearer_the_light_is_shallower() {
        let m = light_space_matrix(Vec3::new(0.0, 10.0, 0.0), 25.0, -10.0, 40.0);
        let high = m.project_point3(Vec3::new(0.0, 2.0, 0.0));
        let low = m.project_point3(Vec3::new(0.0, -2.0, 0.0));
        assert!(high.z < low.z);
    }
}
