//! Per-use uniform values layered over a shared [`Shader`].
//!
//! Several instances can share one shader with different values: each
//! [`ShaderInstance::bind`] starts from the shader's defaults and pushes the
//! instance's own values on top.

use glam::{Vec2, Vec4};

use super::ShaderKind;
use super::program::{BoundShader, Shader};
use super::uniform::Uniform;

/// The values one kind of instance pushes when bound.
pub trait InstanceUniforms: Clone + std::fmt::Debug {
    /// Shader kind these values are meant for.
    const KIND: ShaderKind;

    fn push(&self, bound: &mut BoundShader<'_>);
}

/// Geometry pass material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialUniforms {
    /// Texture coordinate scale.
    pub tiling: Vec2,
}

impl Default for MaterialUniforms {
    fn default() -> Self {
        Self { tiling: Vec2::ONE }
    }
}

impl InstanceUniforms for MaterialUniforms {
    const KIND: ShaderKind = ShaderKind::Geometry;

    fn push(&self, bound: &mut BoundShader<'_>) {
        bound.set_uniform(Uniform::MaterialTiling, self.tiling);
    }
}

/// Lighting pass parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightingUniforms {
    /// Direction towards the light in `xyz`, intensity in `w`.
    pub directional: Vec4,
    pub ambient: f32,
    /// Output the shadow map instead of the lit image.
    pub show_shadow_map: bool,
}

impl Default for LightingUniforms {
    fn default() -> Self {
        Self {
            directional: Vec4::new(0.0, 1.0, 0.0, 1.0),
            ambient: 0.2,
            show_shadow_map: false,
        }
    }
}

impl InstanceUniforms for LightingUniforms {
    const KIND: ShaderKind = ShaderKind::Screen;

    fn push(&self, bound: &mut BoundShader<'_>) {
        bound.set_uniform(Uniform::LightingDirectional, self.directional);
        bound.set_uniform(Uniform::LightingAmbient, self.ambient);
        bound.set_uniform(Uniform::DebugShowShadowMap, self.show_shadow_map);
    }
}

/// Skybox tint and the blend towards the second cubemap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkyUniforms {
    pub tint: Vec4,
    /// 0 shows the first cubemap, 1 the second.
    pub transition: f32,
}

impl Default for SkyUniforms {
    fn default() -> Self {
        Self {
            tint: Vec4::ONE,
            transition: 0.0,
        }
    }
}

impl InstanceUniforms for SkyUniforms {
    const KIND: ShaderKind = ShaderKind::Skybox;

    fn push(&self, bound: &mut BoundShader<'_>) {
        bound.set_uniform(Uniform::SkyTint, self.tint);
        bound.set_uniform(Uniform::SkyTransition, self.transition);
    }
}

/// A shader reference plus the values this use of it binds.
#[derive(Clone, Debug)]
pub struct ShaderInstance<'s, U: InstanceUniforms> {
    shader: &'s Shader,
    pub uniforms: U,
}

pub type MaterialInstance<'s> = ShaderInstance<'s, MaterialUniforms>;
pub type LightingInstance<'s> = ShaderInstance<'s, LightingUniforms>;
pub type SkyInstance<'s> = ShaderInstance<'s, SkyUniforms>;

impl<'s, U: InstanceUniforms> ShaderInstance<'s, U> {
    pub fn new(shader: &'s Shader, uniforms: U) -> Self {
        if shader.kind() != U::KIND {
            log::warn!(
                "{:?} instance created over {:?} shader {}",
                U::KIND,
                shader.kind(),
                shader.label()
            );
        }
        Self { shader, uniforms }
    }

    pub fn shader(&self) -> &'s Shader {
        self.shader
    }

    /// Binds the shader and pushes this instance's values.
    pub fn bind(&self) -> BoundShader<'s> {
        let mut bound = self.shader.bind();
        self.uniforms.push(&mut bound);
        bound
    }
}

impl<'s, U: InstanceUniforms + Default> ShaderInstance<'s, U> {
    pub fn with_defaults(shader: &'s Shader) -> Self {
        Self::new(shader, U::default())
    }
}
