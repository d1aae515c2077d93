//! Shaders, their uniforms and the instances that parameterize them.
//!
//! A [`Shader`] is a vertex + fragment WGSL pair compiled into a pipeline for
//! one [`ShaderKind`]. The kind fixes the pass state (culling, depth test,
//! color targets), the texture units in group 2 and which [`Uniform`] slots
//! the shader may use.
//!
//! Uniform slots are resolved once at link time by reflecting over the WGSL.
//! A slot the shader does not declare stays absent and writes to it do
//! nothing, so a shader can omit uniforms it has no use for.
//!
//! ```text
//! Shader (defaults) --bind--> BoundShader (per-draw copy) --arena--> GPU
//!        ^
//!        +-- ShaderInstance pushes its values on every bind
//! ```

mod instance;
mod layout;
mod pipeline;
mod program;
mod reflect;
mod uniform;

pub use instance::{
    InstanceUniforms, LightingInstance, LightingUniforms, MaterialInstance, MaterialUniforms,
    ShaderInstance, SkyInstance, SkyUniforms,
};
pub use layout::{BindingLayouts, TextureUnit};
pub use pipeline::{DepthState, PassState};
pub use program::{BoundShader, Program, Shader};
pub use reflect::UniformTable;
pub use uniform::{
    UNIFORM_BLOCK_SIZE, Uniform, UniformBlock, UniformBlockKind, UniformLocation, UniformType,
    UniformValue, Uniforms,
};

/// Which pass a shader is written for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Writes scene geometry into the g-buffer.
    Geometry,
    /// Writes light-space depth into the shadow map.
    Shadow,
    /// Full-screen lighting pass reading the g-buffer.
    Screen,
    /// Cubemap sky written into the g-buffer behind the scene.
    Skybox,
}

/// WGSL source of a built-in shader.
#[derive(Clone, Copy, Debug)]
pub struct ShaderSource {
    pub vertex: &'static str,
    pub fragment: &'static str,
}

const GEOMETRY_UNIFORMS: [Uniform; 4] = [
    Uniform::Transform,
    Uniform::NormalMatrix,
    Uniform::TransformLightSpace,
    Uniform::MaterialTiling,
];

const SCREEN_UNIFORMS: [Uniform; 3] = [
    Uniform::LightingDirectional,
    Uniform::LightingAmbient,
    Uniform::DebugShowShadowMap,
];

const SKYBOX_UNIFORMS: [Uniform; 3] = [Uniform::Transform, Uniform::SkyTint, Uniform::SkyTransition];

impl ShaderKind {
    pub const ALL: [ShaderKind; 4] = [
        ShaderKind::Geometry,
        ShaderKind::Shadow,
        ShaderKind::Screen,
        ShaderKind::Skybox,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShaderKind::Geometry => "geometry",
            ShaderKind::Shadow => "shadow",
            ShaderKind::Screen => "screen",
            ShaderKind::Skybox => "skybox",
        }
    }

    /// Uniform slots shaders of this kind may declare.
    pub fn uniforms(self) -> &'static [Uniform] {
        match self {
            ShaderKind::Geometry => &GEOMETRY_UNIFORMS,
            ShaderKind::Shadow => &[Uniform::TransformLightSpace],
            ShaderKind::Screen => &SCREEN_UNIFORMS,
            ShaderKind::Skybox => &SKYBOX_UNIFORMS,
        }
    }

    pub fn builtin_source(self) -> ShaderSource {
        match self {
            ShaderKind::Geometry => ShaderSource {
                vertex: include_str!("../shaders/geometry.vert.wgsl"),
                fragment: include_str!("../shaders/geometry.frag.wgsl"),
            },
            ShaderKind::Shadow => ShaderSource {
                vertex: include_str!("../shaders/shadow.vert.wgsl"),
                fragment: include_str!("../shaders/shadow.frag.wgsl"),
            },
            ShaderKind::Screen => ShaderSource {
                vertex: include_str!("../shaders/screen.vert.wgsl"),
                fragment: include_str!("../shaders/screen.frag.wgsl"),
            },
            ShaderKind::Skybox => ShaderSource {
                vertex: include_str!("../shaders/skybox.vert.wgsl"),
                fragment: include_str!("../shaders/skybox.frag.wgsl"),
            },
        }
    }
}
