//! # Umbra
//!
//! **A small deferred renderer with directional shadow mapping, built on wgpu.**
//!
//! Every frame renders each object twice, once into a shadow map from the
//! light's point of view and once into a five-attachment g-buffer. An
//! optional cubemap sky fills the g-buffer background, and a full-screen
//! lighting pass shades the result into the output.
//!
//! ## Quick Start
//!
//! ```no_run
//! use umbra::*;
//!
//! # fn frame(gpu: &GpuContext, view: &wgpu::TextureView) -> Result<(), RenderError> {
//! let config = RendererConfig::default();
//! let mut renderer = DeferredRenderer::new(gpu, 960, 540, &config)?;
//!
//! let geometry = Shader::builtin(gpu, ShaderKind::Geometry);
//! let shadow = Shader::builtin(gpu, ShaderKind::Shadow);
//! let screen = Shader::builtin(gpu, ShaderKind::Screen);
//!
//! let sphere = Mesh::sphere(gpu, 32, 16);
//! let quad = Mesh::fullscreen_quad(gpu);
//! let wall = Texture::new(gpu, &TextureData::checker(256, 8, [200; 4], [90; 4]), "wall");
//!
//! let mut camera = Camera::new(960, 540, 0.1, 100.0);
//! camera.transform.position = Vec3::new(0.0, 1.0, -5.0);
//! camera.update();
//!
//! let material = MaterialInstance::new(&geometry, MaterialUniforms { tiling: Vec2::splat(2.0) });
//! let lighting = LightingInstance::with_defaults(&screen);
//! let light_space = light_space_matrix(Vec3::new(1.0, 1.2, 0.3), 25.0, -10.0, 40.0);
//! let transform = Transform::new();
//!
//! let mut frame = renderer.begin(gpu);
//! frame.render(&camera, &RenderData {
//!     transform: &transform,
//!     mesh: &sphere,
//!     texture: &wall,
//!     material: &material,
//!     shadow_shader: &shadow,
//!     light_space_matrix: light_space,
//! })?;
//! frame.light(&lighting, &quad, view)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`renderer`]: [`DeferredRenderer`] and the [`Frame`] protocol
//! - [`shader`]: shaders, uniform slots and shader instances
//! - [`framebuffer`]: [`GBuffer`] and [`ShadowBuffer`]
//! - meshes, textures, cubemaps, transforms and the camera at the crate root

mod camera;
mod config;
mod error;
pub mod framebuffer;
mod geometry;
mod gpu;
mod input;
mod lighting;
mod logging;
mod mesh;
mod registry;
pub mod renderer;
pub mod shader;
mod texture;
mod transform;

pub use camera::{Camera, FOV_Y, RESIZE_FAR, RESIZE_NEAR};
pub use config::{
    CameraConfig, GBufferConfig, LightingConfig, RendererConfig, ShadowConfig, WindowConfig,
};
pub use error::{ConfigError, RenderError};
pub use framebuffer::{FramebufferLayout, GBuffer, GBufferAttachment, ShadowBuffer};
pub use geometry::RawGeometry;
pub use gpu::GpuContext;
pub use input::{CameraControls, Input};
pub use lighting::{light_space_matrix, luminance, shade, shadow_projection};
pub use logging::{LoggingConfig, init_logging};
pub use mesh::{Mesh, Vertex};
pub use registry::{CubemapId, MeshId, Renderable, ResourceRegistry, ShaderId, TextureId};
pub use renderer::{DeferredRenderer, Frame, FrameOp, FramePhase, RenderData, Skybox};
pub use shader::{
    LightingInstance, LightingUniforms, MaterialInstance, MaterialUniforms, Shader,
    ShaderInstance, ShaderKind, SkyInstance, SkyUniforms, Uniform, UniformValue,
};
pub use texture::{CUBE_FACES, Cubemap, Texture, TextureData};
pub use transform::Transform;

// Re-export glam math types for convenience
pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

// ECS support
pub use hecs::{Entity, World};
