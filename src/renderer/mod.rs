//! The deferred renderer.
//!
//! A frame runs four passes:
//!
//! 1. **Shadow**: every object's depth from the light into the [`ShadowBuffer`]
//! 2. **Geometry**: every object's position, normal, color and light-space
//!    position into the [`GBuffer`]
//! 3. **Sky** (optional): a cubemap box behind the geometry, marked unlit
//! 4. **Light**: a full-screen pass shading the g-buffer into the output
//!
//! ```ignore
//! let mut frame = renderer.begin(&gpu);
//! for object in &scene {
//!     frame.render(&camera, &object.render_data())?;
//! }
//! frame.sky(&camera, &skybox, &sky_instance)?;
//! frame.light(&lighting, &quad, &view)?;
//! ```
//!
//! Passes are recorded as the frame is driven and encoded into one command
//! buffer when [`Frame::light`] is called.

mod arena;
mod frame;
mod phase;

pub use arena::UniformArena;
pub use frame::Frame;
pub use phase::{FrameOp, FramePhase};

use glam::Mat4;

use crate::config::RendererConfig;
use crate::error::RenderError;
use crate::framebuffer::{GBuffer, ShadowBuffer};
use crate::gpu::GpuContext;
use crate::mesh::Mesh;
use crate::shader::{MaterialInstance, Shader, ShaderKind};
use crate::texture::{Cubemap, Texture};
use crate::transform::Transform;

/// Everything needed to draw one object in the shadow and geometry passes.
///
/// `'a` covers the resources the frame keeps until submission; the material
/// instance (`'m`) is only read while the object is recorded.
#[derive(Clone, Copy)]
pub struct RenderData<'a, 'm> {
    pub transform: &'m Transform,
    pub mesh: &'a Mesh,
    /// Diffuse texture, bound to texture unit 0.
    pub texture: &'m Texture,
    pub material: &'m MaterialInstance<'a>,
    pub shadow_shader: &'a Shader,
    /// Light projection * light view; see [`light_space_matrix`](crate::light_space_matrix).
    pub light_space_matrix: Mat4,
}

/// A cubemap drawn on a box around the camera.
#[derive(Clone, Copy)]
pub struct Skybox<'a> {
    pub cubemap: &'a Cubemap,
    /// Blended in by the sky instance's `transition`; defaults to `cubemap`.
    pub next: Option<&'a Cubemap>,
    pub mesh: &'a Mesh,
}

/// Owns the offscreen targets and drives frames through them.
pub struct DeferredRenderer {
    /// Output size as last reported through [`resize`](Self::resize).
    ///
    /// Informational only: the lighting pass always covers the whole target
    /// handed to [`Frame::light`], and the offscreen targets keep their
    /// configured size.
    pub width: u32,
    pub height: u32,
    /// Show the shadow map instead of the lit image.
    pub debug_buffers: bool,
    /// Color of the output where neither geometry nor sky was drawn.
    pub clear_color: wgpu::Color,
    gbuffer: GBuffer,
    shadow: ShadowBuffer,
    arena: UniformArena,
    empty_textures: wgpu::BindGroup,
}

impl DeferredRenderer {
    /// Creates the g-buffer and shadow map at the sizes in `config`.
    ///
    /// Fails if either target is incomplete on this device.
    pub fn new(
        gpu: &GpuContext,
        width: u32,
        height: u32,
        config: &RendererConfig,
    ) -> Result<Self, RenderError> {
        let gbuffer = GBuffer::new(gpu, config.gbuffer.width, config.gbuffer.height)?;
        let shadow = ShadowBuffer::new(gpu, config.shadow.width, config.shadow.height)?;

        let empty_textures = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Empty Texture Group"),
            layout: gpu.layouts.textures(ShaderKind::Shadow),
            entries: &[],
        });

        let [r, g, b, a] = config.lighting.clear_color;
        log::info!("deferred renderer: {width}x{height} output");

        Ok(Self {
            width,
            height,
            debug_buffers: config.debug_buffers,
            clear_color: wgpu::Color { r, g, b, a },
            gbuffer,
            shadow,
            arena: UniformArena::new(),
            empty_textures,
        })
    }

    /// Updates the output size. The offscreen targets keep their size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    pub fn shadow_buffer(&self) -> &ShadowBuffer {
        &self.shadow
    }

    /// Starts a frame in the shadow pass.
    pub fn begin<'a>(&'a mut self, gpu: &'a GpuContext) -> Frame<'a> {
        Frame::new(gpu, self)
    }
}
