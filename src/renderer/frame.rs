use std::marker::PhantomData;

use crate::camera::Camera;
use crate::error::RenderError;
use crate::framebuffer::GBufferAttachment;
use crate::gpu::GpuContext;
use crate::mesh::Mesh;
use crate::shader::{BoundShader, LightingInstance, ShaderKind, SkyInstance, Uniform};

use super::phase::{FrameOp, FramePhase};
use super::{DeferredRenderer, RenderData, Skybox};

/// Which pass a draw belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DrawPass {
    Shadow,
    Geometry,
    Sky,
    Light,
}

impl DrawPass {
    fn kind(self) -> ShaderKind {
        match self {
            DrawPass::Shadow => ShaderKind::Shadow,
            DrawPass::Geometry => ShaderKind::Geometry,
            DrawPass::Sky => ShaderKind::Skybox,
            DrawPass::Light => ShaderKind::Screen,
        }
    }
}

/// A draw ready for encoding: pipeline, mesh and where its uniforms live.
struct DrawRecord<'a> {
    pipeline: &'a wgpu::RenderPipeline,
    mesh: &'a Mesh,
    draw_offset: u32,
    instance_offset: u32,
    textures: Option<wgpu::BindGroup>,
}

/// One frame in flight.
///
/// Created by [`DeferredRenderer::begin`]. Objects are recorded with
/// [`render`](Self::render), the sky with [`sky`](Self::sky), and
/// [`light`](Self::light) encodes all passes and submits them. Operations out
/// of order return [`RenderError::PassOrder`].
///
/// A frame borrows its renderer mutably, so only one can exist at a time,
/// and it never leaves the thread that created it.
pub struct Frame<'a> {
    gpu: &'a GpuContext,
    renderer: &'a mut DeferredRenderer,
    phase: FramePhase,
    shadow_draws: Vec<DrawRecord<'a>>,
    gbuffer_draws: Vec<DrawRecord<'a>>,
    _not_send: PhantomData<*const ()>,
}

impl<'a> Frame<'a> {
    pub(super) fn new(gpu: &'a GpuContext, renderer: &'a mut DeferredRenderer) -> Self {
        renderer.arena.clear();
        Self {
            gpu,
            renderer,
            phase: FramePhase::ShadowPass,
            shadow_draws: Vec::new(),
            gbuffer_draws: Vec::new(),
            _not_send: PhantomData,
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Records one object into the shadow map and the g-buffer.
    pub fn render(&mut self, camera: &Camera, data: &RenderData<'a, '_>) -> Result<(), RenderError> {
        self.phase = self.phase.advance(FrameOp::Render)?;

        let model = data.transform.matrix;
        let light_space = data.light_space_matrix * model;

        let mut shadow = data.shadow_shader.bind();
        shadow.set_uniform(Uniform::TransformLightSpace, light_space);
        if let Some(draw) = self.prepare(DrawPass::Shadow, &shadow, data.mesh, None) {
            self.shadow_draws.push(draw);
        }

        let mut geometry = data.material.bind();
        geometry.set_uniform(Uniform::Transform, camera.projection(data.transform));
        geometry.set_uniform(Uniform::NormalMatrix, model);
        geometry.set_uniform(Uniform::TransformLightSpace, light_space);
        let textures = self.texture_group(ShaderKind::Geometry, &data.texture.bind(0));
        if let Some(draw) = self.prepare(DrawPass::Geometry, &geometry, data.mesh, Some(textures)) {
            self.gbuffer_draws.push(draw);
        }
        Ok(())
    }

    /// Records the skybox behind everything rendered so far.
    pub fn sky(
        &mut self,
        camera: &Camera,
        skybox: &Skybox<'a>,
        instance: &SkyInstance<'a>,
    ) -> Result<(), RenderError> {
        self.phase = self.phase.advance(FrameOp::Sky)?;

        let mut bound = instance.bind();
        bound.set_uniform(Uniform::Transform, camera.sky_projection());

        let next = skybox.next.unwrap_or(skybox.cubemap);
        let mut entries = Vec::with_capacity(4);
        entries.extend(skybox.cubemap.bind(0));
        entries.extend(next.bind(1));
        let textures = self.texture_group(ShaderKind::Skybox, &entries);

        if let Some(draw) = self.prepare(DrawPass::Sky, &bound, skybox.mesh, Some(textures)) {
            self.gbuffer_draws.push(draw);
        }
        Ok(())
    }

    /// Shades the g-buffer into `target` and submits the frame.
    ///
    /// `quad` is drawn with the lighting shader and should cover clip space,
    /// e.g. [`Mesh::fullscreen_quad`]. With
    /// [`debug_buffers`](DeferredRenderer::debug_buffers) set, the shadow map
    /// is shown instead of the lit image.
    pub fn light(
        mut self,
        instance: &LightingInstance<'_>,
        quad: &Mesh,
        target: &wgpu::TextureView,
    ) -> Result<(), RenderError> {
        self.phase = self.phase.advance(FrameOp::Light)?;

        let mut bound = instance.bind();
        if self.renderer.debug_buffers {
            bound.set_uniform(Uniform::DebugShowShadowMap, true);
        }

        let textures = {
            let gbuffer = &self.renderer.gbuffer;
            let mut entries = Vec::with_capacity(12);
            entries.extend(gbuffer.attachment(GBufferAttachment::Position).bind(0));
            entries.extend(gbuffer.attachment(GBufferAttachment::Normal).bind(1));
            entries.extend(gbuffer.attachment(GBufferAttachment::Diffuse).bind(2));
            entries.extend(gbuffer.attachment(GBufferAttachment::DepthColor).bind(3));
            entries.extend(self.renderer.shadow.depth().bind(4));
            entries.extend(gbuffer.attachment(GBufferAttachment::LightSpacePosition).bind(5));
            self.texture_group(ShaderKind::Screen, &entries)
        };
        let light = self.prepare(DrawPass::Light, &bound, quad, Some(textures));

        self.submit(light.as_ref(), target);
        self.phase = FramePhase::Idle;
        Ok(())
    }

    fn texture_group(&self, kind: ShaderKind, entries: &[wgpu::BindGroupEntry<'_>]) -> wgpu::BindGroup {
        let (group, _) = self.gpu.validate(kind.label(), || {
            self.gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(kind.label()),
                layout: self.gpu.layouts.textures(kind),
                entries,
            })
        });
        group
    }

    /// Copies a bound shader's uniforms into the arena. Returns `None` for
    /// draws that cannot run: wrong shader kind, no pipeline, or no indices.
    fn prepare<'s>(
        &mut self,
        pass: DrawPass,
        bound: &BoundShader<'s>,
        mesh: &'s Mesh,
        textures: Option<wgpu::BindGroup>,
    ) -> Option<DrawRecord<'s>> {
        let program = bound.program();
        if program.kind() != pass.kind() {
            log::warn!(
                "{pass:?} draw skipped: shader {} is a {:?} shader",
                program.label(),
                program.kind()
            );
            return None;
        }
        let Some(pipeline) = bound.pipeline() else {
            log::debug!("{pass:?} draw skipped: shader {} has no pipeline", program.label());
            return None;
        };
        if mesh.element_count() == 0 {
            return None;
        }

        let arena = &mut self.renderer.arena;
        Some(DrawRecord {
            pipeline,
            mesh,
            draw_offset: arena.push(&bound.uniforms().draw),
            instance_offset: arena.push(&bound.uniforms().instance),
            textures,
        })
    }

    fn submit(&mut self, light: Option<&DrawRecord<'_>>, target: &wgpu::TextureView) {
        let gpu = self.gpu;
        let renderer = &mut *self.renderer;
        let uniforms = renderer.arena.upload(gpu);
        let empty = &renderer.empty_textures;
        let gbuffer = &renderer.gbuffer;
        let shadow = &renderer.shadow;
        let clear_color = renderer.clear_color;

        gpu.validate("frame", || {
            let mut encoder = gpu
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Deferred Frame Encoder"),
                });

            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Shadow Pass"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(depth_attachment(shadow.depth().view())),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                pass.set_viewport(0.0, 0.0, shadow.width() as f32, shadow.height() as f32, 0.0, 1.0);
                for draw in &self.shadow_draws {
                    encode(&mut pass, uniforms, empty, draw);
                }
            }

            {
                let color_attachments = gbuffer.color_attachments(clear_color);
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Geometry Pass"),
                    color_attachments: &color_attachments,
                    depth_stencil_attachment: Some(depth_attachment(gbuffer.depth().view())),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                pass.set_viewport(0.0, 0.0, gbuffer.width() as f32, gbuffer.height() as f32, 0.0, 1.0);
                for draw in &self.gbuffer_draws {
                    encode(&mut pass, uniforms, empty, draw);
                }
            }

            {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Light Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        depth_slice: None,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(clear_color),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                if let Some(draw) = light {
                    encode(&mut pass, uniforms, empty, draw);
                }
            }

            gpu.queue.submit(std::iter::once(encoder.finish()));
        });

        log::trace!(
            "frame submitted: {} shadow draws, {} g-buffer draws",
            self.shadow_draws.len(),
            self.gbuffer_draws.len()
        );
    }
}

impl Drop for Frame<'_> {
    fn drop(&mut self) {
        if self.phase != FramePhase::Idle {
            log::warn!("frame dropped during {}; nothing was submitted", self.phase);
        }
    }
}

fn depth_attachment(view: &wgpu::TextureView) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(1.0),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    }
}

fn encode(
    pass: &mut wgpu::RenderPass<'_>,
    uniforms: &wgpu::BindGroup,
    empty: &wgpu::BindGroup,
    draw: &DrawRecord<'_>,
) {
    pass.set_pipeline(draw.pipeline);
    pass.set_bind_group(0, uniforms, &[draw.draw_offset]);
    pass.set_bind_group(1, uniforms, &[draw.instance_offset]);
    pass.set_bind_group(2, draw.textures.as_ref().unwrap_or(empty), &[]);
    draw.mesh.bind(pass);
    pass.draw_indexed(0..draw.mesh.element_count(), 0, 0..1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RendererConfig;
    use crate::shader::{MaterialInstance, MaterialUniforms, Shader};
    use crate::texture::{Texture, TextureData};
    use crate::transform::Transform;
    use glam::{Mat4, Vec2};

    fn tiling_bytes(value: f32) -> [u8; 8] {
        let mut bytes = [0; 8];
        bytes[..4].copy_from_slice(&value.to_ne_bytes());
        bytes[4..].copy_from_slice(&value.to_ne_bytes());
        bytes
    }

    #[test]
    fn each_draw_keeps_its_own_instance_values() {
        let Ok(gpu) = GpuContext::headless(64, 64, wgpu::TextureFormat::Rgba8Unorm) else {
            return;
        };
        let mut config = RendererConfig::default();
        config.gbuffer.width = 64;
        config.gbuffer.height = 64;
        config.shadow.width = 64;
        config.shadow.height = 64;
        let mut renderer = DeferredRenderer::new(&gpu, 64, 64, &config).expect("renderer");

        let geometry = Shader::builtin(&gpu, ShaderKind::Geometry);
        let shadow = Shader::builtin(&gpu, ShaderKind::Shadow);
        let mesh = Mesh::cube(&gpu);
        let texture = Texture::new(&gpu, &TextureData::solid([255; 4]), "white");
        let plain = MaterialInstance::new(&geometry, MaterialUniforms { tiling: Vec2::ONE });
        let tiled = MaterialInstance::new(&geometry, MaterialUniforms { tiling: Vec2::splat(4.0) });
        let transform = Transform::new();
        let camera = Camera::new(64, 64, 0.1, 100.0);
        let tiling = geometry.location(Uniform::MaterialTiling).expect("tiling slot");

        let mut frame = renderer.begin(&gpu);
        for material in [&plain, &tiled] {
            let data = RenderData {
                transform: &transform,
                mesh: &mesh,
                texture: &texture,
                material,
                shadow_shader: &shadow,
                light_space_matrix: Mat4::IDENTITY,
            };
            frame.render(&camera, &data).expect("render");
        }

        assert_eq!(frame.gbuffer_draws.len(), 2);
        assert_ne!(
            frame.gbuffer_draws[0].instance_offset,
            frame.gbuffer_draws[1].instance_offset
        );
        let start = tiling.offset as usize;
        let recorded: Vec<&[u8]> = frame
            .gbuffer_draws
            .iter()
            .filter_map(|draw| frame.renderer.arena.block(draw.instance_offset))
            .map(|block| &block[start..start + 8])
            .collect();
        assert_eq!(recorded, [&tiling_bytes(1.0)[..], &tiling_bytes(4.0)[..]]);
    }
}
