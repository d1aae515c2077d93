//! Offscreen render targets: the g-buffer and the shadow map.
//!
//! Both targets are checked for completeness after creation. A layout whose
//! attachments the device cannot render into, or whose color bytes per
//! sample exceed the device limit, is reported as
//! [`RenderError::FramebufferIncomplete`].

use crate::error::RenderError;
use crate::gpu::GpuContext;
use crate::texture::Texture;

/// Depth format of the g-buffer.
pub const GBUFFER_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth format of the shadow map.
pub const SHADOW_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth16Unorm;

/// The g-buffer's color attachments, in attachment order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GBufferAttachment {
    /// World-space position.
    Position,
    /// World-space normal; `w` is 1 for lit geometry and 0 for sky.
    Normal,
    /// Surface color.
    Diffuse,
    /// Window-space depth replicated into a color.
    DepthColor,
    /// Position in light clip space, for the shadow lookup.
    LightSpacePosition,
}

impl GBufferAttachment {
    pub const ALL: [GBufferAttachment; 5] = [
        GBufferAttachment::Position,
        GBufferAttachment::Normal,
        GBufferAttachment::Diffuse,
        GBufferAttachment::DepthColor,
        GBufferAttachment::LightSpacePosition,
    ];

    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            GBufferAttachment::Position
            | GBufferAttachment::Normal
            | GBufferAttachment::LightSpacePosition => wgpu::TextureFormat::Rgba16Float,
            GBufferAttachment::Diffuse => wgpu::TextureFormat::Rgba8Unorm,
            GBufferAttachment::DepthColor => wgpu::TextureFormat::Rgba32Float,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GBufferAttachment::Position => "gbuffer position",
            GBufferAttachment::Normal => "gbuffer normal",
            GBufferAttachment::Diffuse => "gbuffer diffuse",
            GBufferAttachment::DepthColor => "gbuffer depth color",
            GBufferAttachment::LightSpacePosition => "gbuffer light-space position",
        }
    }
}

/// Attachment formats and size of a render target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramebufferLayout {
    pub width: u32,
    pub height: u32,
    pub color: Vec<wgpu::TextureFormat>,
    pub depth: Option<wgpu::TextureFormat>,
}

impl FramebufferLayout {
    /// Color bytes written per sample, with each attachment aligned to its
    /// component size.
    pub fn color_bytes_per_sample(&self) -> u32 {
        self.color.iter().fold(0, |total, format| {
            let cost = format.target_pixel_byte_cost().unwrap_or(0);
            let align = format.target_component_alignment().unwrap_or(1).max(1);
            total.next_multiple_of(align) + cost
        })
    }

    /// Verifies the layout can be rendered into on a device with `limits`.
    pub fn check(&self, limits: &wgpu::Limits) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("zero-sized target {}x{}", self.width, self.height));
        }
        let max = limits.max_texture_dimension_2d;
        if self.width > max || self.height > max {
            return Err(format!(
                "{}x{} exceeds the {max} texel limit",
                self.width, self.height
            ));
        }
        if self.color.is_empty() && self.depth.is_none() {
            return Err("no attachments".to_string());
        }
        if self.color.len() > limits.max_color_attachments as usize {
            return Err(format!(
                "{} color attachments, device allows {}",
                self.color.len(),
                limits.max_color_attachments
            ));
        }

        for &format in &self.color {
            let renderable = format
                .guaranteed_format_features(wgpu::Features::empty())
                .allowed_usages
                .contains(wgpu::TextureUsages::RENDER_ATTACHMENT);
            if !renderable || format.is_depth_stencil_format() {
                return Err(format!("{format:?} is not a color-renderable format"));
            }
        }
        if let Some(format) = self.depth {
            if !format.is_depth_stencil_format() {
                return Err(format!("{format:?} is not a depth format"));
            }
        }

        let bytes = self.color_bytes_per_sample();
        if bytes > limits.max_color_attachment_bytes_per_sample {
            return Err(format!(
                "{bytes} color bytes per sample, device allows {}",
                limits.max_color_attachment_bytes_per_sample
            ));
        }
        Ok(())
    }
}

/// Runs `create` in a validation scope and checks `layout` afterwards.
fn complete<T>(
    gpu: &GpuContext,
    target: &'static str,
    layout: &FramebufferLayout,
    create: impl FnOnce() -> T,
) -> Result<T, RenderError> {
    let (value, error) = gpu.validate(target, create);
    let incomplete = |reason| RenderError::FramebufferIncomplete { target, reason };

    layout.check(&gpu.limits()).map_err(incomplete)?;
    if let Some(error) = error {
        return Err(incomplete(error.to_string()));
    }
    log::info!(
        "{target}: {}x{}, {} color attachment(s){}",
        layout.width,
        layout.height,
        layout.color.len(),
        if layout.depth.is_some() { " + depth" } else { "" }
    );
    Ok(value)
}

/// The geometry pass target: five color attachments plus depth.
#[derive(Debug)]
pub struct GBuffer {
    attachments: [Texture; 5],
    depth: Texture,
    width: u32,
    height: u32,
}

impl GBuffer {
    pub fn layout(width: u32, height: u32) -> FramebufferLayout {
        FramebufferLayout {
            width,
            height,
            color: GBufferAttachment::ALL.iter().map(|a| a.format()).collect(),
            depth: Some(GBUFFER_DEPTH_FORMAT),
        }
    }

    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Result<Self, RenderError> {
        let layout = Self::layout(width, height);
        let (attachments, depth) = complete(gpu, "gbuffer", &layout, || {
            let attachments = GBufferAttachment::ALL
                .map(|a| Texture::attachment(gpu, a.label(), width, height, a.format()));
            let depth = Texture::attachment(gpu, "gbuffer depth", width, height, GBUFFER_DEPTH_FORMAT);
            (attachments, depth)
        })?;

        Ok(Self {
            attachments,
            depth,
            width,
            height,
        })
    }

    pub fn attachment(&self, attachment: GBufferAttachment) -> &Texture {
        &self.attachments[attachment as usize]
    }

    pub fn depth(&self) -> &Texture {
        &self.depth
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color attachments in attachment order, each cleared on load.
    ///
    /// The diffuse attachment clears to `background`, everything else to
    /// zero. Unlit pixels pass their diffuse color through the lighting
    /// pass, so `background` is what shows where nothing was drawn.
    pub fn color_attachments(
        &self,
        background: wgpu::Color,
    ) -> Vec<Option<wgpu::RenderPassColorAttachment<'_>>> {
        self.attachments
            .iter()
            .zip(GBufferAttachment::ALL)
            .map(|(texture, attachment)| {
                let clear = match attachment {
                    GBufferAttachment::Diffuse => background,
                    _ => wgpu::Color::TRANSPARENT,
                };
                Some(wgpu::RenderPassColorAttachment {
                    view: texture.view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })
            })
            .collect()
    }
}

/// The shadow pass target: a depth attachment and nothing else.
#[derive(Debug)]
pub struct ShadowBuffer {
    depth: Texture,
    width: u32,
    height: u32,
}

impl ShadowBuffer {
    pub fn layout(width: u32, height: u32) -> FramebufferLayout {
        FramebufferLayout {
            width,
            height,
            color: Vec::new(),
            depth: Some(SHADOW_DEPTH_FORMAT),
        }
    }

    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Result<Self, RenderError> {
        let layout = Self::layout(width, height);
        let depth = complete(gpu, "shadow buffer", &layout, || {
            Texture::attachment(gpu, "shadow depth", width, height, SHADOW_DEPTH_FORMAT)
        })?;
        Ok(Self {
            depth,
            width,
            height,
        })
    }

    /// The shadow map, sampled with a comparison sampler.
    pub fn depth(&self) -> &Texture {
        &self.depth
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits_with_bytes(bytes: u32) -> wgpu::Limits {
        wgpu::Limits {
            max_color_attachment_bytes_per_sample: bytes,
            ..wgpu::Limits::default()
        }
    }

    #[test]
    fn gbuffer_layout_has_five_colors_and_depth() {
        let layout = GBuffer::layout(800, 600);
        assert_eq!(layout.color.len(), 5);
        assert_eq!(layout.depth, Some(GBUFFER_DEPTH_FORMAT));
        assert_eq!(layout.color_bytes_per_sample(), 48);
        assert_eq!(layout.check(&limits_with_bytes(64)), Ok(()));
    }

    #[test]
    fn gbuffer_exceeds_default_byte_budget() {
        let err = GBuffer::layout(800, 600)
            .check(&wgpu::Limits::default())
            .unwrap_err();
        assert!(err.contains("48"), "{err}");
    }

    #[test]
    fn shadow_layout_is_depth_only() {
        let layout = ShadowBuffer::layout(960, 540);
        assert!(layout.color.is_empty());
        assert_eq!(layout.depth, Some(SHADOW_DEPTH_FORMAT));
        assert_eq!(layout.check(&wgpu::Limits::default()), Ok(()));
    }

    #[test]
    fn degenerate_layouts_are_incomplete() {
        let limits = limits_with_bytes(64);
        assert!(GBuffer::layout(0, 600).check(&limits).is_err());
        assert!(GBuffer::layout(100_000, 600).check(&limits).is_err());

        let empty = FramebufferLayout {
            width: 4,
            height: 4,
            color: Vec::new(),
            depth: None,
        };
        assert!(empty.check(&limits).is_err());

        let depth_as_color = FramebufferLayout {
            color: vec![wgpu::TextureFormat::Depth32Float],
            ..empty
        };
        assert!(depth_as_color.check(&limits).is_err());
    }
}
