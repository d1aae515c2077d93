//! Fixed-function state of each shader kind's pass.

use super::ShaderKind;
use crate::framebuffer::{GBUFFER_DEPTH_FORMAT, GBufferAttachment, SHADOW_DEPTH_FORMAT};
use crate::mesh::Vertex;

/// Depth attachment state of a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthState {
    pub format: wgpu::TextureFormat,
    pub compare: wgpu::CompareFunction,
    pub write: bool,
}

/// Everything a pipeline of a given kind fixes besides its shaders.
#[derive(Clone, Debug, PartialEq)]
pub struct PassState {
    pub cull_mode: Option<wgpu::Face>,
    pub depth: Option<DepthState>,
    pub targets: Vec<wgpu::TextureFormat>,
}

impl PassState {
    /// State for `kind`; `output` is the format the lighting pass renders to.
    pub fn for_kind(kind: ShaderKind, output: wgpu::TextureFormat) -> Self {
        let gbuffer_targets = || GBufferAttachment::ALL.iter().map(|a| a.format()).collect();

        match kind {
            ShaderKind::Geometry => Self {
                cull_mode: Some(wgpu::Face::Back),
                depth: Some(DepthState {
                    format: GBUFFER_DEPTH_FORMAT,
                    compare: wgpu::CompareFunction::Less,
                    write: true,
                }),
                targets: gbuffer_targets(),
            },
            ShaderKind::Shadow => Self {
                cull_mode: Some(wgpu::Face::Back),
                depth: Some(DepthState {
                    format: SHADOW_DEPTH_FORMAT,
                    compare: wgpu::CompareFunction::Less,
                    write: true,
                }),
                targets: Vec::new(),
            },
            // Drawn from inside the box at the far plane.
            ShaderKind::Skybox => Self {
                cull_mode: Some(wgpu::Face::Front),
                depth: Some(DepthState {
                    format: GBUFFER_DEPTH_FORMAT,
                    compare: wgpu::CompareFunction::LessEqual,
                    write: false,
                }),
                targets: gbuffer_targets(),
            },
            ShaderKind::Screen => Self {
                cull_mode: None,
                depth: None,
                targets: vec![output],
            },
        }
    }

    pub(crate) fn create_pipeline(
        &self,
        device: &wgpu::Device,
        label: &str,
        layout: &wgpu::PipelineLayout,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
    ) -> wgpu::RenderPipeline {
        let targets: Vec<Option<wgpu::ColorTargetState>> = self
            .targets
            .iter()
            .map(|&format| {
                Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: vertex,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: fragment,
                entry_point: Some("fs_main"),
                targets: &targets,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: self.cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: self.depth.map(|depth| wgpu::DepthStencilState {
                format: depth.format,
                depth_write_enabled: depth.write,
                depth_compare: depth.compare,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    #[test]
    fn geometry_writes_depth_into_all_attachments() {
        let state = PassState::for_kind(ShaderKind::Geometry, OUTPUT);
        assert_eq!(state.cull_mode, Some(wgpu::Face::Back));
        assert_eq!(state.targets.len(), 5);
        let depth = state.depth.unwrap();
        assert_eq!(depth.compare, wgpu::CompareFunction::Less);
        assert!(depth.write);
    }

    #[test]
    fn shadow_is_depth_only() {
        let state = PassState::for_kind(ShaderKind::Shadow, OUTPUT);
        assert!(state.targets.is_empty());
        assert_eq!(state.depth.unwrap().format, SHADOW_DEPTH_FORMAT);
    }

    #[test]
    fn skybox_culls_front_faces_and_passes_at_far_plane() {
        let state = PassState::for_kind(ShaderKind::Skybox, OUTPUT);
        assert_eq!(state.cull_mode, Some(wgpu::Face::Front));
        assert_eq!(
            state.depth.unwrap().compare,
            wgpu::CompareFunction::LessEqual
        );
        assert_eq!(
            state.targets,
            PassState::for_kind(ShaderKind::Geometry, OUTPUT).targets
        );
    }

    #[test]
    fn screen_renders_to_output_without_depth() {
        let state = PassState::for_kind(ShaderKind::Screen, OUTPUT);
        assert_eq!(state.cull_mode, None);
        assert_eq!(state.depth, None);
        assert_eq!(state.targets, vec![OUTPUT]);
    }
}
