//! Bind group layouts shared by every shader of a kind.
//!
//! All pipelines use three groups:
//!
//! | Group | Contents                                     |
//! |-------|----------------------------------------------|
//! | 0     | draw uniform block, dynamic offset           |
//! | 1     | instance uniform block, dynamic offset       |
//! | 2     | texture units of the kind                    |
//!
//! Texture unit `n` occupies bindings `2n` (view) and `2n + 1` (sampler).

use super::ShaderKind;
use super::uniform::UNIFORM_BLOCK_SIZE;

/// One texture + sampler pair a shader kind samples from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureUnit {
    pub name: &'static str,
    pub sample_type: wgpu::TextureSampleType,
    pub dimension: wgpu::TextureViewDimension,
    pub sampler: wgpu::SamplerBindingType,
}

impl TextureUnit {
    const fn color(name: &'static str, dimension: wgpu::TextureViewDimension) -> Self {
        Self {
            name,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            dimension,
            sampler: wgpu::SamplerBindingType::Filtering,
        }
    }

    // G-buffer attachments are read with textureLoad; Rgba32Float is not
    // filterable without an extra feature.
    const fn attachment(name: &'static str) -> Self {
        Self {
            name,
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            dimension: wgpu::TextureViewDimension::D2,
            sampler: wgpu::SamplerBindingType::NonFiltering,
        }
    }

    const fn shadow(name: &'static str) -> Self {
        Self {
            name,
            sample_type: wgpu::TextureSampleType::Depth,
            dimension: wgpu::TextureViewDimension::D2,
            sampler: wgpu::SamplerBindingType::Comparison,
        }
    }
}

const GEOMETRY_UNITS: [TextureUnit; 1] =
    [TextureUnit::color("diffuse", wgpu::TextureViewDimension::D2)];

const SKYBOX_UNITS: [TextureUnit; 2] = [
    TextureUnit::color("sky", wgpu::TextureViewDimension::Cube),
    TextureUnit::color("next sky", wgpu::TextureViewDimension::Cube),
];

const SCREEN_UNITS: [TextureUnit; 6] = [
    TextureUnit::attachment("position"),
    TextureUnit::attachment("normal"),
    TextureUnit::attachment("diffuse"),
    TextureUnit::attachment("depth color"),
    TextureUnit::shadow("shadow depth"),
    TextureUnit::attachment("light-space position"),
];

impl ShaderKind {
    /// Texture units bound in group 2, in unit order.
    pub fn texture_units(self) -> &'static [TextureUnit] {
        match self {
            ShaderKind::Geometry => &GEOMETRY_UNITS,
            ShaderKind::Shadow => &[],
            ShaderKind::Screen => &SCREEN_UNITS,
            ShaderKind::Skybox => &SKYBOX_UNITS,
        }
    }
}

fn texture_entries(units: &[TextureUnit]) -> Vec<wgpu::BindGroupLayoutEntry> {
    units
        .iter()
        .enumerate()
        .flat_map(|(n, unit)| {
            let binding = 2 * n as u32;
            [
                wgpu::BindGroupLayoutEntry {
                    binding,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: unit.sample_type,
                        view_dimension: unit.dimension,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: binding + 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(unit.sampler),
                    count: None,
                },
            ]
        })
        .collect()
}

/// Layouts created once per device and shared by all pipelines.
#[derive(Debug)]
pub struct BindingLayouts {
    /// Used for both group 0 and group 1.
    pub uniforms: wgpu::BindGroupLayout,
    geometry: wgpu::BindGroupLayout,
    shadow: wgpu::BindGroupLayout,
    screen: wgpu::BindGroupLayout,
    skybox: wgpu::BindGroupLayout,
}

impl BindingLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Block Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(UNIFORM_BLOCK_SIZE),
                },
                count: None,
            }],
        });

        let textures = |kind: ShaderKind| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(kind.label()),
                entries: &texture_entries(kind.texture_units()),
            })
        };

        Self {
            uniforms,
            geometry: textures(ShaderKind::Geometry),
            shadow: textures(ShaderKind::Shadow),
            screen: textures(ShaderKind::Screen),
            skybox: textures(ShaderKind::Skybox),
        }
    }

    /// Group 2 layout of `kind`.
    pub fn textures(&self, kind: ShaderKind) -> &wgpu::BindGroupLayout {
        match kind {
            ShaderKind::Geometry => &self.geometry,
            ShaderKind::Shadow => &self.shadow,
            ShaderKind::Screen => &self.screen,
            ShaderKind::Skybox => &self.skybox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_occupy_binding_pairs() {
        let entries = texture_entries(ShaderKind::Screen.texture_units());
        assert_eq!(entries.len(), 12);
        let bindings: Vec<u32> = entries.iter().map(|e| e.binding).collect();
        assert_eq!(bindings, (0..12).collect::<Vec<_>>());

        assert!(matches!(
            entries[8].ty,
            wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Depth,
                ..
            }
        ));
        assert!(matches!(
            entries[9].ty,
            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison)
        ));
    }

    #[test]
    fn shadow_kind_samples_nothing() {
        assert!(texture_entries(ShaderKind::Shadow.texture_units()).is_empty());
    }

    #[test]
    fn skybox_units_are_cubes() {
        assert!(
            ShaderKind::Skybox
                .texture_units()
                .iter()
                .all(|u| u.dimension == wgpu::TextureViewDimension::Cube)
        );
    }
}
