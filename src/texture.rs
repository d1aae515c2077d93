//! Textures and cubemaps.
//!
//! [`TextureData`] is the CPU-side pixel payload an asset loader produces.
//! [`Texture`] covers both uploaded images and the offscreen attachments of
//! the g-buffer and shadow map. [`Cubemap`] holds six square faces for the sky.
//!
//! # Texture units
//!
//! A pass's texture bind group (`@group(2)`) is organized in units: unit `n`
//! is the view at binding `2n` and its sampler at binding `2n + 1`.
//! [`Texture::bind`] and [`Cubemap::bind`] return those two entries.

use std::path::Path;

use image::RgbaImage;

use crate::gpu::GpuContext;

/// Raw pixel data for a texture.
///
/// `data` may be absent; a texture created from such data exists but has
/// undefined contents.
#[derive(Clone, Debug, Default)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    /// Bytes per pixel in `data` (1, 2, 3 or 4).
    pub channels: u32,
    pub data: Option<Vec<u8>>,
}

impl TextureData {
    /// Wraps tightly packed RGBA8 pixels.
    pub fn rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels: 4,
            data: Some(pixels),
        }
    }

    /// A single pixel of the given color.
    pub fn solid(color: [u8; 4]) -> Self {
        Self::rgba(1, 1, color.to_vec())
    }

    /// Decodes an image file into RGBA8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, image::ImageError> {
        let img = image::open(path.as_ref())?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::rgba(width, height, img.into_raw()))
    }

    /// Two-color checkerboard with `cells` squares per side.
    pub fn checker(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = (size / cells.max(1)).max(1);
        let img = RgbaImage::from_fn(size, size, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                image::Rgba(a)
            } else {
                image::Rgba(b)
            }
        });
        Self::rgba(size, size, img.into_raw())
    }

    /// Blocky value noise picking from `palette`, with per-pixel jitter.
    pub fn noise(size: u32, seed: u32, palette: &[[u8; 3]]) -> Self {
        if palette.is_empty() {
            return Self::solid([255, 0, 255, 255]);
        }
        let img = RgbaImage::from_fn(size, size, |x, y| {
            let base = palette[(hash(x, y, seed) % palette.len() as u32) as usize];
            let jitter = (hash(x + 1000, y + 1000, seed) % 30) as i32 - 15;
            let c = |v: u8| (v as i32 + jitter).clamp(0, 255) as u8;
            image::Rgba([c(base[0]), c(base[1]), c(base[2]), 255])
        });
        Self::rgba(size, size, img.into_raw())
    }

    /// Converts the payload to RGBA8.
    ///
    /// Returns `None` when there is no data or its length does not match the
    /// declared size and channel count.
    pub fn to_rgba8(&self) -> Option<RgbaImage> {
        let data = self.data.as_ref()?;
        let pixels = self.width as usize * self.height as usize;
        if self.width == 0 || self.height == 0 || data.len() != pixels * self.channels as usize {
            return None;
        }
        let rgba: Vec<u8> = match self.channels {
            4 => data.clone(),
            3 => data
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            2 => data
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
            1 => data.iter().flat_map(|&l| [l, l, l, 255]).collect(),
            _ => return None,
        };
        RgbaImage::from_raw(self.width, self.height, rgba)
    }
}

/// Mip chain of `base` down to 1x1, largest first.
pub(crate) fn mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let mut levels = vec![base];
    loop {
        let Some(last) = levels.last() else { break };
        let (w, h) = last.dimensions();
        if w == 1 && h == 1 {
            break;
        }
        let next = image::imageops::resize(
            last,
            (w / 2).max(1),
            (h / 2).max(1),
            image::imageops::FilterType::Triangle,
        );
        levels.push(next);
    }
    levels
}

/// A GPU texture with a default view and sampler.
#[derive(Debug)]
pub struct Texture {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Creates a sampled sRGB texture from `data`.
    ///
    /// With pixel data present the full mip chain is generated and uploaded.
    /// Without it, with malformed data, or with a size beyond the device's
    /// texture limit, the texture is created empty and an error is logged.
    pub fn new(gpu: &GpuContext, data: &TextureData, label: &str) -> Self {
        let max = gpu.limits().max_texture_dimension_2d;
        let oversized = data.width > max || data.height > max;
        let (width, height) = if oversized {
            log::error!(
                "texture {label}: {}x{} exceeds the {max}px limit",
                data.width,
                data.height
            );
            (1, 1)
        } else {
            (data.width.max(1), data.height.max(1))
        };
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        let descriptor = |mip_level_count| wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        };

        let image = if oversized { None } else { data.to_rgba8() };
        if image.is_none() && !oversized {
            if data.data.is_some() {
                log::error!(
                    "texture {label}: {} bytes do not match {}x{}x{}",
                    data.data.as_ref().map_or(0, Vec::len),
                    data.width,
                    data.height,
                    data.channels
                );
            } else {
                log::warn!("texture {label}: no image data");
            }
        }

        let (texture, _) = gpu.validate(label, || match image {
            Some(image) => {
                let levels = mip_chain(image);
                let bytes: Vec<u8> = levels.iter().flat_map(|l| l.as_raw().iter().copied()).collect();
                use wgpu::util::DeviceExt;
                gpu.device.create_texture_with_data(
                    &gpu.queue,
                    &descriptor(levels.len() as u32),
                    wgpu::util::TextureDataOrder::LayerMajor,
                    &bytes,
                )
            }
            None => gpu.device.create_texture(&descriptor(1)),
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// Creates a texture that passes render into and later passes read.
    ///
    /// Sampled with nearest filtering; depth formats get a `LessEqual`
    /// comparison sampler for shadow lookups.
    pub fn attachment(
        gpu: &GpuContext,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let compare = format
            .is_depth_stencil_format()
            .then_some(wgpu::CompareFunction::LessEqual);
        let filter = if compare.is_some() {
            wgpu::FilterMode::Linear
        } else {
            wgpu::FilterMode::Nearest
        };
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }

    /// Bind group entries placing this texture on texture unit `unit`.
    pub fn bind(&self, unit: u32) -> [wgpu::BindGroupEntry<'_>; 2] {
        unit_entries(unit, &self.view, &self.sampler)
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }
}

/// Face order of a [`Cubemap`].
pub const CUBE_FACES: [&str; 6] = ["X+", "X-", "Y+", "Y-", "Z+", "Z-"];

/// A six-face cube texture sampled by direction.
#[derive(Debug)]
pub struct Cubemap {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    /// Edge length of each face.
    pub size: u32,
}

impl Cubemap {
    /// Uploads six faces in the order +X, -X, +Y, -Y, +Z, -Z.
    ///
    /// The face size comes from the first usable face. A face that is missing,
    /// malformed, or sized differently is logged and left empty; the other
    /// faces still upload.
    pub fn new(gpu: &GpuContext, faces: [&TextureData; 6], label: &str) -> Self {
        let images: Vec<Option<RgbaImage>> = faces.iter().map(|f| f.to_rgba8()).collect();
        let size = images
            .iter()
            .flatten()
            .map(|img| img.width())
            .next()
            .unwrap_or(1);
        let max = gpu.limits().max_texture_dimension_2d;
        let size = if size > max {
            log::error!("cubemap {label}: {size}px faces exceed the {max}px limit");
            1
        } else {
            size
        };

        let descriptor = wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        };
        let (texture, _) = gpu.validate(label, || gpu.device.create_texture(&descriptor));

        for (layer, (image, name)) in images.iter().zip(CUBE_FACES).enumerate() {
            let Some(image) = image.as_ref().filter(|i| i.dimensions() == (size, size)) else {
                log::error!("bad texture for cubemap {label} face {name}");
                continue;
            };
            gpu.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                image.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * size),
                    rows_per_image: Some(size),
                },
                wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            size,
        }
    }

    /// Bind group entries placing this cubemap on texture unit `unit`.
    pub fn bind(&self, unit: u32) -> [wgpu::BindGroupEntry<'_>; 2] {
        unit_entries(unit, &self.view, &self.sampler)
    }
}

fn unit_entries<'a>(
    unit: u32,
    view: &'a wgpu::TextureView,
    sampler: &'a wgpu::Sampler,
) -> [wgpu::BindGroupEntry<'a>; 2] {
    [
        wgpu::BindGroupEntry {
            binding: unit * 2,
            resource: wgpu::BindingResource::TextureView(view),
        },
        wgpu::BindGroupEntry {
            binding: unit * 2 + 1,
            resource: wgpu::BindingResource::Sampler(sampler),
        },
    ]
}

/// Simple hash function for procedural generation.
fn hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add(x.wrapping_mul(374761393));
    h = h.wrapping_add(y.wrapping_mul(668265263));
    h ^= h >> 13;
    h = h.wrapping_mul(1274126177);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_halves_to_one() {
        let base = RgbaImage::new(8, 2);
        let dims: Vec<(u32, u32)> = mip_chain(base).iter().map(|l| l.dimensions()).collect();
        assert_eq!(dims, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn expands_rgb_to_rgba() {
        let data = TextureData {
            width: 2,
            height: 1,
            channels: 3,
            data: Some(vec![10, 20, 30, 40, 50, 60]),
        };
        let rgba = data.to_rgba8().unwrap();
        assert_eq!(rgba.as_raw(), &vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn rejects_missing_or_short_data() {
        let missing = TextureData {
            width: 4,
            height: 4,
            channels: 4,
            data: None,
        };
        assert!(missing.to_rgba8().is_none());

        let short = TextureData::rgba(4, 4, vec![0; 10]);
        assert!(short.to_rgba8().is_none());
    }

    #[test]
    fn checker_alternates() {
        let data = TextureData::checker(4, 2, [255; 4], [0, 0, 0, 255]);
        let img = data.to_rgba8().unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [255; 4]);
        assert_eq!(img.get_pixel(2, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(2, 2).0, [255; 4]);
    }

    #[test]
    fn noise_is_deterministic() {
        let palette = [[139, 90, 43], [128, 128, 128]];
        let a = TextureData::noise(16, 7, &palette);
        let b = TextureData::noise(16, 7, &palette);
        assert_eq!(a.data, b.data);
        assert_eq!(a.data.as_ref().map(Vec::len), Some(16 * 16 * 4));
    }
}
