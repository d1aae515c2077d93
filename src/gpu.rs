//! GPU context and device management.
//!
//! [`GpuContext`] owns the wgpu device and queue, the optional window surface,
//! and the bind group layouts every shader and pass shares. It is created once
//! and passed by reference to everything that allocates GPU resources.
//!
//! Two constructors exist: [`GpuContext::new`] for a window, and
//! [`GpuContext::headless`] which renders into offscreen textures only (tests,
//! tools). Both request the adapter's color-attachment byte budget, since the
//! five-target g-buffer is larger than the WebGPU default allows.

use std::sync::Arc;

use winit::window::Window;

use crate::error::RenderError;
use crate::shader::BindingLayouts;

/// Core GPU context holding wgpu resources.
///
/// All fields are public to allow direct access to wgpu APIs when needed.
pub struct GpuContext {
    /// Window surface. `None` for a headless context.
    pub surface: Option<wgpu::Surface<'static>>,
    /// The logical GPU device for creating resources and pipelines.
    pub device: wgpu::Device,
    /// The command queue for submitting work to the GPU.
    pub queue: wgpu::Queue,
    /// Output configuration. For a headless context this only records the
    /// size and format that the lighting pass targets.
    pub config: wgpu::SurfaceConfiguration,
    /// Bind group layouts shared by all shaders.
    pub layouts: BindingLayouts,
}

impl GpuContext {
    /// Creates a context that presents to `window`.
    ///
    /// Picks an sRGB surface format when one is available and configures Fifo
    /// presentation.
    pub fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = request_device(&adapter)?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        log::info!(
            "gpu: {} ({:?}), surface {:?} {}x{}",
            adapter.get_info().name,
            adapter.get_info().backend,
            config.format,
            config.width,
            config.height
        );

        let layouts = BindingLayouts::new(&device);
        Ok(Self {
            surface: Some(surface),
            device,
            queue,
            config,
            layouts,
        })
    }

    /// Creates a context without a window.
    ///
    /// The lighting pass of a headless context targets `format`; the caller
    /// supplies the texture it renders into.
    pub fn headless(
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = request_device(&adapter)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        log::info!(
            "gpu: {} ({:?}), headless {:?} {}x{}",
            adapter.get_info().name,
            adapter.get_info().backend,
            format,
            config.width,
            config.height
        );

        let layouts = BindingLayouts::new(&device);
        Ok(Self {
            surface: None,
            device,
            queue,
            config,
            layouts,
        })
    }

    /// Resize the surface to new dimensions.
    ///
    /// Ignores zero-sized dimensions, which occur while a window is minimized.
    /// Offscreen targets (g-buffer, shadow map) are fixed-size and unaffected.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            if let Some(surface) = &self.surface {
                surface.configure(&self.device, &self.config);
            }
        }
    }

    /// Returns the current output width in pixels.
    pub fn width(&self) -> u32 {
        self.config.width
    }

    /// Returns the current output height in pixels.
    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// The device limits in effect.
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Runs `f` inside a validation error scope.
    ///
    /// Any validation error raised by the wgpu calls in `f` is logged under
    /// `label` and returned alongside the result instead of reaching the
    /// device's uncaptured-error handler.
    pub fn validate<T>(&self, label: &str, f: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f();
        let error = pollster::block_on(self.device.pop_error_scope());
        if let Some(error) = &error {
            log::error!("GPU error in {label}: {error}");
        }
        (value, error)
    }
}

fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue), RenderError> {
    let limits = required_limits(&adapter.limits());
    let device = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("umbra device"),
        required_features: wgpu::Features::empty(),
        required_limits: limits,
        memory_hints: Default::default(),
        trace: Default::default(),
        experimental_features: Default::default(),
    }))?;
    Ok(device)
}

/// Default limits with the color-attachment byte budget raised to what the
/// adapter supports.
pub(crate) fn required_limits(adapter: &wgpu::Limits) -> wgpu::Limits {
    let defaults = wgpu::Limits::default();
    wgpu::Limits {
        max_color_attachment_bytes_per_sample: adapter
            .max_color_attachment_bytes_per_sample
            .max(defaults.max_color_attachment_bytes_per_sample),
        ..defaults
    }
}
