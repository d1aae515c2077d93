//! Error types.
//!
//! Most failures in the renderer are soft: shader compile errors, missing
//! uniforms, missing texture data and driver validation errors are logged and
//! rendering carries on. The variants here cover the few conditions that stop
//! a caller: no usable GPU, an unusable offscreen target, or a frame driven out
//! of order.

use crate::renderer::{FrameOp, FramePhase};

/// Errors surfaced by the renderer.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// No adapter matched the request (no GPU, or no backend compatible with the surface).
    #[error("no suitable GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    /// The adapter refused to create a device.
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    /// The window surface could not be created.
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// The surface could not hand out a texture for this frame.
    #[error("failed to acquire surface texture: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    /// An offscreen target failed its completeness check.
    #[error("{target} framebuffer not complete: {reason}")]
    FramebufferIncomplete {
        /// Which target failed ("gbuffer", "shadow").
        target: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A frame operation was called in the wrong phase.
    #[error("`{op}` is not allowed during {phase}")]
    PassOrder {
        /// The operation that was attempted.
        op: FrameOp,
        /// The phase the frame was in.
        phase: FramePhase,
    },
}

/// Errors from loading or saving a [`RendererConfig`](crate::RendererConfig).
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
