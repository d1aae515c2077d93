use std::fmt;

use crate::error::RenderError;

/// Where a frame is in the shadow → geometry → sky → light sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePhase {
    /// No frame in flight.
    Idle,
    /// Frame begun, nothing recorded yet.
    ShadowPass,
    /// At least one object recorded.
    GeometryPass,
    /// Sky recorded; only the lighting pass may follow.
    SkyPass,
    /// Lighting pass recorded; the frame is being submitted.
    LightPass,
}

/// An operation on a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOp {
    Begin,
    Render,
    Sky,
    Light,
}

impl FramePhase {
    /// The phase after `op`, or [`RenderError::PassOrder`] when `op` is not
    /// allowed now.
    pub fn advance(self, op: FrameOp) -> Result<FramePhase, RenderError> {
        use FrameOp::*;
        use FramePhase::*;

        match (self, op) {
            (Idle, Begin) => Ok(ShadowPass),
            (ShadowPass | GeometryPass, Render) => Ok(GeometryPass),
            (ShadowPass | GeometryPass, Sky) => Ok(SkyPass),
            (ShadowPass | GeometryPass | SkyPass, Light) => Ok(LightPass),
            (phase, op) => Err(RenderError::PassOrder { op, phase }),
        }
    }
}

impl fmt::Display for FramePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FramePhase::Idle => "idle",
            FramePhase::ShadowPass => "the shadow pass",
            FramePhase::GeometryPass => "the geometry pass",
            FramePhase::SkyPass => "the sky pass",
            FramePhase::LightPass => "the light pass",
        })
    }
}

impl fmt::Display for FrameOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FrameOp::Begin => "begin",
            FrameOp::Render => "render",
            FrameOp::Sky => "sky",
            FrameOp::Light => "light",
        })
    }
}
