//! Uniform slots, values and the CPU-side blocks they are written into.

use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// Size of one uniform block and of one slot in the per-frame arena.
///
/// Equal to the default `min_uniform_buffer_offset_alignment`, so every block
/// can be addressed with a dynamic offset.
pub const UNIFORM_BLOCK_SIZE: u64 = 256;

/// Which of the two uniform blocks a slot lives in.
///
/// The draw block (`@group(0) @binding(0)`) carries per-draw matrices set by
/// the renderer. The instance block (`@group(1) @binding(0)`) carries the
/// values a [`ShaderInstance`](crate::ShaderInstance) pushes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformBlockKind {
    Draw,
    Instance,
}

impl UniformBlockKind {
    /// Bind group index the block is declared at.
    pub fn group(self) -> u32 {
        match self {
            UniformBlockKind::Draw => 0,
            UniformBlockKind::Instance => 1,
        }
    }
}

/// Every uniform any built-in shader kind knows about.
///
/// The WGSL name is a member path inside the slot's block struct; nested
/// structs are addressed with dots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Uniform {
    Transform,
    NormalMatrix,
    TransformLightSpace,
    MaterialTiling,
    LightingDirectional,
    LightingAmbient,
    DebugShowShadowMap,
    SkyTint,
    SkyTransition,
}

impl Uniform {
    pub const COUNT: usize = 9;

    pub const ALL: [Uniform; Self::COUNT] = [
        Uniform::Transform,
        Uniform::NormalMatrix,
        Uniform::TransformLightSpace,
        Uniform::MaterialTiling,
        Uniform::LightingDirectional,
        Uniform::LightingAmbient,
        Uniform::DebugShowShadowMap,
        Uniform::SkyTint,
        Uniform::SkyTransition,
    ];

    /// Member path in the block struct.
    pub fn name(self) -> &'static str {
        match self {
            Uniform::Transform => "transform",
            Uniform::NormalMatrix => "normal_matrix",
            Uniform::TransformLightSpace => "transform_light_space",
            Uniform::MaterialTiling => "material.tiling",
            Uniform::LightingDirectional => "lighting.directional",
            Uniform::LightingAmbient => "lighting.ambient",
            Uniform::DebugShowShadowMap => "debug.show_shadow_map",
            Uniform::SkyTint => "tint",
            Uniform::SkyTransition => "transition",
        }
    }

    pub fn block(self) -> UniformBlockKind {
        match self {
            Uniform::Transform | Uniform::NormalMatrix | Uniform::TransformLightSpace => {
                UniformBlockKind::Draw
            }
            _ => UniformBlockKind::Instance,
        }
    }

    /// Whether a member declared with type `ty` can hold this slot.
    pub fn accepts(self, ty: UniformType) -> bool {
        match self {
            Uniform::Transform | Uniform::NormalMatrix | Uniform::TransformLightSpace => {
                ty == UniformType::Mat4
            }
            Uniform::MaterialTiling => ty == UniformType::Vec2,
            Uniform::LightingDirectional | Uniform::SkyTint => ty == UniformType::Vec4,
            Uniform::LightingAmbient | Uniform::SkyTransition => ty == UniformType::Float,
            Uniform::DebugShowShadowMap => matches!(ty, UniformType::Int | UniformType::Uint),
        }
    }

    /// Value a freshly linked shader starts with.
    pub fn default_value(self) -> UniformValue {
        match self {
            Uniform::Transform | Uniform::NormalMatrix | Uniform::TransformLightSpace => {
                UniformValue::Mat4(Mat4::IDENTITY)
            }
            Uniform::MaterialTiling => UniformValue::Vec2(Vec2::ONE),
            Uniform::LightingDirectional => UniformValue::Vec4(Vec4::new(0.0, 1.0, 0.0, 1.0)),
            Uniform::LightingAmbient => UniformValue::Float(0.2),
            Uniform::DebugShowShadowMap => UniformValue::Bool(false),
            Uniform::SkyTint => UniformValue::Vec4(Vec4::ONE),
            Uniform::SkyTransition => UniformValue::Float(0.0),
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Host-shareable member types a uniform slot can resolve to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformType {
    Int,
    Uint,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat3,
    Mat4,
}

impl UniformType {
    /// Bytes occupied in a uniform block (mat3 columns are padded to 16).
    pub fn size(self) -> u32 {
        match self {
            UniformType::Int | UniformType::Uint | UniformType::Float => 4,
            UniformType::Vec2 => 8,
            UniformType::Vec3 => 12,
            UniformType::Vec4 => 16,
            UniformType::Mat3 => 48,
            UniformType::Mat4 => 64,
        }
    }
}

/// Where a resolved uniform lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformLocation {
    pub block: UniformBlockKind,
    /// Byte offset inside the block.
    pub offset: u32,
    pub ty: UniformType,
}

/// A typed value for a uniform upload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    /// Stored as a 32-bit integer, 1 or 0.
    Bool(bool),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    /// Stored as a vec4 `(x, y, z, w)`.
    Quat(Quat),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    /// Whether this value can be written into a member of type `ty`.
    pub fn fits(&self, ty: UniformType) -> bool {
        match self {
            UniformValue::Int(_) | UniformValue::Bool(_) => {
                matches!(ty, UniformType::Int | UniformType::Uint)
            }
            UniformValue::Float(_) => ty == UniformType::Float,
            UniformValue::Vec2(_) => ty == UniformType::Vec2,
            UniformValue::Vec3(_) => ty == UniformType::Vec3,
            UniformValue::Vec4(_) | UniformValue::Quat(_) => ty == UniformType::Vec4,
            UniformValue::Mat3(_) => ty == UniformType::Mat3,
            UniformValue::Mat4(_) => ty == UniformType::Mat4,
        }
    }

    /// Bytes spanned when written, including mat3 column padding but not
    /// the padding after the last column.
    pub fn extent(&self) -> u32 {
        match self {
            UniformValue::Int(_) | UniformValue::Bool(_) | UniformValue::Float(_) => 4,
            UniformValue::Vec2(_) => 8,
            UniformValue::Vec3(_) => 12,
            UniformValue::Vec4(_) | UniformValue::Quat(_) => 16,
            UniformValue::Mat3(_) => 44,
            UniformValue::Mat4(_) => 64,
        }
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::Bool(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Quat> for UniformValue {
    fn from(v: Quat) -> Self {
        UniformValue::Quat(v)
    }
}

impl From<Mat3> for UniformValue {
    fn from(v: Mat3) -> Self {
        UniformValue::Mat3(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

/// One uniform block's bytes, laid out as the shader declared it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct UniformBlock([u8; UNIFORM_BLOCK_SIZE as usize]);

impl Default for UniformBlock {
    fn default() -> Self {
        Self([0; UNIFORM_BLOCK_SIZE as usize])
    }
}

impl std::fmt::Debug for UniformBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.0.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        f.debug_struct("UniformBlock").field("used", &used).finish()
    }
}

impl UniformBlock {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Reads `N` bytes at `offset`, e.g. to inspect a written value.
    pub fn read<const N: usize>(&self, offset: u32) -> Option<[u8; N]> {
        let start = offset as usize;
        self.0.get(start..start + N)?.try_into().ok()
    }

    /// Writes `value` at `offset`. A value that does not fit entirely is
    /// dropped and the block is left untouched.
    pub fn write(&mut self, offset: u32, value: &UniformValue) {
        if u64::from(offset) + u64::from(value.extent()) > UNIFORM_BLOCK_SIZE {
            log::warn!(
                "uniform write of {} bytes at offset {offset} exceeds the {UNIFORM_BLOCK_SIZE}-byte block",
                value.extent()
            );
            return;
        }
        match value {
            UniformValue::Int(v) => self.put(offset, bytemuck::bytes_of(v)),
            UniformValue::Bool(v) => self.put(offset, bytemuck::bytes_of(&u32::from(*v))),
            UniformValue::Float(v) => self.put(offset, bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => self.put(offset, bytemuck::bytes_of(&v.to_array())),
            UniformValue::Vec3(v) => self.put(offset, bytemuck::bytes_of(&v.to_array())),
            UniformValue::Vec4(v) => self.put(offset, bytemuck::bytes_of(&v.to_array())),
            UniformValue::Quat(v) => self.put(offset, bytemuck::bytes_of(&v.to_array())),
            UniformValue::Mat3(m) => {
                for (i, column) in m.to_cols_array_2d().iter().enumerate() {
                    self.put(offset + 16 * i as u32, bytemuck::bytes_of(column));
                }
            }
            UniformValue::Mat4(m) => self.put(offset, bytemuck::bytes_of(&m.to_cols_array())),
        }
    }

    fn put(&mut self, offset: u32, bytes: &[u8]) {
        let start = offset as usize;
        if let Some(dst) = self.0.get_mut(start..start + bytes.len()) {
            dst.copy_from_slice(bytes);
        }
    }
}

/// The uniform state of a program: its draw and instance blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Uniforms {
    pub draw: UniformBlock,
    pub instance: UniformBlock,
}

impl Uniforms {
    pub fn block(&self, kind: UniformBlockKind) -> &UniformBlock {
        match kind {
            UniformBlockKind::Draw => &self.draw,
            UniformBlockKind::Instance => &self.instance,
        }
    }

    pub fn block_mut(&mut self, kind: UniformBlockKind) -> &mut UniformBlock {
        match kind {
            UniformBlockKind::Draw => &mut self.draw,
            UniformBlockKind::Instance => &mut self.instance,
        }
    }
}
