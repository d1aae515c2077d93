//! Resolves uniform slots against parsed WGSL modules.
//!
//! Each shader kind declares which [`Uniform`]s it may use. A slot resolves
//! when one of the shader's modules declares the slot's block at
//! `@group(N) @binding(0)` in the uniform address space, and the block struct
//! has a member at the slot's dotted path with a compatible type. Anything
//! else leaves the slot absent, and writes to it become no-ops.

use super::ShaderKind;
use super::uniform::{UNIFORM_BLOCK_SIZE, Uniform, UniformBlockKind, UniformLocation, UniformType};

/// Resolved location of every uniform slot, `None` when absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UniformTable {
    slots: [Option<UniformLocation>; Uniform::COUNT],
}

impl UniformTable {
    /// Resolves the slots `kind` uses. `modules` are searched in order; the
    /// first module declaring a block wins.
    pub fn resolve(kind: ShaderKind, modules: &[&naga::Module], label: &str) -> Self {
        let mut table = Self::default();
        for &uniform in kind.uniforms() {
            let location = modules
                .iter()
                .find_map(|module| locate(module, uniform.block()).map(|ty| (*module, ty)))
                .and_then(|(module, block_ty)| resolve_member(module, block_ty, uniform));

            match location {
                Some(location) => table.slots[uniform.index()] = Some(location),
                None => log::warn!("No uniform called {} exists in shader {label}", uniform.name()),
            }
        }
        table
    }

    pub fn get(&self, uniform: Uniform) -> Option<UniformLocation> {
        self.slots[uniform.index()]
    }

    /// Number of slots that resolved.
    pub fn resolved(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}

/// Finds the struct type of the uniform block bound at `(group, 0)`.
fn locate(module: &naga::Module, block: UniformBlockKind) -> Option<naga::Handle<naga::Type>> {
    module
        .global_variables
        .iter()
        .find(|(_, var)| {
            var.space == naga::AddressSpace::Uniform
                && var
                    .binding
                    .as_ref()
                    .is_some_and(|b| b.group == block.group() && b.binding == 0)
        })
        .map(|(_, var)| var.ty)
}

fn resolve_member(
    module: &naga::Module,
    block_ty: naga::Handle<naga::Type>,
    uniform: Uniform,
) -> Option<UniformLocation> {
    let mut offset = 0;
    let mut ty = block_ty;
    for part in uniform.name().split('.') {
        let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner else {
            return None;
        };
        let member = members.iter().find(|m| m.name.as_deref() == Some(part))?;
        offset += member.offset;
        ty = member.ty;
    }

    let Some(ty) = uniform_type(&module.types[ty].inner) else {
        log::warn!("uniform {} has a type uniforms cannot be written to", uniform.name());
        return None;
    };
    if !uniform.accepts(ty) {
        log::warn!("uniform {} is declared as {ty:?}", uniform.name());
        return None;
    }
    if u64::from(offset + ty.size()) > UNIFORM_BLOCK_SIZE {
        log::warn!(
            "uniform {} at offset {offset} lies outside the {UNIFORM_BLOCK_SIZE}-byte block",
            uniform.name()
        );
        return None;
    }

    Some(UniformLocation {
        block: uniform.block(),
        offset,
        ty,
    })
}

fn uniform_type(inner: &naga::TypeInner) -> Option<UniformType> {
    use naga::{ScalarKind, TypeInner, VectorSize};

    let is_f32 = |scalar: &naga::Scalar| scalar.kind == ScalarKind::Float && scalar.width == 4;

    match inner {
        TypeInner::Scalar(scalar) if scalar.width == 4 => match scalar.kind {
            ScalarKind::Sint => Some(UniformType::Int),
            ScalarKind::Uint => Some(UniformType::Uint),
            ScalarKind::Float => Some(UniformType::Float),
            _ => None,
        },
        TypeInner::Vector { size, scalar } if is_f32(scalar) => match size {
            VectorSize::Bi => Some(UniformType::Vec2),
            VectorSize::Tri => Some(UniformType::Vec3),
            VectorSize::Quad => Some(UniformType::Vec4),
        },
        TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } if is_f32(scalar) => match (columns, rows) {
            (VectorSize::Tri, VectorSize::Tri) => Some(UniformType::Mat3),
            (VectorSize::Quad, VectorSize::Quad) => Some(UniformType::Mat4),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> naga::Module {
        naga::front::wgsl::parse_str(source).unwrap()
    }

    const SCREEN: &str = r#"
        struct Lighting { directional: vec4<f32>, ambient: f32 }
        struct Debug { show_shadow_map: u32 }
        struct Instance { lighting: Lighting, debug: Debug }
        @group(1) @binding(0) var<uniform> u_instance: Instance;

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return u_instance.lighting.directional * u_instance.lighting.ambient;
        }
    "#;

    #[test]
    fn resolves_nested_members() {
        let module = parse(SCREEN);
        let table = UniformTable::resolve(ShaderKind::Screen, &[&module], "screen");

        let directional = table.get(Uniform::LightingDirectional).unwrap();
        assert_eq!(directional.block, UniformBlockKind::Instance);
        assert_eq!(directional.offset, 0);
        assert_eq!(table.get(Uniform::LightingAmbient).unwrap().offset, 16);
        // Lighting is 32 bytes once rounded to its 16-byte alignment.
        assert_eq!(table.get(Uniform::DebugShowShadowMap).unwrap().offset, 32);
        assert_eq!(table.resolved(), 3);
    }

    #[test]
    fn absent_member_resolves_to_none() {
        let module = parse(
            r#"
            struct Draw { transform: mat4x4<f32> }
            @group(0) @binding(0) var<uniform> u_draw: Draw;

            @vertex
            fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
                return u_draw.transform * vec4<f32>(p, 1.0);
            }
            "#,
        );
        let table = UniformTable::resolve(ShaderKind::Geometry, &[&module], "partial");

        assert!(table.get(Uniform::Transform).is_some());
        assert_eq!(table.get(Uniform::NormalMatrix), None);
        assert_eq!(table.get(Uniform::MaterialTiling), None);
    }

    #[test]
    fn slots_outside_the_kind_stay_absent() {
        let module = parse(SCREEN);
        let table = UniformTable::resolve(ShaderKind::Shadow, &[&module], "shadow");
        assert_eq!(table.resolved(), 0);
    }

    #[test]
    fn mismatched_type_is_absent() {
        let module = parse(
            r#"
            struct Sky { tint: vec3<f32>, transition: f32 }
            @group(1) @binding(0) var<uniform> u_sky: Sky;

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return vec4<f32>(u_sky.tint, u_sky.transition);
            }
            "#,
        );
        let table = UniformTable::resolve(ShaderKind::Skybox, &[&module], "sky");

        assert_eq!(table.get(Uniform::SkyTint), None);
        assert_eq!(table.get(Uniform::SkyTransition).unwrap().offset, 12);
    }

    #[test]
    fn block_must_use_its_group() {
        let module = parse(
            r#"
            struct Instance { tint: vec4<f32> }
            @group(0) @binding(0) var<uniform> u_wrong: Instance;

            @fragment
            fn fs_main() -> @location(0) vec4<f32> {
                return u_wrong.tint;
            }
            "#,
        );
        let table = UniformTable::resolve(ShaderKind::Skybox, &[&module], "sky");
        assert_eq!(table.get(Uniform::SkyTint), None);
    }
}
