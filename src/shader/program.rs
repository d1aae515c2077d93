use super::ShaderKind;
use super::pipeline::PassState;
use super::reflect::UniformTable;
use super::uniform::{Uniform, UniformLocation, UniformValue, Uniforms};
use crate::gpu::GpuContext;

/// The CPU half of a shader: its kind, resolved uniform slots and the
/// uniform values every draw starts from.
#[derive(Clone, Debug)]
pub struct Program {
    kind: ShaderKind,
    label: String,
    table: UniformTable,
    defaults: Uniforms,
}

impl Program {
    /// Builds a program from already parsed stage modules.
    pub fn new(kind: ShaderKind, label: &str, modules: &[&naga::Module]) -> Self {
        let table = UniformTable::resolve(kind, modules, label);
        let mut program = Self {
            kind,
            label: label.to_string(),
            table,
            defaults: Uniforms::default(),
        };
        for &uniform in kind.uniforms() {
            program.set_uniform(uniform, uniform.default_value());
        }
        program
    }

    /// Parses both stages and builds a program. A stage that fails to parse
    /// is logged and contributes no uniforms.
    pub fn from_wgsl(kind: ShaderKind, vertex: &str, fragment: &str, label: &str) -> Self {
        let modules: Vec<naga::Module> = [("vertex", vertex), ("fragment", fragment)]
            .into_iter()
            .filter_map(|(stage, source)| parse_stage(label, stage, source))
            .collect();
        let refs: Vec<&naga::Module> = modules.iter().collect();
        Self::new(kind, label, &refs)
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn location(&self, uniform: Uniform) -> Option<UniformLocation> {
        self.table.get(uniform)
    }

    /// Uniform values new bindings start from.
    pub fn defaults(&self) -> &Uniforms {
        &self.defaults
    }

    /// Sets a default value. Absent uniforms are ignored.
    pub fn set_uniform(&mut self, uniform: Uniform, value: impl Into<UniformValue>) {
        write_uniform(&self.table, &mut self.defaults, uniform, value.into());
    }

    /// Starts a draw's uniform state from this program's defaults.
    pub fn bind(&self) -> BoundShader<'_> {
        BoundShader {
            program: self,
            pipeline: None,
            uniforms: self.defaults,
        }
    }
}

fn write_uniform(table: &UniformTable, uniforms: &mut Uniforms, uniform: Uniform, value: UniformValue) {
    let Some(location) = table.get(uniform) else {
        return;
    };
    if !value.fits(location.ty) {
        log::warn!(
            "uniform {} is {:?}, ignoring {value:?}",
            uniform.name(),
            location.ty
        );
        return;
    }
    uniforms.block_mut(location.block).write(location.offset, &value);
}

fn parse_stage(label: &str, stage: &str, source: &str) -> Option<naga::Module> {
    match naga::front::wgsl::parse_str(source) {
        Ok(module) => Some(module),
        Err(error) => {
            log::error!(
                "{label} {stage} shader failed to compile:\n{}",
                error.emit_to_string(source)
            );
            None
        }
    }
}

/// A compiled vertex + fragment pair with its pipeline.
///
/// Compilation and linking never fail hard: errors are logged and the shader
/// is kept without a pipeline. Draws through such a shader are skipped.
#[derive(Debug)]
pub struct Shader {
    program: Program,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl Shader {
    /// Compiles `vertex` and `fragment` WGSL for `kind`.
    ///
    /// Each stage must export its entry point as `vs_main` / `fs_main`.
    pub fn new(gpu: &GpuContext, kind: ShaderKind, vertex: &str, fragment: &str, label: &str) -> Self {
        let vertex_module = parse_stage(label, "vertex", vertex);
        let fragment_module = parse_stage(label, "fragment", fragment);

        let parsed: Vec<&naga::Module> = vertex_module.iter().chain(fragment_module.iter()).collect();
        let program = Program::new(kind, label, &parsed);

        let pipeline = if vertex_module.is_some() && fragment_module.is_some() {
            Self::link(gpu, kind, vertex, fragment, label)
        } else {
            None
        };

        if pipeline.is_some() {
            log::debug!("shader {label}: linked {kind:?} pipeline");
        }

        Self { program, pipeline }
    }

    /// Compiles one of the built-in shaders.
    pub fn builtin(gpu: &GpuContext, kind: ShaderKind) -> Self {
        let source = kind.builtin_source();
        Self::new(gpu, kind, source.vertex, source.fragment, kind.label())
    }

    fn link(
        gpu: &GpuContext,
        kind: ShaderKind,
        vertex: &str,
        fragment: &str,
        label: &str,
    ) -> Option<wgpu::RenderPipeline> {
        let device = &gpu.device;
        let (pipeline, error) = gpu.validate(label, || {
            let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(vertex.into()),
            });
            let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(fragment.into()),
            });

            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[
                    &gpu.layouts.uniforms,
                    &gpu.layouts.uniforms,
                    gpu.layouts.textures(kind),
                ],
                push_constant_ranges: &[],
            });

            PassState::for_kind(kind, gpu.config.format).create_pipeline(
                device, label, &layout, &vertex, &fragment,
            )
        });

        match error {
            Some(_) => {
                log::error!("shader {label} failed to link; draws using it will be skipped");
                None
            }
            None => Some(pipeline),
        }
    }

    pub fn kind(&self) -> ShaderKind {
        self.program.kind()
    }

    pub fn label(&self) -> &str {
        self.program.label()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// `None` when compilation or linking failed.
    pub fn pipeline(&self) -> Option<&wgpu::RenderPipeline> {
        self.pipeline.as_ref()
    }

    pub fn location(&self, uniform: Uniform) -> Option<UniformLocation> {
        self.program.location(uniform)
    }

    /// Sets a value every later [`bind`](Self::bind) starts from.
    pub fn set_uniform(&mut self, uniform: Uniform, value: impl Into<UniformValue>) {
        self.program.set_uniform(uniform, value);
    }

    pub fn bind(&self) -> BoundShader<'_> {
        BoundShader {
            pipeline: self.pipeline.as_ref(),
            ..self.program.bind()
        }
    }
}

/// A shader selected for one draw, with the uniform values that draw uses.
///
/// Writes only affect this binding; the shader's defaults and other bindings
/// are untouched.
#[derive(Clone, Debug)]
pub struct BoundShader<'s> {
    program: &'s Program,
    pipeline: Option<&'s wgpu::RenderPipeline>,
    uniforms: Uniforms,
}

impl<'s> BoundShader<'s> {
    pub fn set_uniform(&mut self, uniform: Uniform, value: impl Into<UniformValue>) {
        write_uniform(&self.program.table, &mut self.uniforms, uniform, value.into());
    }

    pub fn program(&self) -> &'s Program {
        self.program
    }

    pub fn pipeline(&self) -> Option<&'s wgpu::RenderPipeline> {
        self.pipeline
    }

    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::uniform::UniformBlockKind;
    use glam::{Mat4, Vec2, Vec3};

    fn geometry() -> Program {
        let source = ShaderKind::Geometry.builtin_source();
        Program::from_wgsl(ShaderKind::Geometry, source.vertex, source.fragment, "geometry")
    }

    fn mat4_at(uniforms: &Uniforms, location: UniformLocation) -> Mat4 {
        let bytes: [u8; 64] = uniforms.block(location.block).read(location.offset).unwrap();
        let floats: [f32; 16] = bytemuck::cast(bytes);
        Mat4::from_cols_array(&floats)
    }

    #[test]
    fn builtin_programs_resolve_every_slot() {
        for kind in ShaderKind::ALL {
            let source = kind.builtin_source();
            let program = Program::from_wgsl(kind, source.vertex, source.fragment, kind.label());
            for &uniform in kind.uniforms() {
                assert!(program.location(uniform).is_some(), "{kind:?} {uniform:?}");
            }
        }
    }

    #[test]
    fn defaults_are_written() {
        let program = geometry();
        let transform = program.location(Uniform::Transform).unwrap();
        assert_eq!(mat4_at(program.defaults(), transform), Mat4::IDENTITY);

        let tiling = program.location(Uniform::MaterialTiling).unwrap();
        assert_eq!(tiling.block, UniformBlockKind::Instance);
        let bytes: [u8; 8] = program.defaults().instance.read(tiling.offset).unwrap();
        assert_eq!(bytemuck::cast::<_, [f32; 2]>(bytes), [1.0, 1.0]);
    }

    #[test]
    fn absent_uniform_write_is_a_no_op() {
        let program = geometry();
        let mut bound = program.bind();
        let before = *bound.uniforms();
        bound.set_uniform(Uniform::SkyTransition, 0.5);
        bound.set_uniform(Uniform::LightingAmbient, 0.5);
        assert_eq!(*bound.uniforms(), before);
    }

    #[test]
    fn mistyped_value_is_ignored() {
        let program = geometry();
        let mut bound = program.bind();
        let before = *bound.uniforms();
        bound.set_uniform(Uniform::MaterialTiling, Vec3::ONE);
        assert_eq!(*bound.uniforms(), before);
    }

    #[test]
    fn bindings_do_not_share_state() {
        let mut program = geometry();
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

        let mut a = program.bind();
        a.set_uniform(Uniform::Transform, model);
        let b = program.bind();

        let transform = program.location(Uniform::Transform).unwrap();
        assert_eq!(mat4_at(a.uniforms(), transform), model);
        assert_eq!(mat4_at(b.uniforms(), transform), Mat4::IDENTITY);
        let untouched = *b.uniforms();

        program.set_uniform(Uniform::MaterialTiling, Vec2::new(4.0, 2.0));
        assert_ne!(*program.bind().uniforms(), untouched);
    }

    #[test]
    fn broken_source_yields_empty_program() {
        let program = Program::from_wgsl(ShaderKind::Shadow, "fn (", "@fragment fn fs_main() {}", "broken");
        assert_eq!(program.location(Uniform::TransformLightSpace), None);
    }
}
