//! Owned GPU resources addressed by typed ids, and the ECS component that
//! refers to them.
//!
//! Meshes, textures, cubemaps and shaders are created once and shared by any
//! number of entities. Entities carry a [`Renderable`] next to their
//! [`Transform`](crate::Transform) and are drawn by looking their ids up
//! here every frame.

use crate::mesh::Mesh;
use crate::shader::{MaterialUniforms, Shader};
use crate::texture::{Cubemap, Texture};

/// Handle to a mesh in a [`ResourceRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// Handle to a texture in a [`ResourceRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

/// Handle to a cubemap in a [`ResourceRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CubemapId(pub(crate) usize);

/// Handle to a shader in a [`ResourceRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShaderId(pub(crate) usize);

/// Component for entities drawn by the geometry and shadow passes.
#[derive(Clone, Copy, Debug)]
pub struct Renderable {
    pub mesh: MeshId,
    /// Diffuse texture.
    pub texture: TextureId,
    /// Values pushed through the geometry shader's material instance.
    pub material: MaterialUniforms,
}

impl Renderable {
    pub fn new(mesh: MeshId, texture: TextureId) -> Self {
        Self {
            mesh,
            texture,
            material: MaterialUniforms::default(),
        }
    }

    /// Sets the texture coordinate scale.
    pub fn tiling(mut self, x: f32, y: f32) -> Self {
        self.material.tiling = glam::Vec2::new(x, y);
        self
    }
}

/// Storage for every resource a scene uses.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    meshes: Vec<Mesh>,
    textures: Vec<Texture>,
    cubemaps: Vec<Cubemap>,
    shaders: Vec<Shader>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        self.textures.push(texture);
        TextureId(self.textures.len() - 1)
    }

    pub fn add_cubemap(&mut self, cubemap: Cubemap) -> CubemapId {
        self.cubemaps.push(cubemap);
        CubemapId(self.cubemaps.len() - 1)
    }

    pub fn add_shader(&mut self, shader: Shader) -> ShaderId {
        self.shaders.push(shader);
        ShaderId(self.shaders.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.0)
    }

    pub fn cubemap(&self, id: CubemapId) -> Option<&Cubemap> {
        self.cubemaps.get(id.0)
    }

    pub fn shader(&self, id: ShaderId) -> Option<&Shader> {
        self.shaders.get(id.0)
    }

    /// Number of meshes, textures, cubemaps and shaders held.
    pub fn counts(&self) -> [usize; 4] {
        [
            self.meshes.len(),
            self.textures.len(),
            self.cubemaps.len(),
            self.shaders.len(),
        ]
    }
}
