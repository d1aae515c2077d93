//! CPU-side geometry before GPU upload.
//!
//! [`RawGeometry`] is what asset loaders hand to the renderer: a vertex list
//! and triangle indices. It provides the import-time processing a loader needs
//! (vertex deduplication, tangent generation, recentering) and the built-in
//! primitives that [`Mesh`] exposes.
//!
//! ```
//! use umbra::{RawGeometry, Vertex};
//!
//! // Two triangles sharing an edge, as an unindexed loader would emit them.
//! let a = Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]);
//! let b = Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]);
//! let c = Vertex::new([1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]);
//! let d = Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]);
//!
//! let geometry = RawGeometry::from_triangle_soup(&[a, b, c, c, d, a]);
//! assert_eq!(geometry.vertices.len(), 4);
//! assert_eq!(geometry.indices, vec![0, 1, 2, 2, 3, 0]);
//! ```

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::gpu::GpuContext;
use crate::mesh::{Mesh, Vertex};

/// Raw geometry data before GPU upload.
#[derive(Clone, Debug, Default)]
pub struct RawGeometry {
    pub vertices: Vec<Vertex>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Builds indexed geometry from an unindexed triangle list, merging
    /// vertices that compare equal (position, normal and texcoord).
    pub fn from_triangle_soup(soup: &[Vertex]) -> Self {
        let mut unique: HashMap<Vertex, u32> = HashMap::with_capacity(soup.len());
        let mut vertices = Vec::new();
        let mut indices = Vec::with_capacity(soup.len());

        for vertex in soup {
            let next = vertices.len() as u32;
            let index = *unique.entry(*vertex).or_insert_with(|| {
                vertices.push(*vertex);
                next
            });
            indices.push(index);
        }

        log::info!(
            "mesh info: {} indices, {} unique vertices",
            indices.len(),
            vertices.len()
        );

        Self { vertices, indices }
    }

    /// Computes the axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    /// Returns the center point of the geometry.
    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    /// Translates all vertices by the given offset.
    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.position = (Vec3::from(v.position) + offset).into();
        }
    }

    /// Centers the geometry at the origin.
    pub fn recenter(&mut self) {
        let center = self.center();
        self.translate(-center);
    }

    /// Fills in per-vertex tangents from texture-coordinate gradients.
    ///
    /// Triangle tangents are accumulated per vertex, then made orthogonal to
    /// the vertex normal. Vertices whose triangles have degenerate texture
    /// coordinates get an arbitrary vector perpendicular to the normal.
    pub fn generate_tangents(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(v0), Some(v1), Some(v2)) = (
                self.vertices.get(i0),
                self.vertices.get(i1),
                self.vertices.get(i2),
            ) else {
                continue;
            };

            let e1 = Vec3::from(v1.position) - Vec3::from(v0.position);
            let e2 = Vec3::from(v2.position) - Vec3::from(v0.position);
            let d1 = Vec2::from(v1.texcoord) - Vec2::from(v0.texcoord);
            let d2 = Vec2::from(v2.texcoord) - Vec2::from(v0.texcoord);

            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() < f32::EPSILON {
                continue;
            }
            let tangent = (e1 * d2.y - e2 * d1.y) / det;

            for i in [i0, i1, i2] {
                accumulated[i] += tangent;
            }
        }

        for (v, t) in self.vertices.iter_mut().zip(accumulated) {
            let n = Vec3::from(v.normal);
            let tangent = (t - n * n.dot(t))
                .try_normalize()
                .unwrap_or_else(|| n.normalize_or(Vec3::Y).any_orthonormal_vector());
            v.tangent = tangent.into();
        }
    }

    /// Uploads this geometry to the GPU as a [`Mesh`].
    pub fn upload(&self, gpu: &GpuContext) -> Mesh {
        Mesh::new(gpu, &self.vertices, &self.indices)
    }

    /// Unit cube centered at the origin, four vertices per face.
    pub fn cube() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            // +Z
            Vertex::new([-0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
            Vertex::new([ 0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
            Vertex::new([ 0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
            Vertex::new([-0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
            // -Z
            Vertex::new([ 0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
            Vertex::new([-0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
            Vertex::new([-0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
            Vertex::new([ 0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
            // +Y
            Vertex::new([-0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [0.0, 1.0]),
            Vertex::new([ 0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [1.0, 1.0]),
            Vertex::new([ 0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [1.0, 0.0]),
            Vertex::new([-0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [0.0, 0.0]),
            // -Y
            Vertex::new([-0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [0.0, 1.0]),
            Vertex::new([ 0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [1.0, 1.0]),
            Vertex::new([ 0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [1.0, 0.0]),
            Vertex::new([-0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [0.0, 0.0]),
            // +X
            Vertex::new([ 0.5, -0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
            Vertex::new([ 0.5, -0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex::new([ 0.5,  0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex::new([ 0.5,  0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
            // -X
            Vertex::new([-0.5, -0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 1.0]),
            Vertex::new([-0.5, -0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex::new([-0.5,  0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex::new([-0.5,  0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 0.0]),
        ];

        let indices = (0..6u32)
            .flat_map(|face| {
                let b = face * 4;
                [b, b + 1, b + 2, b + 2, b + 3, b]
            })
            .collect();

        let mut geometry = Self::new(vertices, indices);
        geometry.generate_tangents();
        geometry
    }

    /// UV sphere of radius 0.5 with `(segments + 1) * (rings + 1)` vertices.
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = std::f32::consts::TAU * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                vertices.push(Vertex::new(
                    [x * 0.5, y * 0.5, z * 0.5],
                    [x, y, z],
                    [seg as f32 / segments as f32, ring as f32 / rings as f32],
                ));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.extend_from_slice(&[current, current + 1, next]);
                indices.extend_from_slice(&[current + 1, next + 1, next]);
            }
        }

        let mut geometry = Self::new(vertices, indices);
        geometry.generate_tangents();
        geometry
    }

    /// `size` by `size` square on the XZ plane, normal +Y.
    pub fn plane(size: f32) -> Self {
        let half = size * 0.5;
        let vertices = vec![
            Vertex::new([-half, 0.0, -half], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex::new([half, 0.0, -half], [0.0, 1.0, 0.0], [1.0, 0.0]),
            Vertex::new([half, 0.0, half], [0.0, 1.0, 0.0], [1.0, 1.0]),
            Vertex::new([-half, 0.0, half], [0.0, 1.0, 0.0], [0.0, 1.0]),
        ];

        let mut geometry = Self::new(vertices, vec![0, 2, 1, 0, 3, 2]);
        geometry.generate_tangents();
        geometry
    }

    /// Clip-space quad for screen passes; texcoords have v pointing down.
    pub fn fullscreen_quad() -> Self {
        let vertices = vec![
            Vertex::new([-1.0, -1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            Vertex::new([1.0, -1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
            Vertex::new([1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([-1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
        ];
        Self::new(vertices, vec![0, 1, 2, 2, 3, 0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(g: &RawGeometry, tri: &[u32]) -> Vec3 {
        let p = |i: u32| Vec3::from(g.vertices[i as usize].position);
        (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]))
    }

    #[test]
    fn raw_geometry_bounds() {
        let vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex::new([1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex::new([-1.0, -1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let geom = RawGeometry::new(vertices, vec![0, 1, 2]);

        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn raw_geometry_recenter() {
        let vertices = vec![
            Vertex::new([2.0, 2.0, 2.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex::new([4.0, 4.0, 4.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let mut geom = RawGeometry::new(vertices, vec![0, 1, 0]);

        geom.recenter();

        assert!(geom.center().abs_diff_eq(Vec3::ZERO, 0.001));
    }

    #[test]
    fn soup_dedup_reuses_indices() {
        let quad = RawGeometry::plane(2.0);
        let soup: Vec<Vertex> = quad
            .indices
            .iter()
            .map(|&i| quad.vertices[i as usize])
            .collect();
        assert_eq!(soup.len(), 6);

        let deduped = RawGeometry::from_triangle_soup(&soup);
        assert_eq!(deduped.vertices.len(), 4);
        assert_eq!(deduped.indices.len(), 6);
        assert_eq!(deduped.indices[0], deduped.indices[3]);
        assert_eq!(deduped.indices[1], deduped.indices[5]);
    }

    #[test]
    fn dedup_keeps_distinct_texcoords_apart() {
        let a = Vertex::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]);
        let mut b = a;
        b.texcoord = [1.0, 0.0];
        let mut c = a;
        c.tangent = [1.0, 0.0, 0.0];

        let deduped = RawGeometry::from_triangle_soup(&[a, b, c]);
        assert_eq!(deduped.vertices.len(), 2);
        assert_eq!(deduped.indices, vec![0, 1, 0]);
    }

    #[test]
    fn primitives_wind_counter_clockwise_outward() {
        let plane = RawGeometry::plane(1.0);
        for tri in plane.indices.chunks(3) {
            assert!(face_normal(&plane, tri).y > 0.0);
        }

        let cube = RawGeometry::cube();
        for tri in cube.indices.chunks(3) {
            let n = face_normal(&cube, tri);
            let normal = Vec3::from(cube.vertices[tri[0] as usize].normal);
            assert!(n.dot(normal) > 0.0);
        }

        let sphere = RawGeometry::sphere(16, 8);
        for tri in sphere.indices.chunks(3) {
            let n = face_normal(&sphere, tri);
            if n.length_squared() < 1e-10 {
                continue; // collapsed pole triangle
            }
            let centroid = tri
                .iter()
                .map(|&i| Vec3::from(sphere.vertices[i as usize].position))
                .sum::<Vec3>();
            assert!(n.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn plane_tangents_follow_u() {
        let plane = RawGeometry::plane(2.0);
        for v in &plane.vertices {
            assert!(Vec3::from(v.tangent).abs_diff_eq(Vec3::X, 1e-5));
        }
    }

    #[test]
    fn tangents_are_unit_and_perpendicular() {
        let sphere = RawGeometry::sphere(16, 8);
        for v in &sphere.vertices {
            let t = Vec3::from(v.tangent);
            let n = Vec3::from(v.normal);
            assert!((t.length() - 1.0).abs() < 1e-4);
            if n.length_squared() > 0.5 {
                assert!(t.dot(n.normalize()).abs() < 1e-3);
            }
        }
    }
}
