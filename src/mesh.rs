//! Vertex data for the three viewer shapes.
//!
//! Cube and pyramid are fixed triangle lists built once. The sphere is a
//! latitude/longitude grid plus a triangle-list index stream, rebuilt only when
//! its `SphereParams` change.

use glam::Vec3;
use std::f32::consts::PI;

use crate::components::{ShapeKind, SphereParams};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

const CUBE_FACES: [([f32; 3], [[f32; 3]; 6]); 6] = [
    // Front
    (
        [0.0, 0.0, 1.0],
        [
            [-0.5, -0.5, 0.5],
            [0.5, -0.5, 0.5],
            [0.5, 0.5, 0.5],
            [-0.5, -0.5, 0.5],
            [0.5, 0.5, 0.5],
            [-0.5, 0.5, 0.5],
        ],
    ),
    // Back
    (
        [0.0, 0.0, -1.0],
        [
            [-0.5, -0.5, -0.5],
            [-0.5, 0.5, -0.5],
            [0.5, 0.5, -0.5],
            [-0.5, -0.5, -0.5],
            [0.5, 0.5, -0.5],
            [0.5, -0.5, -0.5],
        ],
    ),
    // Top
    (
        [0.0, 1.0, 0.0],
        [
            [-0.5, 0.5, -0.5],
            [-0.5, 0.5, 0.5],
            [0.5, 0.5, 0.5],
            [-0.5, 0.5, -0.5],
            [0.5, 0.5, 0.5],
            [0.5, 0.5, -0.5],
        ],
    ),
    // Bottom
    (
        [0.0, -1.0, 0.0],
        [
            [-0.5, -0.5, -0.5],
            [0.5, -0.5, -0.5],
            [0.5, -0.5, 0.5],
            [-0.5, -0.5, -0.5],
            [0.5, -0.5, 0.5],
            [-0.5, -0.5, 0.5],
        ],
    ),
    // Right
    (
        [1.0, 0.0, 0.0],
        [
            [0.5, -0.5, -0.5],
            [0.5, 0.5, -0.5],
            [0.5, 0.5, 0.5],
            [0.5, -0.5, -0.5],
            [0.5, 0.5, 0.5],
            [0.5, -0.5, 0.5],
        ],
    ),
    // Left
    (
        [-1.0, 0.0, 0.0],
        [
            [-0.5, -0.5, -0.5],
            [-0.5, -0.5, 0.5],
            [-0.5, 0.5, 0.5],
            [-0.5, -0.5, -0.5],
            [-0.5, 0.5, 0.5],
            [-0.5, 0.5, -0.5],
        ],
    ),
];

const PYRAMID_TRIANGLES: [[[f32; 3]; 3]; 6] = [
    // Base
    [[-0.5, 0.0, -0.5], [0.5, 0.0, -0.5], [0.5, 0.0, 0.5]],
    [[-0.5, 0.0, -0.5], [0.5, 0.0, 0.5], [-0.5, 0.0, 0.5]],
    // Sides
    [[-0.5, 0.0, -0.5], [0.5, 0.0, -0.5], [0.0, 1.0, 0.0]],
    [[0.5, 0.0, -0.5], [0.5, 0.0, 0.5], [0.0, 1.0, 0.0]],
    [[0.5, 0.0, 0.5], [-0.5, 0.0, 0.5], [0.0, 1.0, 0.0]],
    [[-0.5, 0.0, 0.5], [-0.5, 0.0, -0.5], [0.0, 1.0, 0.0]],
];

/// Centroid of the pyramid volume, used to orient face normals outward.
const PYRAMID_CENTER: Vec3 = Vec3::new(0.0, 0.25, 0.0);

/// Unit cube of side 1 centered at the origin: 36 vertices.
pub fn cube() -> Vec<Vertex> {
    CUBE_FACES
        .iter()
        .flat_map(|(normal, corners)| corners.iter().map(|p| Vertex::new(*p, *normal)))
        .collect()
}

/// Square pyramid, base side 1 on y = 0, apex at y = 1: 18 vertices.
pub fn pyramid() -> Vec<Vertex> {
    PYRAMID_TRIANGLES
        .iter()
        .flat_map(|tri| {
            let normal = outward_normal(tri, PYRAMID_CENTER).to_array();
            tri.iter().map(move |p| Vertex::new(*p, normal))
        })
        .collect()
}

/// Flat normal of a triangle, flipped if needed so it points away from `center`.
fn outward_normal(tri: &[[f32; 3]; 3], center: Vec3) -> Vec3 {
    let [a, b, c] = tri.map(Vec3::from_array);
    let normal = (b - a).cross(c - a).normalize_or_zero();
    let centroid = (a + b + c) / 3.0;

    if normal.dot(centroid - center) < 0.0 {
        -normal
    } else {
        normal
    }
}

#[derive(Clone, Debug, Default)]
pub struct SphereMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// UV sphere: `(lat + 1) * (long + 1)` grid points and `lat * long * 6` indices.
pub fn sphere(params: &SphereParams) -> SphereMesh {
    let lat_bands = params.latitude_bands;
    let long_bands = params.longitude_bands;

    let mut vertices = Vec::with_capacity(params.vertex_count());
    for lat in 0..=lat_bands {
        let theta = lat as f32 * PI / lat_bands as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_bands {
            let phi = long as f32 * 2.0 * PI / long_bands as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let unit = [cos_phi * sin_theta, cos_theta, sin_phi * sin_theta];
            let position = unit.map(|c| c * params.radius);
            vertices.push(Vertex::new(position, unit));
        }
    }

    let mut indices = Vec::with_capacity((lat_bands * long_bands * 6) as usize);
    for lat in 0..lat_bands {
        for long in 0..long_bands {
            let current = lat * (long_bands + 1) + long;
            let next = current + long_bands + 1;

            indices.extend_from_slice(&[current, next, current + 1]);
            indices.extend_from_slice(&[current + 1, next, next + 1]);
        }
    }

    SphereMesh { vertices, indices }
}

/// Borrowed view of one shape's geometry.
#[derive(Clone, Copy, Debug)]
pub struct ShapeGeometry<'a> {
    pub vertices: &'a [Vertex],
    pub indices: Option<&'a [u32]>,
}

impl ShapeGeometry<'_> {
    pub fn draw_count(&self) -> u32 {
        match self.indices {
            Some(indices) => indices.len() as u32,
            None => self.vertices.len() as u32,
        }
    }
}

/// Holds generated geometry so nothing is rebuilt per frame.
pub struct GeometryCache {
    cube: Vec<Vertex>,
    pyramid: Vec<Vertex>,
    sphere: SphereMesh,
    sphere_params: SphereParams,
    sphere_generation: u64,
}

impl GeometryCache {
    pub fn new(sphere_params: SphereParams) -> Self {
        Self {
            cube: cube(),
            pyramid: pyramid(),
            sphere: sphere(&sphere_params),
            sphere_params,
            sphere_generation: 0,
        }
    }

    /// Regenerates the sphere if `params` differ from the cached ones.
    /// Returns `true` when a rebuild happened.
    pub fn update_sphere(&mut self, params: SphereParams) -> bool {
        if params == self.sphere_params {
            return false;
        }

        self.sphere = sphere(&params);
        self.sphere_params = params;
        self.sphere_generation += 1;
        log::debug!(
            "sphere rebuilt: {}x{} bands, {} vertices",
            params.latitude_bands,
            params.longitude_bands,
            self.sphere.vertices.len()
        );
        true
    }

    /// Bumped on every sphere rebuild; GPU buffers compare against it.
    pub fn sphere_generation(&self) -> u64 {
        self.sphere_generation
    }

    pub fn geometry(&self, shape: ShapeKind) -> ShapeGeometry<'_> {
        match shape {
            ShapeKind::Cube => ShapeGeometry {
                vertices: &self.cube,
                indices: None,
            },
            ShapeKind::Pyramid => ShapeGeometry {
                vertices: &self.pyramid,
                indices: None,
            },
            ShapeKind::Sphere => ShapeGeometry {
                vertices: &self.sphere.vertices,
                indices: Some(&self.sphere.indices),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── fixed shapes ──────────────────────────────────────────────────────

    #[test]
    fn cube_has_36_vertices() {
        let v = cube();
        assert_eq!(v.len(), 36);
        assert_eq!(bytemuck::cast_slice::<Vertex, f32>(&v).len(), 36 * 6);
    }

    #[test]
    fn cube_is_unit_and_centered() {
        for v in cube() {
            for c in v.position {
                assert_eq!(c.abs(), 0.5);
            }
        }
    }

    #[test]
    fn cube_normals_match_their_face() {
        for v in cube() {
            let n = Vec3::from_array(v.normal);
            let p = Vec3::from_array(v.position);
            // The face coordinate along the normal sits at +0.5.
            assert!((p.dot(n) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn pyramid_has_18_vertices() {
        assert_eq!(pyramid().len(), 18);
    }

    #[test]
    fn pyramid_apex_and_base() {
        let v = pyramid();
        let max_y = v.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        let min_y = v.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        assert_eq!(max_y, 1.0);
        assert_eq!(min_y, 0.0);
    }

    #[test]
    fn pyramid_normals_point_outward() {
        let v = pyramid();
        // Base faces down.
        assert_eq!(v[0].normal, [0.0, -1.0, 0.0]);
        assert_eq!(v[3].normal, [0.0, -1.0, 0.0]);
        // Back side (z = -0.5) faces -z and up.
        let back = Vec3::from_array(v[6].normal);
        assert!(back.z < 0.0 && back.y > 0.0);
        assert!((back.length() - 1.0).abs() < 1e-6);
    }

    // ── sphere ────────────────────────────────────────────────────────────

    #[test]
    fn sphere_default_grid_has_961_points() {
        let mesh = sphere(&SphereParams::default());
        assert_eq!(mesh.vertices.len(), 961);
        assert_eq!(mesh.indices.len(), 30 * 30 * 6);
    }

    #[test]
    fn sphere_points_for_custom_bands() {
        let params = SphereParams::new(4, 8, 0.5);
        assert_eq!(sphere(&params).vertices.len(), 5 * 9);
    }

    #[test]
    fn sphere_points_lie_on_radius() {
        for v in sphere(&SphereParams::default()).vertices {
            let len = Vec3::from_array(v.position).length();
            assert!((len - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn sphere_indices_in_range() {
        let mesh = sphere(&SphereParams::new(5, 7, 0.5));
        let n = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < n));
    }

    // ── cache ─────────────────────────────────────────────────────────────

    #[test]
    fn cache_rebuilds_sphere_only_on_change() {
        let mut cache = GeometryCache::new(SphereParams::default());
        assert!(!cache.update_sphere(SphereParams::default()));
        assert_eq!(cache.sphere_generation(), 0);

        let params = SphereParams::default().with_band_delta(1);
        assert!(cache.update_sphere(params));
        assert_eq!(cache.sphere_generation(), 1);
        assert_eq!(cache.geometry(ShapeKind::Sphere).vertices.len(), 32 * 32);

        assert!(!cache.update_sphere(params));
        assert_eq!(cache.sphere_generation(), 1);
    }

    #[test]
    fn cache_draw_counts() {
        let cache = GeometryCache::new(SphereParams::default());
        assert_eq!(cache.geometry(ShapeKind::Cube).draw_count(), 36);
        assert_eq!(cache.geometry(ShapeKind::Pyramid).draw_count(), 18);
        assert_eq!(cache.geometry(ShapeKind::Sphere).draw_count(), 5400);
    }
}
