// crates/engine_render/src/terrain.rs
//
// Heightfield terrain: converts a 2D sample grid into GPU-ready vertex and
// index buffers. Geometry generation is pure CPU code so the invariants are
// testable without a device; upload is a separate one-shot step.

use std::sync::Arc;

use glam::Vec3;
use tracing::info;

use engine_heightmap::HeightMap;

use crate::context::GraphicsContext;
use crate::error::RenderError;
use crate::mesh::{GpuMesh, TerrainVertex};

pub const DEFAULT_WIDTH: u32 = 100;
pub const DEFAULT_HEIGHT: u32 = 100;

const VERTEX_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// CPU-side terrain mesh data.
///
/// `face_normals` holds two entries per grid cell (one per triangle). They
/// are deliberately not merged back into the vertices: [`TerrainVertex`]
/// carries no normal, and the lighting path works from these instead.
pub struct TerrainGeometry {
    pub width: u32,
    pub height: u32,
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
    pub face_normals: Vec<Vec3>,
}

impl TerrainGeometry {
    /// Builds the grid mesh. Without a height map every elevation is 0.
    ///
    /// Vertex `(x, z)` lands at flat index `z * width + x`; each interior
    /// cell emits the triangles `(v, v+width, v+1)` and
    /// `(v+1, v+width, v+width+1)`.
    pub fn generate(width: u32, height: u32, samples: Option<&HeightMap>) -> Self {
        let w = width as usize;
        let h = height as usize;

        let mut vertices = Vec::with_capacity(w * h);
        for z in 0..h {
            for x in 0..w {
                let elevation = match samples {
                    Some(map) => map.sample(x as u32, z as u32),
                    None => 0.0,
                };
                vertices.push(TerrainVertex {
                    position: [x as f32, elevation, z as f32],
                    color: VERTEX_COLOR,
                });
            }
        }

        let cells_x = w - 1;
        let cells_z = h - 1;
        let mut indices = Vec::with_capacity(6 * cells_x * cells_z);
        let mut face_normals = Vec::with_capacity(2 * cells_x * cells_z);

        for z in 0..cells_z {
            for x in 0..cells_x {
                let v = (z * w + x) as u32;
                let tri_a = [v, v + width, v + 1];
                let tri_b = [v + 1, v + width, v + width + 1];
                indices.extend_from_slice(&tri_a);
                indices.extend_from_slice(&tri_b);
                face_normals.push(face_normal(&vertices, tri_a));
                face_normals.push(face_normal(&vertices, tri_b));
            }
        }

        Self {
            width,
            height,
            vertices,
            indices,
            face_normals,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

/// Cross product of two triangle edges, normalized. The index winding above
/// keeps these pointing up (+Y) for any sample values.
fn face_normal(vertices: &[TerrainVertex], tri: [u32; 3]) -> Vec3 {
    let p0 = Vec3::from_array(vertices[tri[0] as usize].position);
    let p1 = Vec3::from_array(vertices[tri[1] as usize].position);
    let p2 = Vec3::from_array(vertices[tri[2] as usize].position);
    (p1 - p0).cross(p2 - p0).normalize_or_zero()
}

/// Renderable heightfield terrain.
///
/// The height grid is externally owned and shared in, never copied. Callers
/// configure dimensions, load the grid, then `generate` once; the result is
/// immutable until the next full rebuild.
pub struct Terrain {
    width: u32,
    height: u32,
    height_map: Option<Arc<HeightMap>>,
    lowest: f32,
    highest: f32,
    offset: Vec3,
    face_normals: Vec<Vec3>,
    mesh: Option<GpuMesh>,
}

impl Default for Terrain {
    fn default() -> Self {
        Self::new()
    }
}

impl Terrain {
    pub fn new() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            height_map: None,
            lowest: 0.0,
            highest: 0.0,
            offset: Vec3::ZERO,
            face_normals: Vec::new(),
            mesh: None,
        }
    }

    /// Grid dimensions for the next `generate`. Both must be at least 2
    /// (one cell).
    pub fn set_dimensions(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width < 2 || height < 2 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Stores a shared reference to the sample grid and derives the mesh
    /// offsets: Y so the lowest sample sits at zero, X so the mesh is
    /// horizontally centered.
    ///
    /// The grid must match the configured dimensions; a mismatch is a
    /// contract violation reported loudly instead of generating garbage.
    pub fn load_height_map(&mut self, map: Arc<HeightMap>) -> Result<(), RenderError> {
        if map.width() != self.width || map.height() != self.height {
            return Err(RenderError::HeightMapMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: map.width(),
                actual_height: map.height(),
            });
        }

        let mut lowest = f32::INFINITY;
        let mut highest = f32::NEG_INFINITY;
        for &s in map.samples() {
            lowest = lowest.min(s);
            highest = highest.max(s);
        }

        self.lowest = lowest;
        self.highest = highest;
        self.offset = Vec3::new(-(self.width as f32) / 2.0, -lowest, 0.0);
        self.height_map = Some(map);
        Ok(())
    }

    /// Builds the CPU geometry for the current grid. Split from
    /// [`Terrain::generate`] so the mesh invariants are testable headless.
    pub fn build_geometry(&self) -> TerrainGeometry {
        TerrainGeometry::generate(self.width, self.height, self.height_map.as_deref())
    }

    /// One-shot (re)build: generates the grid and uploads immutable GPU
    /// buffers. The CPU vertex/index arrays are released after upload; the
    /// face-normal array is retained for height/lighting queries.
    ///
    /// Any buffer-creation failure aborts generation with nothing bound.
    pub fn generate(&mut self, ctx: &GraphicsContext) -> Result<(), RenderError> {
        let geometry = self.build_geometry();
        let mesh = GpuMesh::new(ctx, "Terrain Mesh", &geometry.vertices, &geometry.indices)?;

        info!(
            width = self.width,
            height = self.height,
            vertices = geometry.vertex_count(),
            indices = geometry.index_count(),
            "terrain mesh generated"
        );

        self.face_normals = geometry.face_normals;
        self.mesh = Some(mesh);
        Ok(())
    }

    /// The uploaded mesh, or `NotInitialised` before `generate`.
    pub fn mesh(&self) -> Result<&GpuMesh, RenderError> {
        self.mesh.as_ref().ok_or(RenderError::NotInitialised {
            component: "terrain",
        })
    }

    /// Mesh translation applied by the shader wrapper's world matrix:
    /// `(-width/2, -lowest_sample, 0)`.
    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn lowest(&self) -> f32 {
        self.lowest
    }

    pub fn highest(&self) -> f32 {
        self.highest
    }

    /// Two per grid cell, in cell order. Empty before `generate`.
    pub fn face_normals(&self) -> &[Vec3] {
        &self.face_normals
    }

    /// Releases GPU buffers and the shared height grid. Safe to call twice
    /// or on a terrain that was never generated.
    pub fn shutdown(&mut self) {
        self.mesh = None;
        self.height_map = None;
        self.face_normals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_map(width: u32, height: u32) -> Arc<HeightMap> {
        let samples = (0..width * height).map(|i| i as f32).collect();
        Arc::new(HeightMap::from_samples(width, height, samples).unwrap())
    }

    #[test]
    fn vertex_and_index_counts() {
        for (w, h) in [(2, 2), (4, 4), (5, 3), (100, 100)] {
            let g = TerrainGeometry::generate(w, h, None);
            assert_eq!(g.vertex_count() as u32, w * h);
            assert_eq!(g.index_count() as u32, 6 * (w - 1) * (h - 1));
            assert_eq!(g.face_normals.len() as u32, 2 * (w - 1) * (h - 1));
        }
    }

    #[test]
    fn vertex_addressing_is_row_major() {
        let map = ramp_map(5, 3);
        let mut terrain = Terrain::new();
        terrain.set_dimensions(5, 3).unwrap();
        terrain.load_height_map(map.clone()).unwrap();
        let g = terrain.build_geometry();

        for z in 0..3u32 {
            for x in 0..5u32 {
                let v = g.vertices[(z * 5 + x) as usize];
                assert_eq!(v.position[0], x as f32);
                assert_eq!(v.position[2], z as f32);
                // Identity mapping: vertex Y equals the sample, no smoothing.
                assert_eq!(v.position[1], map.sample(x, z));
            }
        }
    }

    #[test]
    fn indices_stay_in_bounds() {
        let g = TerrainGeometry::generate(7, 9, None);
        let count = g.vertex_count() as u32;
        assert!(g.indices.iter().all(|&i| i < count));
    }

    #[test]
    fn offsets_follow_lowest_sample() {
        let samples = vec![3.0, 5.0, 4.0, 7.0];
        let map = Arc::new(HeightMap::from_samples(2, 2, samples).unwrap());
        let mut terrain = Terrain::new();
        terrain.set_dimensions(2, 2).unwrap();
        terrain.load_height_map(map).unwrap();

        assert_eq!(terrain.lowest(), 3.0);
        assert_eq!(terrain.highest(), 7.0);
        assert_eq!(terrain.offset(), Vec3::new(-1.0, -3.0, 0.0));
    }

    #[test]
    fn face_normals_point_up_on_flat_ground() {
        let g = TerrainGeometry::generate(4, 4, None);
        for n in &g.face_normals {
            assert!((n.length() - 1.0).abs() < 1e-6);
            assert!((n.y - 1.0).abs() < 1e-6, "flat cell normal was {n:?}");
        }
    }

    #[test]
    fn dimensions_below_two_are_rejected() {
        let mut terrain = Terrain::new();
        assert!(matches!(
            terrain.set_dimensions(1, 10),
            Err(RenderError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            terrain.set_dimensions(10, 0),
            Err(RenderError::InvalidDimensions { .. })
        ));
        // Failed calls leave the defaults untouched.
        assert_eq!(terrain.dimensions(), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
    }

    #[test]
    fn mismatched_grid_is_rejected() {
        let mut terrain = Terrain::new();
        terrain.set_dimensions(8, 8).unwrap();
        let err = terrain.load_height_map(ramp_map(8, 9)).unwrap_err();
        assert!(matches!(err, RenderError::HeightMapMismatch { .. }));
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut terrain = Terrain::new();
        terrain.shutdown();
        terrain.shutdown();
        assert!(terrain.mesh().is_err());
        assert!(terrain.face_normals().is_empty());
    }
}
