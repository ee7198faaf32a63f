// crates/engine_render/tests/terrain_generation.rs
//
// End-to-end terrain generation scenarios, CPU side only.

use std::sync::Arc;

use engine_heightmap::{HeightMap, HeightMapBuilder, NoiseSettings};
use engine_render::terrain::{Terrain, TerrainGeometry};
use glam::Vec3;

#[test]
fn flat_terrain_scenario() {
    // 4x4 grid, every sample at 2.0.
    let map = Arc::new(HeightMap::flat(4, 4, 2.0));
    let mut terrain = Terrain::new();
    terrain.set_dimensions(4, 4).unwrap();
    terrain.load_height_map(map).unwrap();

    let geometry = terrain.build_geometry();

    // 16 vertices, all at Y = 2.0 before the offset is applied.
    assert_eq!(geometry.vertex_count(), 16);
    assert!(geometry.vertices.iter().all(|v| v.position[1] == 2.0));

    // 54 indices: 6 per cell over 3x3 cells.
    assert_eq!(geometry.index_count(), 54);

    // lowest == highest == 2.0, so the applied Y offset puts the mesh at 0.
    assert_eq!(terrain.offset().y, -2.0);
    let post_offset_y = geometry.vertices[0].position[1] + terrain.offset().y;
    assert_eq!(post_offset_y, 0.0);

    // 4-wide mesh is centered about X = 0 after the offset.
    assert_eq!(terrain.offset().x, -2.0);
}

#[test]
fn generated_heightmap_round_trips_through_terrain() {
    let builder = HeightMapBuilder::new(NoiseSettings {
        seed: 1234,
        ..Default::default()
    });
    let map = Arc::new(builder.build(64, 64));

    let mut terrain = Terrain::new();
    terrain.set_dimensions(64, 64).unwrap();
    terrain.load_height_map(map.clone()).unwrap();
    let geometry = terrain.build_geometry();

    // Identity mapping: every vertex Y equals its sample, no smoothing.
    for z in 0..64u32 {
        for x in 0..64u32 {
            let v = geometry.vertices[(z * 64 + x) as usize];
            assert_eq!(v.position[1], map.sample(x, z));
        }
    }

    // The offset tracks the minimum sample exactly.
    let min = map.samples().iter().copied().fold(f32::INFINITY, f32::min);
    assert_eq!(terrain.offset(), Vec3::new(-32.0, -min, 0.0));
}

#[test]
fn index_buffer_never_references_out_of_range_vertices() {
    for (w, h) in [(2u32, 2u32), (3, 8), (17, 5), (100, 100)] {
        let geometry = TerrainGeometry::generate(w, h, None);
        let vertex_count = geometry.vertex_count() as u32;
        assert_eq!(vertex_count, w * h);
        assert_eq!(geometry.index_count() as u32, 6 * (w - 1) * (h - 1));
        assert!(geometry.indices.iter().all(|&i| i < vertex_count));
    }
}

#[test]
fn triangle_winding_is_consistent_across_the_grid() {
    // Both triangles of every cell follow the same pattern:
    // (v, v+width, v+1) then (v+1, v+width, v+width+1).
    let w = 5u32;
    let geometry = TerrainGeometry::generate(w, 4, None);
    for (cell, tris) in geometry.indices.chunks_exact(6).enumerate() {
        let cell = cell as u32;
        let x = cell % (w - 1);
        let z = cell / (w - 1);
        let v = z * w + x;
        assert_eq!(tris, [v, v + w, v + 1, v + 1, v + w, v + w + 1]);
    }
}

#[test]
fn face_normals_tilt_with_the_slope() {
    // A single-cell ramp rising along X: normals must lean back toward -X.
    let map = Arc::new(HeightMap::from_samples(2, 2, vec![0.0, 1.0, 0.0, 1.0]).unwrap());
    let mut terrain = Terrain::new();
    terrain.set_dimensions(2, 2).unwrap();
    terrain.load_height_map(map).unwrap();
    let geometry = terrain.build_geometry();

    assert_eq!(geometry.face_normals.len(), 2);
    for n in &geometry.face_normals {
        assert!(n.y > 0.0, "normal should point up, got {n:?}");
        assert!(n.x < 0.0, "normal should lean against the +X slope, got {n:?}");
        assert!((n.length() - 1.0).abs() < 1e-6);
    }
}
