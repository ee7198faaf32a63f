// crates/engine_render/src/water.rs
//
// Water surface: a subdivided plane, three offscreen targets and the
// time-varying shading parameters. Per frame the passes must run as
// height -> reflection -> refraction -> surface; the surface pass samples
// the other three, so the protocol is tracked and violations are rejected
// instead of silently compositing stale data.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::GraphicsContext;
use crate::error::{RenderError, WaterPassKind};
use crate::mesh::{GpuMesh, WaterVertex};
use crate::render_target::RenderTarget;
use crate::texture::Texture;

/// Water shading knobs. All plain floats consumed verbatim by the surface
/// shader's constant block; no validation beyond type.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct WaterSettings {
    pub wave_height: f32,
    pub wave_scale: f32,
    pub refraction_distortion: f32,
    pub reflection_distortion: f32,
    pub max_distortion_distance: f32,
    pub refraction_strength: f32,
    pub reflection_strength: f32,
    pub water_depth: f32,
    /// UV scroll in texture units per millisecond, per axis.
    pub scroll_rate: [f32; 2],
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self {
            wave_height: 0.6,
            wave_scale: 1.0,
            refraction_distortion: 0.03,
            reflection_distortion: 0.05,
            max_distortion_distance: 40.0,
            refraction_strength: 0.5,
            reflection_strength: 0.5,
            water_depth: 4.0,
            scroll_rate: [0.005, 0.007],
        }
    }
}

/// CPU-side water mesh: a planar grid between `min` and `max` (XZ), at a
/// fixed surface level, with `subdiv_x x subdiv_z` cells.
pub struct WaterGeometry {
    pub vertices: Vec<WaterVertex>,
    pub indices: Vec<u32>,
}

impl WaterGeometry {
    /// U runs 0 -> 1 with increasing X; V runs 1 -> 0 with increasing Z,
    /// matching the texture-space convention of the normal map.
    pub fn plane(min: Vec2, max: Vec2, level: f32, subdiv_x: u32, subdiv_z: u32) -> Self {
        let cols = subdiv_x + 1;
        let rows = subdiv_z + 1;

        let mut vertices = Vec::with_capacity((cols * rows) as usize);
        for j in 0..rows {
            for i in 0..cols {
                let fx = i as f32 / subdiv_x as f32;
                let fz = j as f32 / subdiv_z as f32;
                vertices.push(WaterVertex {
                    position: [
                        min.x + (max.x - min.x) * fx,
                        level,
                        min.y + (max.y - min.y) * fz,
                    ],
                    uv: [fx, 1.0 - fz],
                    normal: [0.0, 1.0, 0.0],
                });
            }
        }

        let mut indices = Vec::with_capacity((6 * subdiv_x * subdiv_z) as usize);
        for j in 0..subdiv_z {
            for i in 0..subdiv_x {
                let v = j * cols + i;
                indices.extend_from_slice(&[v, v + cols, v + 1]);
                indices.extend_from_slice(&[v + 1, v + cols, v + cols + 1]);
            }
        }

        Self { vertices, indices }
    }
}

/// Which passes have been recorded this frame.
#[derive(Default, Clone, Copy, Debug)]
struct PassLog {
    height: bool,
    reflection: bool,
    refraction: bool,
}

impl PassLog {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn record(&mut self, pass: WaterPassKind) {
        match pass {
            WaterPassKind::Height => self.height = true,
            WaterPassKind::Reflection => self.reflection = true,
            WaterPassKind::Refraction => self.refraction = true,
            WaterPassKind::Surface => {}
        }
    }

    /// The surface pass needs all three offscreen results from this frame.
    fn surface_ready(&self) -> Result<(), RenderError> {
        let missing = if !self.height {
            Some(WaterPassKind::Height)
        } else if !self.reflection {
            Some(WaterPassKind::Reflection)
        } else if !self.refraction {
            Some(WaterPassKind::Refraction)
        } else {
            None
        };

        match missing {
            Some(missing) => Err(RenderError::PassOrder {
                pass: WaterPassKind::Surface,
                missing,
            }),
            None => Ok(()),
        }
    }
}

/// GPU half of the water system; absent until `initialise`.
pub struct WaterGpu {
    pub mesh: GpuMesh,
    pub normal_map: Texture,
    pub refraction: RenderTarget,
    pub reflection: RenderTarget,
    pub height: RenderTarget,
}

pub struct Water {
    settings: WaterSettings,
    min: Vec2,
    max: Vec2,
    level: f32,
    subdiv_x: u32,
    subdiv_z: u32,
    scroll: Vec2,
    log: PassLog,
    gpu: Option<WaterGpu>,
}

impl Water {
    pub fn new(
        settings: WaterSettings,
        min: Vec2,
        max: Vec2,
        level: f32,
        subdiv_x: u32,
        subdiv_z: u32,
    ) -> Self {
        Self {
            settings,
            min,
            max,
            level,
            subdiv_x: subdiv_x.max(1),
            subdiv_z: subdiv_z.max(1),
            scroll: Vec2::ZERO,
            log: PassLog::default(),
            gpu: None,
        }
    }

    /// Builds the mesh and the three offscreen targets, and adopts the
    /// caller-loaded normal map. Any failure leaves the system
    /// uninitialized; there is no partial-success mode.
    pub fn initialise(
        &mut self,
        ctx: &GraphicsContext,
        normal_map: Texture,
    ) -> Result<(), RenderError> {
        let geometry = self.build_geometry();
        let mesh = GpuMesh::new(ctx, "Water Mesh", &geometry.vertices, &geometry.indices)?;

        let gpu = WaterGpu {
            mesh,
            normal_map,
            refraction: RenderTarget::new(ctx, "Water Refraction"),
            reflection: RenderTarget::new(ctx, "Water Reflection"),
            height: RenderTarget::new(ctx, "Water Height"),
        };

        info!(
            subdiv_x = self.subdiv_x,
            subdiv_z = self.subdiv_z,
            level = self.level,
            "water surface initialised"
        );

        self.gpu = Some(gpu);
        Ok(())
    }

    pub fn build_geometry(&self) -> WaterGeometry {
        WaterGeometry::plane(self.min, self.max, self.level, self.subdiv_x, self.subdiv_z)
    }

    /// Advances the UV scroll accumulator. `dt_ms` is in milliseconds; the
    /// accumulator grows without wraparound, relying on the repeat sampler.
    pub fn update(&mut self, dt_ms: f32) {
        self.scroll.x += self.settings.scroll_rate[0] * dt_ms;
        self.scroll.y += self.settings.scroll_rate[1] * dt_ms;
    }

    pub fn uv_offset(&self) -> Vec2 {
        self.scroll
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn settings(&self) -> &WaterSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut WaterSettings {
        &mut self.settings
    }

    /// Resets the per-frame pass protocol. Must be called once per frame
    /// before any water pass is recorded.
    pub fn begin_frame(&mut self) {
        self.log.reset();
    }

    pub fn gpu(&self) -> Result<&WaterGpu, RenderError> {
        self.gpu.as_ref().ok_or(RenderError::NotInitialised {
            component: "water",
        })
    }

    /// Mutable GPU access for the water shader wrapper, which records the
    /// height pass against disjoint fields (target + mesh) of the same
    /// `WaterGpu`.
    pub(crate) fn gpu_mut(&mut self) -> Result<&mut WaterGpu, RenderError> {
        self.gpu.as_mut().ok_or(RenderError::NotInitialised {
            component: "water",
        })
    }

    pub(crate) fn mark_recorded(&mut self, pass: WaterPassKind) {
        self.log.record(pass);
    }

    /// Opens the reflection target for the externally driven mirrored-camera
    /// scene render. Record the scene, drop the pass, then call
    /// [`Water::end_reflection`].
    pub fn begin_reflection<'a>(
        &'a mut self,
        encoder: &'a mut wgpu::CommandEncoder,
        depth: Option<wgpu::RenderPassDepthStencilAttachment<'a>>,
        clear: wgpu::Color,
    ) -> Result<wgpu::RenderPass<'a>, RenderError> {
        Ok(self.gpu_mut()?.reflection.begin_write(encoder, depth, clear))
    }

    pub fn end_reflection(&mut self) -> Result<(), RenderError> {
        self.gpu_mut()?.reflection.finish_write();
        self.log.record(WaterPassKind::Reflection);
        Ok(())
    }

    /// Opens the refraction target for the clip-plane scene render.
    pub fn begin_refraction<'a>(
        &'a mut self,
        encoder: &'a mut wgpu::CommandEncoder,
        depth: Option<wgpu::RenderPassDepthStencilAttachment<'a>>,
        clear: wgpu::Color,
    ) -> Result<wgpu::RenderPass<'a>, RenderError> {
        Ok(self.gpu_mut()?.refraction.begin_write(encoder, depth, clear))
    }

    pub fn end_refraction(&mut self) -> Result<(), RenderError> {
        self.gpu_mut()?.refraction.finish_write();
        self.log.record(WaterPassKind::Refraction);
        Ok(())
    }

    /// Checks the surface pass preconditions: all three offscreen passes
    /// recorded this frame and their targets transitioned back to readable.
    pub fn surface_ready(&self) -> Result<(), RenderError> {
        self.log.surface_ready()?;
        let gpu = self.gpu()?;
        gpu.refraction.read_view()?;
        gpu.reflection.read_view()?;
        gpu.height.read_view()?;
        Ok(())
    }

    /// Recreates the offscreen targets at the context's current size.
    /// Bind groups sampling them must be rebuilt afterwards.
    pub fn resize(&mut self, ctx: &GraphicsContext) -> Result<(), RenderError> {
        let gpu = self.gpu_mut()?;
        gpu.refraction.resize(ctx);
        gpu.reflection.resize(ctx);
        gpu.height.resize(ctx);
        Ok(())
    }

    /// Releases the render targets, normal map and geometry buffers. Safe to
    /// call twice or on a never-initialised system.
    pub fn shutdown(&mut self) {
        self.gpu = None;
        self.log.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_water() -> Water {
        Water::new(
            WaterSettings::default(),
            Vec2::new(-10.0, -10.0),
            Vec2::new(10.0, 10.0),
            2.0,
            8,
            6,
        )
    }

    #[test]
    fn plane_counts_match_subdivisions() {
        let g = WaterGeometry::plane(Vec2::splat(-1.0), Vec2::splat(1.0), 0.0, 8, 6);
        assert_eq!(g.vertices.len(), 9 * 7);
        assert_eq!(g.indices.len(), 6 * 8 * 6);
        let count = g.vertices.len() as u32;
        assert!(g.indices.iter().all(|&i| i < count));
    }

    #[test]
    fn uv_is_monotonic_and_hits_corners() {
        let g = WaterGeometry::plane(Vec2::new(-4.0, -4.0), Vec2::new(4.0, 4.0), 1.0, 5, 4);
        let cols = 6;

        // U increases with X across a row, 0 at the left edge, 1 at the right.
        for j in 0..5 {
            let row = &g.vertices[j * cols..(j + 1) * cols];
            for pair in row.windows(2) {
                assert!(pair[1].uv[0] > pair[0].uv[0]);
                assert!(pair[1].position[0] > pair[0].position[0]);
            }
            assert_eq!(row[0].uv[0], 0.0);
            assert_eq!(row[cols - 1].uv[0], 1.0);
        }

        // V decreases with Z down a column, 1 at the near edge, 0 at the far.
        for i in 0..cols {
            let column: Vec<_> = (0..5).map(|j| g.vertices[j * cols + i]).collect();
            for pair in column.windows(2) {
                assert!(pair[1].uv[1] < pair[0].uv[1]);
                assert!(pair[1].position[2] > pair[0].position[2]);
            }
            assert_eq!(column[0].uv[1], 1.0);
            assert_eq!(column[4].uv[1], 0.0);
        }
    }

    #[test]
    fn vertices_sit_at_surface_level() {
        let g = WaterGeometry::plane(Vec2::splat(-2.0), Vec2::splat(2.0), 3.5, 2, 2);
        assert!(g.vertices.iter().all(|v| v.position[1] == 3.5));
        assert!(g.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn scroll_accumulates_at_configured_rates() {
        let mut water = test_water();
        water.update(100.0);
        water.update(100.0);
        let offset = water.uv_offset();
        assert!((offset.x - 0.005 * 200.0).abs() < 1e-5);
        assert!((offset.y - 0.007 * 200.0).abs() < 1e-5);
    }

    #[test]
    fn scroll_is_unbounded() {
        // No wraparound clamp: the repeat sampler handles large offsets.
        let mut water = test_water();
        for _ in 0..1000 {
            water.update(1000.0);
        }
        assert!(water.uv_offset().x > 1000.0);
    }

    #[test]
    fn surface_rejected_before_offscreen_passes() {
        let mut water = test_water();
        water.begin_frame();
        // Height pass missing first.
        match water.surface_ready() {
            Err(RenderError::PassOrder { pass, missing }) => {
                assert_eq!(pass, WaterPassKind::Surface);
                assert_eq!(missing, WaterPassKind::Height);
            }
            other => panic!("expected PassOrder, got {other:?}"),
        }

        // Recording out-of-band (no GPU in tests) via the log only.
        water.log.record(WaterPassKind::Height);
        water.log.record(WaterPassKind::Reflection);
        match water.surface_ready() {
            Err(RenderError::PassOrder { missing, .. }) => {
                assert_eq!(missing, WaterPassKind::Refraction);
            }
            other => panic!("expected PassOrder, got {other:?}"),
        }
    }

    #[test]
    fn begin_frame_clears_the_log() {
        let mut water = test_water();
        water.log.record(WaterPassKind::Height);
        water.log.record(WaterPassKind::Reflection);
        water.log.record(WaterPassKind::Refraction);
        water.begin_frame();
        assert!(water.surface_ready().is_err());
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut water = test_water();
        water.shutdown();
        water.shutdown();
        assert!(water.gpu().is_err());
    }

    #[test]
    fn uninitialised_passes_report_not_initialised() {
        let mut water = test_water();
        assert!(matches!(
            water.end_reflection(),
            Err(RenderError::NotInitialised { .. })
        ));
        assert!(matches!(
            water.end_refraction(),
            Err(RenderError::NotInitialised { .. })
        ));
    }
}
