// crates/engine_render/src/error.rs

use thiserror::Error;

/// Which offscreen pass a frame-ordering violation is missing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WaterPassKind {
    Height,
    Reflection,
    Refraction,
    Surface,
}

impl std::fmt::Display for WaterPassKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WaterPassKind::Height => "height",
            WaterPassKind::Reflection => "reflection",
            WaterPassKind::Refraction => "refraction",
            WaterPassKind::Surface => "surface",
        };
        f.write_str(name)
    }
}

/// Unified failure type for the rendering core.
///
/// Resource-creation failures are fatal to the initializing call and name the
/// failing resource. Per-frame failures (pass ordering, overflowed writes,
/// read/write hazards) abort only the current render call for the affected
/// object; the caller logs and keeps the frame loop alive.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create {resource}: {reason}")]
    ResourceCreation { resource: &'static str, reason: String },

    #[error("grid dimensions must be at least 2x2, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("height map is {actual_width}x{actual_height}, terrain expects {expected_width}x{expected_height}")]
    HeightMapMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("no height map loaded")]
    MissingHeightMap,

    #[error("{component} used before initialise()")]
    NotInitialised { component: &'static str },

    #[error("{pass} pass recorded before required {missing} pass this frame")]
    PassOrder {
        pass: WaterPassKind,
        missing: WaterPassKind,
    },

    #[error("write of {requested} bytes exceeds buffer capacity of {capacity} bytes")]
    Overflow { requested: u64, capacity: u64 },

    #[error("render target '{target}' read while still bound as a write target")]
    ReadWhileWritable { target: &'static str },

    #[error("transform chain exceeds max depth {max_depth} (parent cycle?)")]
    TransformCycle { max_depth: usize },

    #[error("invalid transform node index {index}")]
    InvalidTransform { index: usize },

    #[error("frame graph validation failed: {0}")]
    FrameGraph(String),
}
