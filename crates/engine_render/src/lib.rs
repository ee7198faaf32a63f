// crates/engine_render/src/lib.rs

// Core GPU plumbing
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod uniform;

// Resources
pub mod dynamic_buffer;
pub mod mesh;
pub mod render_target;
pub mod texture;

// Renderables
pub mod terrain;
pub mod water;

// Frame orchestration helpers
pub mod frame;
pub mod transform;

// Per-effect shader wrappers
pub mod passes;

// Re-export the handles callers touch every frame
pub use context::GraphicsContext;
pub use error::RenderError;
