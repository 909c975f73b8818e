#![deny(unsafe_code)]
//! Rendering-setup helpers for WebGL / OpenGL ES.
//!
//! Provides `ShaderProgramBuilder` (compile + link with structured
//! diagnostics and no leaked intermediate handles), `RenderContext` (backend
//! plus `SurfaceConfig`, replacing ambient GL globals), stock shader presets,
//! and glam matrix helpers for uniform setup. Enable the `render` feature to
//! use a live `glow::Context`; `HeadlessGl` works without a GPU.

pub mod config;
pub mod error;
pub mod presets;
pub mod render;
pub mod transform;

pub use config::SurfaceConfig;
pub use error::SetupError;
pub use presets::ShaderPreset;
pub use render::{
    BuildDiagnostic, BuildPhase, HeadlessGl, LinkedProgram, RenderContext, ShaderBackend,
    ShaderProgramBuilder, ShaderSource, ShaderStage,
};
pub use transform::Projection;
