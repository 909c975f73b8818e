//! Rendering setup: the GL seam, program building and the render context.
//!
//! # Module overview
//!
//! - [`backend`] -- `ShaderBackend` / `FrameBackend` traits (glow impl behind `render`).
//! - [`shader`] -- Stages, sources, diagnostics, compile and link steps.
//! - [`program`] -- `LinkedProgram` and `ShaderProgramBuilder`.
//! - [`context`] -- `RenderContext`, the explicit replacement for global GL state.
//! - [`headless`] -- Software backend with handle-count probes.

pub mod backend;
pub mod context;
mod glsl;
pub mod headless;
pub mod program;
pub mod shader;

// Re-export key types at the render module level for convenience.
pub use backend::{FrameBackend, ShaderBackend};
pub use context::RenderContext;
pub use headless::{HeadlessGl, HeadlessProgram, HeadlessShader};
pub use program::{LinkedProgram, ShaderProgramBuilder};
pub use shader::{
    compile_program, compile_shader, format_shader_error, link_program, BuildDiagnostic,
    BuildPhase, ShaderSource, ShaderStage,
};
