//! The narrow GL surface the rest of the crate talks to.
//!
//! [`ShaderBackend`] covers the shader/program calls needed to build a
//! program, [`FrameBackend`] the handful of calls that start a frame. Both
//! take `&self` like `glow::HasContext`, since a GL context is a
//! single-threaded handle with interior driver state.
//!
//! `glow::Context` implements both when the `render` feature is enabled;
//! [`HeadlessGl`](super::headless::HeadlessGl) implements them in software.

use std::fmt;

use super::shader::ShaderStage;

/// Shader and program object calls used by the program builder.
pub trait ShaderBackend {
    /// Handle to a shader object.
    type Shader: Copy + fmt::Debug;
    /// Handle to a program object.
    type Program: Copy + fmt::Debug;

    /// Allocates a shader object for `stage`.
    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    /// Replaces the source text of `shader`.
    fn shader_source(&self, shader: Self::Shader, source: &str);
    /// Compiles the current source of `shader`.
    fn compile_shader(&self, shader: Self::Shader);
    /// Whether the last compile of `shader` succeeded.
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    /// Compiler log of the last compile of `shader`.
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    /// Flags `shader` for deletion. Deletion is deferred while it is attached.
    fn delete_shader(&self, shader: Self::Shader);

    /// Allocates a program object.
    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// Links the shaders currently attached to `program`.
    fn link_program(&self, program: Self::Program);
    /// Whether the last link of `program` succeeded.
    fn program_link_status(&self, program: Self::Program) -> bool;
    /// Linker log of the last link of `program`.
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);
}

/// Per-frame state calls: viewport, clear colour, depth test, clear.
pub trait FrameBackend {
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, rgba: [f32; 4]);
    fn set_depth_test(&self, enabled: bool);
    /// Clears the colour buffer, and the depth buffer when `depth` is set.
    fn clear(&self, depth: bool);
}

#[cfg(feature = "render")]
#[allow(unsafe_code)]
mod gl {
    use glow::HasContext;

    use super::{FrameBackend, ShaderBackend, ShaderStage};

    // SAFETY (whole module): glow marks every raw GL entry point unsafe.
    // Handles passed in were produced by this same context through the
    // create_* calls below, and enum arguments come from glow constants.

    impl ShaderBackend for glow::Context {
        type Shader = glow::Shader;
        type Program = glow::Program;

        fn create_shader(&self, stage: ShaderStage) -> Result<glow::Shader, String> {
            unsafe { HasContext::create_shader(self, stage.gl_enum()) }
        }

        fn shader_source(&self, shader: glow::Shader, source: &str) {
            unsafe { HasContext::shader_source(self, shader, source) }
        }

        fn compile_shader(&self, shader: glow::Shader) {
            unsafe { HasContext::compile_shader(self, shader) }
        }

        fn shader_compile_status(&self, shader: glow::Shader) -> bool {
            unsafe { self.get_shader_compile_status(shader) }
        }

        fn shader_info_log(&self, shader: glow::Shader) -> String {
            unsafe { self.get_shader_info_log(shader) }
        }

        fn delete_shader(&self, shader: glow::Shader) {
            unsafe { HasContext::delete_shader(self, shader) }
        }

        fn create_program(&self) -> Result<glow::Program, String> {
            unsafe { HasContext::create_program(self) }
        }

        fn attach_shader(&self, program: glow::Program, shader: glow::Shader) {
            unsafe { HasContext::attach_shader(self, program, shader) }
        }

        fn detach_shader(&self, program: glow::Program, shader: glow::Shader) {
            unsafe { HasContext::detach_shader(self, program, shader) }
        }

        fn link_program(&self, program: glow::Program) {
            unsafe { HasContext::link_program(self, program) }
        }

        fn program_link_status(&self, program: glow::Program) -> bool {
            unsafe { self.get_program_link_status(program) }
        }

        fn program_info_log(&self, program: glow::Program) -> String {
            unsafe { self.get_program_info_log(program) }
        }

        fn delete_program(&self, program: glow::Program) {
            unsafe { HasContext::delete_program(self, program) }
        }
    }

    impl FrameBackend for glow::Context {
        fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
            unsafe { HasContext::viewport(self, x, y, width, height) }
        }

        fn clear_color(&self, [r, g, b, a]: [f32; 4]) {
            unsafe { HasContext::clear_color(self, r, g, b, a) }
        }

        fn set_depth_test(&self, enabled: bool) {
            unsafe {
                if enabled {
                    self.enable(glow::DEPTH_TEST);
                } else {
                    self.disable(glow::DEPTH_TEST);
                }
            }
        }

        fn clear(&self, depth: bool) {
            let mut mask = glow::COLOR_BUFFER_BIT;
            if depth {
                mask |= glow::DEPTH_BUFFER_BIT;
            }
            unsafe { HasContext::clear(self, mask) }
        }
    }

}
