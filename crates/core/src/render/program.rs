//! Owned program handles and the single-shot program builder.

use super::backend::ShaderBackend;
use super::shader::{compile_program, BuildDiagnostic, ShaderSource, ShaderStage};
use crate::presets::ShaderPreset;

/// A successfully linked program.
///
/// Owned by the caller, who must hand it back with [`LinkedProgram::release`]
/// on the backend that built it. GL objects have no destructor tied to the
/// handle, so dropping this without releasing leaks the driver object until
/// the context goes away.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a linked program must be released on the backend that built it"]
pub struct LinkedProgram<P> {
    handle: P,
}

impl<P: Copy> LinkedProgram<P> {
    /// The raw program handle, for `use_program` and location lookups.
    pub fn handle(&self) -> P {
        self.handle
    }

    /// Deletes the program on `gl`.
    pub fn release<B>(self, gl: &B)
    where
        B: ShaderBackend<Program = P>,
    {
        gl.delete_program(self.handle);
    }
}

/// Builds linked programs from vertex/fragment source text.
///
/// Holds nothing but a borrow of the backend: every call to
/// [`build`](Self::build) compiles and links from scratch and returns an
/// independent program.
pub struct ShaderProgramBuilder<'gl, B> {
    gl: &'gl B,
}

impl<'gl, B: ShaderBackend> ShaderProgramBuilder<'gl, B> {
    pub fn new(gl: &'gl B) -> Self {
        Self { gl }
    }

    /// Compiles both stages and links them.
    ///
    /// # Errors
    ///
    /// [`BuildDiagnostic::CompileError`] naming the first stage that failed,
    /// or [`BuildDiagnostic::LinkError`]. No shader or program object is left
    /// allocated on failure.
    pub fn build(
        &self,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<LinkedProgram<B::Program>, BuildDiagnostic> {
        compile_program(self.gl, vertex_src, fragment_src).map(|handle| LinkedProgram { handle })
    }

    /// Like [`build`](Self::build), but takes stage-tagged sources and rejects
    /// a pair whose stages are not vertex then fragment before touching the
    /// driver.
    pub fn build_sources(
        &self,
        vertex: &ShaderSource<'_>,
        fragment: &ShaderSource<'_>,
    ) -> Result<LinkedProgram<B::Program>, BuildDiagnostic> {
        for (source, expected) in [(vertex, ShaderStage::Vertex), (fragment, ShaderStage::Fragment)] {
            if source.stage() != expected {
                return Err(BuildDiagnostic::CompileError {
                    stage: source.stage(),
                    log: format!(
                        "expected a {expected} shader source in this position, got a {} shader",
                        source.stage()
                    ),
                });
            }
        }
        self.build(vertex.text(), fragment.text())
    }

    /// Builds one of the stock shader pairs.
    pub fn build_preset(
        &self,
        preset: ShaderPreset,
    ) -> Result<LinkedProgram<B::Program>, BuildDiagnostic> {
        self.build(preset.vertex_source(), preset.fragment_source())
    }
}
