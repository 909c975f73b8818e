//! Render context: a GL backend plus the surface it draws to.
//!
//! `RenderContext` is the one object a scene passes around instead of
//! module-level `canvas`/`gl` globals. It hands out program builders bound
//! to its backend and performs the per-frame viewport/clear setup.

use super::backend::{FrameBackend, ShaderBackend};
use super::program::ShaderProgramBuilder;
use crate::config::SurfaceConfig;
use crate::error::SetupError;

/// Owns a GL backend and the surface configuration it renders with.
pub struct RenderContext<B> {
    gl: B,
    config: SurfaceConfig,
}

impl<B> RenderContext<B> {
    /// Wraps `gl` after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface size is zero or the clear colour is
    /// out of range.
    pub fn new(gl: B, config: SurfaceConfig) -> Result<Self, SetupError> {
        config.validate()?;
        log::debug!(
            "render context ready: {}x{}, depth test {}",
            config.width,
            config.height,
            config.depth_test
        );
        Ok(Self { gl, config })
    }

    /// Returns a reference to the underlying backend.
    pub fn gl(&self) -> &B {
        &self.gl
    }

    /// Consumes this wrapper and returns the underlying backend.
    pub fn into_gl(self) -> B {
        self.gl
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Surface width over height, for projection setup.
    pub fn aspect(&self) -> f32 {
        self.config.aspect()
    }

    /// Changes the surface size. Takes effect at the next [`begin_frame`](Self::begin_frame).
    ///
    /// # Errors
    ///
    /// Returns `SetupError::InvalidDimensions` (leaving the old size in
    /// place) if either side is zero.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SetupError> {
        let resized = SurfaceConfig {
            width,
            height,
            ..self.config
        };
        resized.validate()?;
        self.config = resized;
        Ok(())
    }

    /// Replaces the clear colour.
    pub fn set_clear_color(&mut self, rgba: [f32; 4]) -> Result<(), SetupError> {
        let updated = SurfaceConfig {
            clear_color: rgba,
            ..self.config
        };
        updated.validate()?;
        self.config = updated;
        Ok(())
    }
}

impl<B: ShaderBackend> RenderContext<B> {
    /// A program builder bound to this context's backend.
    pub fn programs(&self) -> ShaderProgramBuilder<'_, B> {
        ShaderProgramBuilder::new(&self.gl)
    }
}

impl<B: FrameBackend> RenderContext<B> {
    /// Sets viewport, clear colour and depth test from the config, then
    /// clears colour (and depth, when depth testing is on).
    pub fn begin_frame(&self) {
        let SurfaceConfig {
            width,
            height,
            clear_color,
            depth_test,
        } = self.config;
        let to_i32 = |v: u32| i32::try_from(v).unwrap_or(i32::MAX);

        self.gl.viewport(0, 0, to_i32(width), to_i32(height));
        self.gl.clear_color(clear_color);
        self.gl.set_depth_test(depth_test);
        self.gl.clear(depth_test);
    }
}

#[cfg(feature = "render")]
impl RenderContext<glow::Context> {
    /// Whether the driver advertises the named extension.
    pub fn supports_extension(&self, name: &str) -> bool {
        use glow::HasContext;

        self.gl.supported_extensions().contains(name)
    }
}
