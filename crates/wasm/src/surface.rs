//! Canvas-backed render surface.

use glow::HasContext;
use shaderkit_core::render::BuildDiagnostic;
use shaderkit_core::transform::{mvp, orbit_model, to_uniform, Projection};
use shaderkit_core::{LinkedProgram, RenderContext, SetupError, ShaderPreset};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext};

use crate::config::resolve_config;
use crate::slots::ProgramSlots;

fn report(message: &str) -> JsError {
    web_sys::console::error_1(&JsValue::from_str(message));
    JsError::new(message)
}

fn build_error(diagnostic: &BuildDiagnostic) -> JsError {
    let prefix = match diagnostic.stage() {
        Some(stage) => format!("{stage} shader failed to compile"),
        None => "program failed to link".to_string(),
    };
    report(&format!("{prefix}:\n{}", diagnostic.message()))
}

fn acquire_webgl2(canvas: &HtmlCanvasElement) -> Result<WebGl2RenderingContext, SetupError> {
    canvas
        .get_context("webgl2")
        .map_err(|_| SetupError::Unavailable("getContext(\"webgl2\") threw".into()))?
        .ok_or_else(|| SetupError::Unavailable("WebGL2 is not supported by this browser".into()))?
        .dyn_into::<WebGl2RenderingContext>()
        .map_err(|_| SetupError::Unavailable("context is not a WebGL2RenderingContext".into()))
}

/// A WebGL2 canvas plus the programs built on it.
#[wasm_bindgen]
pub struct Surface {
    context: RenderContext<glow::Context>,
    programs: ProgramSlots<LinkedProgram<glow::Program>>,
    projection: Projection,
}

#[wasm_bindgen]
impl Surface {
    /// Acquires a WebGL2 context from `canvas`.
    ///
    /// `config_json` is an optional JSON object (`width`, `height`,
    /// `clear_color`, `depth_test`). A missing `width` or `height` is taken
    /// from the canvas; other missing keys take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config_json: Option<String>) -> Result<Surface, JsError> {
        let config = resolve_config(config_json.as_deref(), canvas.width(), canvas.height())
            .map_err(|e| report(&e.to_string()))?;

        let webgl = acquire_webgl2(&canvas).map_err(|e| report(&e.to_string()))?;
        canvas.set_width(config.width);
        canvas.set_height(config.height);

        let gl = glow::Context::from_webgl2_context(webgl);
        let context = RenderContext::new(gl, config).map_err(|e| report(&e.to_string()))?;
        Ok(Surface {
            context,
            programs: ProgramSlots::new(),
            projection: Projection::default(),
        })
    }

    /// Compiles and links a pair, returning its program id.
    #[wasm_bindgen(js_name = buildProgram)]
    pub fn build_program(&mut self, vertex_src: &str, fragment_src: &str) -> Result<u32, JsError> {
        let program = self
            .context
            .programs()
            .build(vertex_src, fragment_src)
            .map_err(|d| build_error(&d))?;
        self.store(program)
    }

    /// Builds a stock pair by name (see `presetNames`).
    #[wasm_bindgen(js_name = buildPreset)]
    pub fn build_preset(&mut self, name: &str) -> Result<u32, JsError> {
        let preset = ShaderPreset::from_name(name).map_err(|e| report(&e.to_string()))?;
        let program = self
            .context
            .programs()
            .build_preset(preset)
            .map_err(|d| build_error(&d))?;
        self.store(program)
    }

    /// Deletes a program. Returns false for an unknown or already-released id.
    #[wasm_bindgen(js_name = releaseProgram)]
    pub fn release_program(&mut self, id: u32) -> bool {
        match self.programs.take(id) {
            Some(program) => {
                program.release(self.context.gl());
                true
            }
            None => false,
        }
    }

    #[wasm_bindgen(js_name = programCount)]
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    #[wasm_bindgen(js_name = useProgram)]
    pub fn use_program(&self, id: u32) -> Result<(), JsError> {
        let program = self.program(id)?;
        // SAFETY: `program` came from this context and has not been released.
        unsafe {
            self.context.gl().use_program(Some(program));
        }
        Ok(())
    }

    /// Uploads a column-major 4x4 matrix to the named uniform of a program.
    /// A uniform the linker optimised away is silently skipped, as in GL.
    #[wasm_bindgen(js_name = setMatrix)]
    pub fn set_matrix(&self, id: u32, name: &str, values: &[f32]) -> Result<(), JsError> {
        if values.len() != 16 {
            return Err(report(&format!("{name}: expected 16 floats, got {}", values.len())));
        }
        let program = self.program(id)?;
        let gl = self.context.gl();
        // SAFETY: as in `use_program`; `values` holds exactly 16 floats.
        unsafe {
            gl.use_program(Some(program));
            let location = gl.get_uniform_location(program, name);
            gl.uniform_matrix_4_f32_slice(location.as_ref(), false, values);
        }
        Ok(())
    }

    /// Projection times an orbit model matrix, sized to the current aspect.
    #[wasm_bindgen(js_name = orbitMvp)]
    pub fn orbit_mvp(&self, distance: f32, tilt_x: f32, yaw_y: f32) -> Vec<f32> {
        let projection = self.projection.matrix(self.context.aspect());
        to_uniform(&mvp(projection, orbit_model(distance, tilt_x, yaw_y))).to_vec()
    }

    #[wasm_bindgen(js_name = setFieldOfView)]
    pub fn set_field_of_view(&mut self, fov_y_radians: f32) {
        self.projection.fov_y_radians = fov_y_radians;
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), JsError> {
        self.context
            .resize(width, height)
            .map_err(|e| report(&e.to_string()))
    }

    #[wasm_bindgen(js_name = setClearColor)]
    pub fn set_clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) -> Result<(), JsError> {
        self.context
            .set_clear_color([r, g, b, a])
            .map_err(|e| report(&e.to_string()))
    }

    /// Applies viewport, clear colour and depth test, then clears.
    #[wasm_bindgen(js_name = beginFrame)]
    pub fn begin_frame(&self) {
        self.context.begin_frame();
    }

    #[wasm_bindgen(js_name = supportsExtension)]
    pub fn supports_extension(&self, name: &str) -> bool {
        self.context.supports_extension(name)
    }
}

impl Surface {
    fn store(&mut self, program: LinkedProgram<glow::Program>) -> Result<u32, JsError> {
        self.programs.insert(program).map_err(|program| {
            program.release(self.context.gl());
            report("program ids exhausted; create a new Surface")
        })
    }

    fn program(&self, id: u32) -> Result<glow::Program, JsError> {
        self.programs
            .get(id)
            .map(LinkedProgram::handle)
            .ok_or_else(|| report(&format!("no program with id {id}")))
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        let gl = self.context.gl();
        for program in self.programs.drain() {
            program.release(gl);
        }
    }
}
