//! Shader stages, sources, build diagnostics and the compile/link steps.
//!
//! [`compile_shader`] and [`link_program`] are the two driver-facing steps;
//! [`compile_program`] chains them and guarantees that no intermediate
//! shader handle survives the call. Most callers go through
//! [`ShaderProgramBuilder`](super::program::ShaderProgramBuilder) instead,
//! which wraps the result in an owned [`LinkedProgram`](super::program::LinkedProgram).

use std::fmt;

use thiserror::Error;

use super::backend::ShaderBackend;

const GL_FRAGMENT_SHADER: u32 = 0x8B30;
const GL_VERTEX_SHADER: u32 = 0x8B31;

/// One half of a shader pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// The GL enum for this stage (`GL_VERTEX_SHADER` / `GL_FRAGMENT_SHADER`).
    pub const fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => GL_VERTEX_SHADER,
            ShaderStage::Fragment => GL_FRAGMENT_SHADER,
        }
    }

    /// Lowercase stage name as used in logs and diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// GLSL source text tagged with the stage it is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource<'a> {
    stage: ShaderStage,
    text: &'a str,
}

impl<'a> ShaderSource<'a> {
    pub fn new(stage: ShaderStage, text: &'a str) -> Self {
        Self { stage, text }
    }

    pub fn vertex(text: &'a str) -> Self {
        Self::new(ShaderStage::Vertex, text)
    }

    pub fn fragment(text: &'a str) -> Self {
        Self::new(ShaderStage::Fragment, text)
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Pairs a driver `log` for this source with line-numbered source text.
    /// See [`format_shader_error`].
    pub fn annotate(&self, log: &str) -> String {
        format_shader_error(self.text, log)
    }
}

/// Which step of a build failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Compile,
    Link,
}

/// Why a program could not be built.
///
/// Both variants carry the driver-provided log text unmodified. Use
/// [`ShaderSource::annotate`] to pair a compile log with numbered source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildDiagnostic {
    /// A shader stage failed to compile.
    #[error("shader compile error ({stage}):\n{log}")]
    CompileError {
        /// The stage that failed.
        stage: ShaderStage,
        /// The compiler's info log.
        log: String,
    },
    /// The program failed to link.
    #[error("shader link error:\n{log}")]
    LinkError {
        /// The linker's info log.
        log: String,
    },
}

impl BuildDiagnostic {
    pub fn phase(&self) -> BuildPhase {
        match self {
            BuildDiagnostic::CompileError { .. } => BuildPhase::Compile,
            BuildDiagnostic::LinkError { .. } => BuildPhase::Link,
        }
    }

    /// The failing stage, for compile errors.
    pub fn stage(&self) -> Option<ShaderStage> {
        match self {
            BuildDiagnostic::CompileError { stage, .. } => Some(*stage),
            BuildDiagnostic::LinkError { .. } => None,
        }
    }

    /// The raw driver log.
    pub fn message(&self) -> &str {
        match self {
            BuildDiagnostic::CompileError { log, .. } | BuildDiagnostic::LinkError { log } => log,
        }
    }
}

/// Formats a shader compilation error for human-readable debugging.
///
/// Prepends right-aligned line numbers to each line of `source`, then
/// appends the driver's error `log`, so line references in the log can be
/// matched against the GLSL. Both inputs may be empty.
pub fn format_shader_error(source: &str, log: &str) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let width = lines.len().max(1).to_string().len();

    let numbered = lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$}: {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    match (numbered.is_empty(), log.is_empty()) {
        (true, true) => String::new(),
        (true, false) => log.to_string(),
        (false, true) => numbered,
        (false, false) => format!("{numbered}\n\n{log}"),
    }
}

/// Compiles a single shader stage.
///
/// On failure the shader object is deleted before returning.
///
/// # Errors
///
/// Returns [`BuildDiagnostic::CompileError`] with the driver's info log if
/// the object cannot be created or the source fails to compile.
pub fn compile_shader<B: ShaderBackend>(
    gl: &B,
    source: &ShaderSource<'_>,
) -> Result<B::Shader, BuildDiagnostic> {
    let stage = source.stage();
    let shader = gl
        .create_shader(stage)
        .map_err(|log| BuildDiagnostic::CompileError { stage, log })?;

    gl.shader_source(shader, source.text());
    gl.compile_shader(shader);

    if gl.shader_compile_status(shader) {
        log::debug!("compiled {stage} shader {shader:?}");
        return Ok(shader);
    }

    let info_log = gl.shader_info_log(shader);
    gl.delete_shader(shader);
    log::error!(
        "{stage} shader failed to compile:\n{}",
        source.annotate(&info_log)
    );
    Err(BuildDiagnostic::CompileError {
        stage,
        log: info_log,
    })
}

/// Links a vertex and fragment shader into a program.
///
/// Both shaders are detached again after the link attempt; the program
/// keeps what it needs. On failure the program object is deleted.
///
/// # Errors
///
/// Returns [`BuildDiagnostic::LinkError`] if the program cannot be created
/// or linking fails.
pub fn link_program<B: ShaderBackend>(
    gl: &B,
    vertex: B::Shader,
    fragment: B::Shader,
) -> Result<B::Program, BuildDiagnostic> {
    let program = gl
        .create_program()
        .map_err(|log| BuildDiagnostic::LinkError { log })?;

    gl.attach_shader(program, vertex);
    gl.attach_shader(program, fragment);
    gl.link_program(program);
    gl.detach_shader(program, vertex);
    gl.detach_shader(program, fragment);

    if gl.program_link_status(program) {
        log::debug!("linked program {program:?}");
        return Ok(program);
    }

    let info_log = gl.program_info_log(program);
    gl.delete_program(program);
    log::error!("program failed to link:\n{info_log}");
    Err(BuildDiagnostic::LinkError { log: info_log })
}

/// Compiles vertex and fragment sources and links them into a program.
///
/// Shader handles are deleted before returning on every path, so only the
/// returned program (if any) remains allocated.
///
/// # Errors
///
/// Returns [`BuildDiagnostic::CompileError`] if either stage fails to
/// compile, or [`BuildDiagnostic::LinkError`] if linking fails.
pub fn compile_program<B: ShaderBackend>(
    gl: &B,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<B::Program, BuildDiagnostic> {
    let vert = compile_shader(gl, &ShaderSource::vertex(vertex_src))?;
    let frag = match compile_shader(gl, &ShaderSource::fragment(fragment_src)) {
        Ok(f) => f,
        Err(e) => {
            gl.delete_shader(vert);
            return Err(e);
        }
    };

    let result = link_program(gl, vert, frag);

    gl.delete_shader(vert);
    gl.delete_shader(frag);

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::HeadlessGl;

    const VS: &str = "attribute vec4 p; void main(){gl_Position=p;}";
    const FS: &str = "void main(){gl_FragColor=vec4(1);}";

    // --- format_shader_error ---

    #[test]
    fn format_shader_error_prepends_line_numbers() {
        let source = "#version 300 es\nvoid main() {\n}\n";
        let log = "ERROR: 0:2: syntax error";
        let formatted = format_shader_error(source, log);

        assert!(formatted.contains("1: #version 300 es"), "got:\n{formatted}");
        assert!(formatted.contains("2: void main() {"), "got:\n{formatted}");
        assert!(formatted.contains("3: }"), "got:\n{formatted}");
        assert!(formatted.ends_with(log), "expected log last, got:\n{formatted}");
    }

    #[test]
    fn format_shader_error_handles_empty_inputs() {
        assert_eq!(format_shader_error("", "some error"), "some error");
        assert_eq!(format_shader_error("void main() {}", ""), "1: void main() {}");
        assert!(format_shader_error("", "").is_empty());
    }

    #[test]
    fn format_shader_error_right_aligns_line_numbers() {
        let source = (1..=12)
            .map(|i| format!("line {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let formatted = format_shader_error(&source, "err");
        let lines: Vec<&str> = formatted.lines().collect();

        assert!(lines[0].starts_with(" 1: "), "got: '{}'", lines[0]);
        assert!(lines[9].starts_with("10: "), "got: '{}'", lines[9]);
    }

    // --- ShaderStage / ShaderSource ---

    #[test]
    fn stage_display_is_lowercase_name() {
        assert_eq!(ShaderStage::Vertex.to_string(), "vertex");
        assert_eq!(ShaderStage::Fragment.to_string(), "fragment");
    }

    #[test]
    fn stage_gl_enums_are_distinct() {
        assert_ne!(ShaderStage::Vertex.gl_enum(), ShaderStage::Fragment.gl_enum());
    }

    #[test]
    fn source_annotate_numbers_its_own_text() {
        let src = ShaderSource::fragment("precision mediump float;\nvoid main(){}");
        let annotated = src.annotate("ERROR: 0:2: oops");
        assert!(annotated.contains("2: void main(){}"), "got:\n{annotated}");
        assert!(annotated.contains("ERROR: 0:2: oops"));
    }

    // --- BuildDiagnostic ---

    #[test]
    fn compile_error_display_includes_stage_and_log() {
        let err = BuildDiagnostic::CompileError {
            stage: ShaderStage::Fragment,
            log: "undeclared identifier".into(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("fragment"), "missing stage in: {msg}");
        assert!(msg.contains("undeclared identifier"), "missing log in: {msg}");
    }

    #[test]
    fn link_error_reports_link_phase_and_no_stage() {
        let err = BuildDiagnostic::LinkError {
            log: "varying mismatch".into(),
        };
        assert_eq!(err.phase(), BuildPhase::Link);
        assert_eq!(err.stage(), None);
        assert_eq!(err.message(), "varying mismatch");
    }

    #[test]
    fn build_diagnostic_implements_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync>() {}
        assert_error::<BuildDiagnostic>();
    }

    // --- compile / link against the headless backend ---

    #[test]
    fn compile_shader_returns_handle_for_valid_source() {
        let gl = HeadlessGl::new();
        let shader = compile_shader(&gl, &ShaderSource::vertex(VS)).unwrap();
        assert!(gl.shader_compile_status(shader));
        assert_eq!(gl.live_shaders(), 1);
    }

    #[test]
    fn compile_shader_deletes_failed_shader_and_keeps_log_verbatim() {
        let gl = HeadlessGl::new();
        let err = compile_shader(&gl, &ShaderSource::vertex("not a shader")).unwrap_err();

        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(err.stage(), Some(ShaderStage::Vertex));
        assert!(err.message().starts_with("ERROR: "), "got: {}", err.message());
        assert!(
            !err.message().contains("1: not a shader"),
            "log should not be annotated: {}",
            err.message()
        );
    }

    #[test]
    fn link_program_detaches_shaders() {
        let gl = HeadlessGl::new();
        let vs = compile_shader(&gl, &ShaderSource::vertex(VS)).unwrap();
        let fs = compile_shader(&gl, &ShaderSource::fragment(FS)).unwrap();
        let program = link_program(&gl, vs, fs).unwrap();

        assert!(gl.attached_shaders(program).is_empty());
        gl.delete_shader(vs);
        gl.delete_shader(fs);
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_programs(), 1);
    }

    #[test]
    fn compile_program_fragment_failure_releases_vertex_shader() {
        let gl = HeadlessGl::new();
        let err = compile_program(&gl, VS, "void main( {").unwrap_err();

        assert_eq!(err.stage(), Some(ShaderStage::Fragment));
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_programs(), 0);
    }

    #[test]
    fn compile_program_link_failure_releases_everything() {
        let gl = HeadlessGl::new();
        let fs = "precision mediump float; varying vec4 vColor; void main(){gl_FragColor=vColor;}";
        let err = compile_program(&gl, VS, fs).unwrap_err();

        assert_eq!(err.phase(), BuildPhase::Link);
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_programs(), 0);
    }

    #[test]
    fn create_failure_surfaces_as_compile_error() {
        let gl = HeadlessGl::with_object_limit(0);
        let err = compile_program(&gl, VS, FS).unwrap_err();
        assert_eq!(err.stage(), Some(ShaderStage::Vertex));
        assert!(!err.message().is_empty());
    }

    #[test]
    fn program_create_failure_surfaces_as_link_error() {
        let gl = HeadlessGl::with_object_limit(2);
        let err = compile_program(&gl, VS, FS).unwrap_err();
        assert_eq!(err.phase(), BuildPhase::Link);
        assert_eq!(gl.live_shaders(), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn annotation_has_one_numbered_line_per_source_line(
                lines in prop::collection::vec("[a-z ;(){}]{0,20}", 1..30),
            ) {
                let source = lines.join("\n");
                let formatted = format_shader_error(&source, "");
                prop_assert_eq!(formatted.lines().count(), source.lines().count());
            }

            #[test]
            fn no_shader_handles_survive_any_build(
                vs in "[a-z_ ;(){}=0-9.]{0,40}",
                fs in "[a-z_ ;(){}=0-9.]{0,40}",
            ) {
                let gl = HeadlessGl::new();
                let result = compile_program(&gl, &vs, &fs);
                prop_assert_eq!(gl.live_shaders(), 0);
                prop_assert_eq!(gl.live_programs(), usize::from(result.is_ok()));
            }
        }
    }
}
