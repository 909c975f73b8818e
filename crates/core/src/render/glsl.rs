//! Structural GLSL ES front end used by the headless backend.
//!
//! This is not a compiler. It checks what can be checked without a type
//! system: delimiter balance, the shape of top-level declarations, the
//! presence of `main`, stage-specific qualifiers, and the varying interface
//! a stage exposes so that linking can compare the two halves.

use super::shader::ShaderStage;

/// The `#version` a stage was written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlslVersion {
    /// GLSL ES 1.00 (WebGL 1), the default when no directive is present.
    Es100,
    /// GLSL ES 3.00 (WebGL 2).
    Es300,
}

impl GlslVersion {
    pub fn label(self) -> &'static str {
        match self {
            GlslVersion::Es100 => "100",
            GlslVersion::Es300 => "300 es",
        }
    }
}

/// A varying declared at global scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Varying {
    pub ty: String,
    pub name: String,
}

/// What a successfully checked stage exposes to the linker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInterface {
    pub version: GlslVersion,
    /// Varyings written by a vertex stage.
    pub outputs: Vec<Varying>,
    /// Varyings read by a fragment stage.
    pub inputs: Vec<Varying>,
}

/// A compile error at a source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    line: usize,
    token: String,
    reason: String,
}

impl CompileFailure {
    fn new(line: usize, token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            line,
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Driver-style info log line: `ERROR: 0:<line>: '<token>' : <reason>`.
    pub fn log(&self) -> String {
        format!(
            "ERROR: 0:{}: '{}' : {}\nERROR: 1 compilation errors.  No code generated.\n",
            self.line, self.token, self.reason
        )
    }
}

const QUALIFIERS: &[&str] = &[
    "attribute",
    "varying",
    "uniform",
    "const",
    "in",
    "out",
    "inout",
    "invariant",
    "flat",
    "smooth",
    "centroid",
    "highp",
    "mediump",
    "lowp",
];

const SCALAR_TYPES: &[&str] = &["void", "bool", "int", "uint", "float"];

const TYPE_PREFIXES: &[&str] = &[
    "vec", "ivec", "uvec", "bvec", "mat", "sampler", "isampler", "usampler",
];

fn is_qualifier(token: &str) -> bool {
    QUALIFIERS.contains(&token)
}

fn is_builtin_type(token: &str) -> bool {
    SCALAR_TYPES.contains(&token) || TYPE_PREFIXES.iter().any(|p| token.starts_with(p))
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Checks `source` as a shader for `stage`.
pub fn analyze(stage: ShaderStage, source: &str) -> Result<ShaderInterface, CompileFailure> {
    if source.trim().is_empty() {
        return Err(CompileFailure::new(0, "", "empty shader source"));
    }

    let stripped = strip_comments(source);
    let (version, body) = split_directives(&stripped)?;

    let mut scanner = Scanner {
        stage,
        version,
        struct_types: Vec::new(),
        has_main: false,
        pending_block: false,
        outputs: Vec::new(),
        inputs: Vec::new(),
    };
    scanner.scan(&body)?;

    Ok(ShaderInterface {
        version,
        outputs: scanner.outputs,
        inputs: scanner.inputs,
    })
}

/// Compares the varying interface of a vertex and a fragment stage.
///
/// Returns the linker log on failure.
pub fn link(vertex: &ShaderInterface, fragment: &ShaderInterface) -> Result<(), String> {
    if vertex.version != fragment.version {
        return Err(format!(
            "ERROR: Shader versions do not match: vertex is {}, fragment is {}.\n",
            vertex.version.label(),
            fragment.version.label()
        ));
    }

    let errors: Vec<String> = fragment
        .inputs
        .iter()
        .filter_map(|input| {
            match vertex.outputs.iter().find(|out| out.name == input.name) {
                None => Some(format!(
                    "ERROR: Varying '{}' is read by the fragment shader but not written by the vertex shader.",
                    input.name
                )),
                Some(out) if out.ty != input.ty => Some(format!(
                    "ERROR: Types of varying '{}' differ between shaders: vertex declares {}, fragment declares {}.",
                    input.name, out.ty, input.ty
                )),
                Some(_) => None,
            }
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("\n") + "\n")
    }
}

/// Replaces comments with nothing, keeping newlines so line numbers survive.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        let next = chars.peek().copied();
        match (c, next) {
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

/// Blanks out preprocessor lines, returning the declared version.
fn split_directives(source: &str) -> Result<(GlslVersion, String), CompileFailure> {
    let mut version = GlslVersion::Es100;
    let mut body = String::with_capacity(source.len());

    for (i, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        if let Some(directive) = trimmed.strip_prefix('#') {
            let mut words = directive.split_whitespace();
            if words.next() == Some("version") {
                let rest: Vec<&str> = words.collect();
                version = match rest.as_slice() {
                    ["100"] => GlslVersion::Es100,
                    ["300", "es"] => GlslVersion::Es300,
                    _ => {
                        return Err(CompileFailure::new(
                            i + 1,
                            rest.join(" "),
                            "version number not supported",
                        ))
                    }
                };
            }
        } else {
            body.push_str(line);
        }
        body.push('\n');
    }

    Ok((version, body))
}

enum Direction {
    Out,
    In,
}

struct Scanner {
    stage: ShaderStage,
    version: GlslVersion,
    struct_types: Vec<String>,
    has_main: bool,
    /// Set after a struct or interface block body; the next top-level
    /// statement is its (optional) instance list.
    pending_block: bool,
    outputs: Vec<Varying>,
    inputs: Vec<Varying>,
}

impl Scanner {
    fn scan(&mut self, body: &str) -> Result<(), CompileFailure> {
        let mut line = 1;
        let mut braces = 0usize;
        let mut parens = 0usize;
        let mut stmt = String::new();
        let mut stmt_line = 1;

        for c in body.chars() {
            match c {
                '\n' => {
                    line += 1;
                    if braces == 0 {
                        stmt.push(' ');
                    }
                    continue;
                }
                '(' => parens += 1,
                ')' => {
                    parens = parens
                        .checked_sub(1)
                        .ok_or_else(|| CompileFailure::new(line, ")", "syntax error"))?;
                }
                '{' => {
                    if braces == 0 {
                        self.block_header(&stmt, stmt_line, line)?;
                        stmt.clear();
                    }
                    braces += 1;
                    continue;
                }
                '}' => {
                    braces = braces
                        .checked_sub(1)
                        .ok_or_else(|| CompileFailure::new(line, "}", "syntax error"))?;
                    continue;
                }
                ';' if braces == 0 && parens == 0 => {
                    self.declaration(&stmt, stmt_line)?;
                    stmt.clear();
                    continue;
                }
                _ => {}
            }

            if braces == 0 {
                if stmt.trim().is_empty() && !c.is_whitespace() {
                    stmt_line = line;
                }
                stmt.push(c);
            }
        }

        if braces > 0 {
            return Err(CompileFailure::new(line, "}", "unexpected end of source, missing '}'"));
        }
        if parens > 0 {
            return Err(CompileFailure::new(line, ")", "unexpected end of source, missing ')'"));
        }
        if let Some(token) = stmt.split_whitespace().next() {
            return Err(CompileFailure::new(stmt_line, token, "syntax error"));
        }
        if self.pending_block {
            return Err(CompileFailure::new(line, "}", "unexpected end of source, missing ';'"));
        }
        if !self.has_main {
            return Err(CompileFailure::new(line, "main", "Missing main()"));
        }
        Ok(())
    }

    fn is_leading_keyword(&self, token: &str) -> bool {
        is_qualifier(token)
            || is_builtin_type(token)
            || matches!(token, "precision" | "struct" | "layout")
            || self.struct_types.iter().any(|t| t == token)
    }

    /// Handles the text before a top-level `{`: a function, struct or block.
    fn block_header(&mut self, header: &str, header_line: usize, line: usize) -> Result<(), CompileFailure> {
        let Some(first) = header.split_whitespace().next() else {
            return Err(CompileFailure::new(line, "{", "syntax error"));
        };
        if self.pending_block {
            return Err(CompileFailure::new(header_line, first, "syntax error"));
        }

        let is_layout = first.starts_with("layout");
        if !header.contains('(') || is_layout {
            let words: Vec<&str> = header.split_whitespace().collect();
            return match words.as_slice() {
                ["struct", name] if is_identifier(name) => {
                    self.struct_types.push((*name).to_string());
                    self.pending_block = true;
                    Ok(())
                }
                [.., name] if is_qualifier(first) || is_layout => {
                    self.struct_types.push((*name).to_string());
                    self.pending_block = true;
                    Ok(())
                }
                _ => Err(CompileFailure::new(header_line, first, "syntax error")),
            };
        }

        let open = header.find('(').unwrap_or(header.len());
        let signature: Vec<&str> = header[..open].split_whitespace().collect();
        let (Some(name), true) = (signature.last(), signature.len() >= 2) else {
            return Err(CompileFailure::new(header_line, first, "syntax error"));
        };
        if !self.is_leading_keyword(first) {
            return Err(CompileFailure::new(header_line, first, "syntax error"));
        }

        if *name == "main" {
            if signature.as_slice() != ["void", "main"] {
                return Err(CompileFailure::new(header_line, "main", "main function cannot return a value"));
            }
            if self.has_main {
                return Err(CompileFailure::new(header_line, "main", "function already has a body"));
            }
            self.has_main = true;
        }
        Ok(())
    }

    /// Handles one `;`-terminated top-level statement.
    fn declaration(&mut self, stmt: &str, line: usize) -> Result<(), CompileFailure> {
        if std::mem::take(&mut self.pending_block) {
            return instance_names(stmt, line);
        }

        let stmt = strip_layout(stmt);
        let decl = stmt.split('=').next().unwrap_or_default();
        let tokens: Vec<&str> = decl.split_whitespace().collect();
        let Some(&first) = tokens.first() else {
            return Ok(());
        };

        if !self.is_leading_keyword(first) {
            return Err(CompileFailure::new(line, first, "syntax error"));
        }
        if first == "precision" {
            return Ok(());
        }

        if self.version == GlslVersion::Es300 {
            if let Some(word) = tokens.iter().find(|t| matches!(**t, "attribute" | "varying")) {
                return Err(CompileFailure::new(line, *word, "Illegal use of reserved word"));
            }
        }
        if self.stage == ShaderStage::Fragment && tokens.contains(&"attribute") {
            return Err(CompileFailure::new(
                line,
                "attribute",
                "supported in vertex shaders only",
            ));
        }

        let direction = match (self.version, self.stage) {
            (GlslVersion::Es100, ShaderStage::Vertex) if tokens.contains(&"varying") => Some(Direction::Out),
            (GlslVersion::Es100, ShaderStage::Fragment) if tokens.contains(&"varying") => Some(Direction::In),
            (GlslVersion::Es300, ShaderStage::Vertex) if tokens.contains(&"out") => Some(Direction::Out),
            (GlslVersion::Es300, ShaderStage::Fragment) if tokens.contains(&"in") => Some(Direction::In),
            _ => None,
        };
        let Some(direction) = direction else {
            return Ok(());
        };

        let rest: Vec<&str> = tokens.iter().copied().filter(|t| !is_qualifier(t)).collect();
        let Some((ty, names)) = rest.split_first() else {
            return Err(CompileFailure::new(line, first, "syntax error"));
        };
        if names.is_empty() {
            return Err(CompileFailure::new(line, *ty, "syntax error"));
        }

        for raw in names.join(" ").split(',') {
            let raw = raw.trim();
            let (name, array) = match raw.find('[') {
                Some(i) => (raw[..i].trim(), raw[i..].split_whitespace().collect::<String>()),
                None => (raw, String::new()),
            };
            if !is_identifier(name) {
                return Err(CompileFailure::new(line, name, "syntax error"));
            }
            let varying = Varying {
                ty: format!("{ty}{array}"),
                name: name.to_string(),
            };
            match direction {
                Direction::Out => self.outputs.push(varying),
                Direction::In => self.inputs.push(varying),
            }
        }
        Ok(())
    }
}

/// Checks the optional instance list after a struct or block body
/// (`} light, lights[4];`).
fn instance_names(stmt: &str, line: usize) -> Result<(), CompileFailure> {
    if stmt.trim().is_empty() {
        return Ok(());
    }
    for raw in stmt.split(',') {
        let raw = raw.trim();
        let name = raw.find('[').map_or(raw, |i| raw[..i].trim());
        if !is_identifier(name) {
            let token = raw.split_whitespace().next().unwrap_or(",");
            return Err(CompileFailure::new(line, token, "syntax error"));
        }
    }
    Ok(())
}

/// Removes a `layout(...)` qualifier from a declaration.
fn strip_layout(decl: &str) -> String {
    match decl.find("layout") {
        Some(start) => match decl[start..].find(')') {
            Some(end) => format!("{} {}", &decl[..start], &decl[start + end + 1..]),
            None => decl.to_string(),
        },
        None => decl.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(src: &str) -> Result<ShaderInterface, CompileFailure> {
        analyze(ShaderStage::Vertex, src)
    }

    fn fragment(src: &str) -> Result<ShaderInterface, CompileFailure> {
        analyze(ShaderStage::Fragment, src)
    }

    #[test]
    fn accepts_minimal_pair() {
        assert!(vertex("attribute vec4 p; void main(){gl_Position=p;}").is_ok());
        assert!(fragment("void main(){gl_FragColor=vec4(1);}").is_ok());
    }

    #[test]
    fn rejects_prose_with_line_and_token() {
        let err = vertex("not a shader").unwrap_err();
        assert_eq!(err.log().lines().next(), Some("ERROR: 0:1: 'not' : syntax error"));
    }

    #[test]
    fn rejects_empty_source() {
        let err = vertex("   \n\t").unwrap_err();
        assert!(err.log().contains("empty shader source"));
    }

    #[test]
    fn rejects_missing_main() {
        let err = fragment("precision mediump float;\nuniform vec4 color;\n").unwrap_err();
        assert!(err.log().contains("'main'"), "got: {}", err.log());
    }

    #[test]
    fn rejects_unbalanced_braces() {
        assert!(vertex("void main() { gl_Position = vec4(0.0);").is_err());
        assert!(vertex("void main() { } }").is_err());
    }

    #[test]
    fn rejects_unknown_top_level_word_on_its_line() {
        let err = vertex("attribute vec4 p;\nfoo bar;\nvoid main(){}").unwrap_err();
        assert!(err.log().starts_with("ERROR: 0:2: 'foo'"), "got: {}", err.log());
    }

    #[test]
    fn rejects_attribute_in_fragment_stage() {
        let err = fragment("attribute vec4 p; void main(){}").unwrap_err();
        assert!(err.log().contains("vertex shaders only"), "got: {}", err.log());
    }

    #[test]
    fn rejects_varying_keyword_in_es300() {
        let err = vertex("#version 300 es\nvarying vec4 v;\nvoid main(){}").unwrap_err();
        assert!(err.log().starts_with("ERROR: 0:2: 'varying'"), "got: {}", err.log());
    }

    #[test]
    fn rejects_unsupported_version() {
        let err = vertex("#version 450\nvoid main(){}").unwrap_err();
        assert!(err.log().contains("version number not supported"));
    }

    #[test]
    fn ignores_comments_and_function_bodies() {
        let src = "// header\n/* block\n comment */\nattribute vec4 p;\nvoid main() {\n  float x = 1.0; /* } */\n  gl_Position = p;\n}\n";
        assert!(vertex(src).is_ok());
    }

    #[test]
    fn collects_es100_varyings_without_precision() {
        let iface = vertex(
            "attribute vec4 a;\nvarying lowp vec4 vColor;\nvarying vec3 v_normal, v_position;\nvoid main(){}",
        )
        .unwrap();
        let names: Vec<&str> = iface.outputs.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["vColor", "v_normal", "v_position"]);
        assert_eq!(iface.outputs[0].ty, "vec4");
        assert!(iface.inputs.is_empty());
    }

    #[test]
    fn collects_es300_in_out_by_stage() {
        let vs = vertex("#version 300 es\nin vec3 a_pos;\nout vec2 v_uv;\nvoid main(){}").unwrap();
        assert_eq!(vs.version, GlslVersion::Es300);
        assert_eq!(vs.outputs.len(), 1, "vertex `in` is an attribute, not a varying");

        let fs = fragment(
            "#version 300 es\nprecision highp float;\nin vec2 v_uv;\nlayout(location = 0) out vec4 color;\nvoid main(){}",
        )
        .unwrap();
        assert_eq!(fs.inputs, vec![Varying { ty: "vec2".into(), name: "v_uv".into() }]);
    }

    #[test]
    fn accepts_structs_and_helper_functions() {
        let src = "struct Light { vec3 pos; vec3 color; };\nuniform Light u_light;\nLight pick(Light l) { return l; }\nfloat half_of(float x);\nvoid main(){}";
        assert!(fragment(src).is_ok());
    }

    #[test]
    fn accepts_struct_instance_list() {
        let src = "struct Light { vec3 pos; } key, fill[2];\nvoid main(){}";
        assert!(fragment(src).is_ok());
    }

    #[test]
    fn rejects_struct_without_semicolon_before_function() {
        let err = fragment("struct S { float a; }\nvoid main(){}").unwrap_err();
        assert_eq!(err.log().lines().next(), Some("ERROR: 0:2: 'void' : syntax error"));
    }

    #[test]
    fn struct_without_semicolon_does_not_swallow_next_declaration() {
        let err = vertex("struct S { float a; }\nuniform float u;\nvoid main(){}").unwrap_err();
        assert_eq!(err.log().lines().next(), Some("ERROR: 0:2: 'uniform' : syntax error"));
    }

    #[test]
    fn rejects_struct_left_open_at_end_of_source() {
        let err = vertex("void main(){}\nstruct S { float a; }").unwrap_err();
        assert!(err.log().contains("missing ';'"));
    }

    #[test]
    fn rejects_second_main() {
        let err = vertex("void main(){}\nvoid main(){}").unwrap_err();
        assert!(err.log().contains("already has a body"));
    }

    #[test]
    fn link_accepts_matching_interface() {
        let vs = vertex("varying vec4 v; void main(){}").unwrap();
        let fs = fragment("varying vec4 v; void main(){}").unwrap();
        assert_eq!(link(&vs, &fs), Ok(()));
    }

    #[test]
    fn link_allows_unused_vertex_outputs() {
        let vs = vertex("varying vec4 v; varying vec3 n; void main(){}").unwrap();
        let fs = fragment("varying vec4 v; void main(){}").unwrap();
        assert!(link(&vs, &fs).is_ok());
    }

    #[test]
    fn link_reports_missing_and_mistyped_varyings() {
        let vs = vertex("varying vec4 v; void main(){}").unwrap();
        let fs = fragment("varying vec3 v; varying vec2 uv; void main(){}").unwrap();
        let log = link(&vs, &fs).unwrap_err();
        assert!(log.contains("Types of varying 'v'"), "got: {log}");
        assert!(log.contains("Varying 'uv'"), "got: {log}");
    }

    #[test]
    fn link_reports_version_mismatch() {
        let vs = vertex("#version 300 es\nvoid main(){}").unwrap();
        let fs = fragment("void main(){}").unwrap();
        assert!(link(&vs, &fs).unwrap_err().contains("versions do not match"));
    }
}
