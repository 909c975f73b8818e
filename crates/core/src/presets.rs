//! Stock GLSL ES 1.00 shader pairs used by the classroom scenes.
//!
//! All presets target WebGL 1 (`attribute`/`varying`), take positions in
//! clip space after a single `mat4` uniform, and share attribute naming
//! within each pair so callers can look locations up by name.

use crate::error::SetupError;

/// Per-vertex colour, transformed by `uModelViewMatrix`.
pub const VERTEX_COLOR_VERTEX_SHADER: &str = r#"attribute vec4 aVertexPosition;
attribute vec4 aVertexColor;
uniform mat4 uModelViewMatrix;
varying lowp vec4 vColor;
void main(void) {
    gl_Position = uModelViewMatrix * aVertexPosition;
    vColor = aVertexColor;
}
"#;

pub const VERTEX_COLOR_FRAGMENT_SHADER: &str = r#"varying lowp vec4 vColor;
void main(void) {
    gl_FragColor = vColor;
}
"#;

/// Per-vertex colour with a fixed point size, for `gl.POINTS` drawing.
pub const POINT_COLOR_VERTEX_SHADER: &str = r#"attribute vec4 aPosition;
attribute vec4 aColor;
varying lowp vec4 vColor;
void main(void) {
    gl_Position = aPosition;
    gl_PointSize = 5.0;
    vColor = aColor;
}
"#;

pub const POINT_COLOR_FRAGMENT_SHADER: &str = r#"precision mediump float;
varying lowp vec4 vColor;
void main(void) {
    gl_FragColor = vColor;
}
"#;

/// 2D outline geometry in a single uniform colour.
pub const FLAT_COLOR_VERTEX_SHADER: &str = r#"attribute vec2 coordinates;
uniform mat4 rotationMatrix;
void main(void) {
    gl_Position = rotationMatrix * vec4(coordinates, 0.0, 1.0);
}
"#;

pub const FLAT_COLOR_FRAGMENT_SHADER: &str = r#"precision mediump float;
uniform vec4 color;
void main(void) {
    gl_FragColor = color;
}
"#;

/// Ambient + diffuse + specular lighting from one point light.
///
/// `u_normalMatrix` is the inverse transpose of the model matrix, see
/// [`normal_matrix`](crate::transform::normal_matrix).
pub const LIT_VERTEX_SHADER: &str = r#"attribute vec4 a_position;
attribute vec4 a_color;
attribute vec3 a_normal;

uniform mat4 u_matrix;
uniform mat4 u_normalMatrix;

varying vec4 v_color;
varying vec3 v_normal;
varying vec3 v_position;

void main() {
    gl_Position = u_matrix * a_position;
    v_color = a_color;
    v_normal = mat3(u_normalMatrix) * a_normal;
    v_position = vec3(u_matrix * a_position);
}
"#;

pub const LIT_FRAGMENT_SHADER: &str = r#"precision mediump float;

varying vec4 v_color;
varying vec3 v_normal;
varying vec3 v_position;

uniform vec3 u_lightPosition;
uniform vec3 u_lightColor;
uniform vec3 u_ambientColor;
uniform vec3 u_cameraPosition;

void main() {
    vec3 normal = normalize(v_normal);
    vec3 lightDir = normalize(u_lightPosition - v_position);

    vec3 ambient = u_ambientColor * v_color.rgb;

    float diff = max(dot(normal, lightDir), 0.0);
    vec3 diffuse = diff * u_lightColor * v_color.rgb;

    vec3 viewDir = normalize(u_cameraPosition - v_position);
    vec3 reflectDir = reflect(-lightDir, normal);
    float spec = pow(max(dot(viewDir, reflectDir), 0.0), 16.0);
    vec3 specular = spec * u_lightColor;

    gl_FragColor = vec4(ambient + diffuse + specular, v_color.a);
}
"#;

/// A named stock shader pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderPreset {
    VertexColor,
    PointColor,
    FlatColor,
    Lit,
}

const ALL: &[ShaderPreset] = &[
    ShaderPreset::VertexColor,
    ShaderPreset::PointColor,
    ShaderPreset::FlatColor,
    ShaderPreset::Lit,
];

impl ShaderPreset {
    /// Looks a preset up by its kebab-case name.
    ///
    /// Returns `SetupError::UnknownPreset` if the name is not recognised.
    pub fn from_name(name: &str) -> Result<Self, SetupError> {
        ALL.iter()
            .copied()
            .find(|p| p.name() == name)
            .ok_or_else(|| SetupError::UnknownPreset(name.to_string()))
    }

    pub fn all() -> &'static [ShaderPreset] {
        ALL
    }

    /// Names of every preset, in declaration order.
    pub fn list_names() -> Vec<&'static str> {
        ALL.iter().map(|p| p.name()).collect()
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderPreset::VertexColor => "vertex-color",
            ShaderPreset::PointColor => "point-color",
            ShaderPreset::FlatColor => "flat-color",
            ShaderPreset::Lit => "lit",
        }
    }

    pub fn vertex_source(self) -> &'static str {
        match self {
            ShaderPreset::VertexColor => VERTEX_COLOR_VERTEX_SHADER,
            ShaderPreset::PointColor => POINT_COLOR_VERTEX_SHADER,
            ShaderPreset::FlatColor => FLAT_COLOR_VERTEX_SHADER,
            ShaderPreset::Lit => LIT_VERTEX_SHADER,
        }
    }

    pub fn fragment_source(self) -> &'static str {
        match self {
            ShaderPreset::VertexColor => VERTEX_COLOR_FRAGMENT_SHADER,
            ShaderPreset::PointColor => POINT_COLOR_FRAGMENT_SHADER,
            ShaderPreset::FlatColor => FLAT_COLOR_FRAGMENT_SHADER,
            ShaderPreset::Lit => LIT_FRAGMENT_SHADER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_round_trips_every_listed_name() {
        for name in ShaderPreset::list_names() {
            let preset = ShaderPreset::from_name(name).unwrap();
            assert_eq!(preset.name(), name);
        }
    }

    #[test]
    fn from_name_unknown_returns_error() {
        let result = ShaderPreset::from_name("toon");
        assert!(matches!(result, Err(SetupError::UnknownPreset(ref n)) if n == "toon"));
    }

    #[test]
    fn list_names_includes_lit() {
        assert!(ShaderPreset::list_names().contains(&"lit"));
    }

    #[test]
    fn every_vertex_shader_writes_gl_position() {
        for preset in ShaderPreset::all() {
            assert!(
                preset.vertex_source().contains("gl_Position"),
                "{} vertex shader never sets gl_Position",
                preset.name()
            );
        }
    }

    #[test]
    fn every_fragment_shader_writes_gl_frag_color() {
        for preset in ShaderPreset::all() {
            assert!(
                preset.fragment_source().contains("gl_FragColor"),
                "{} fragment shader never sets gl_FragColor",
                preset.name()
            );
        }
    }

    #[test]
    fn point_color_sets_point_size() {
        assert!(POINT_COLOR_VERTEX_SHADER.contains("gl_PointSize"));
    }
}
