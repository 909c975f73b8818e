//! Error types for rendering setup.
//!
//! Shader build failures have their own type, [`BuildDiagnostic`](crate::render::BuildDiagnostic),
//! because they carry driver logs. Everything else that can go wrong while
//! preparing a context lands here.

use thiserror::Error;

/// Errors produced while configuring a render context or resolving its inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    /// Surface width or height was zero.
    #[error("invalid surface dimensions {width}x{height}: width and height must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// A clear colour channel was outside [0, 1] or not finite.
    #[error("invalid clear color {0:?}: every channel must be a finite value in [0, 1]")]
    InvalidClearColor([f32; 4]),

    /// A configuration document could not be parsed.
    #[error("invalid surface config: {0}")]
    InvalidConfig(String),

    /// The requested shader preset name is not recognised.
    #[error("unknown shader preset: {0}")]
    UnknownPreset(String),

    /// The platform could not hand out a graphics context.
    #[error("graphics context unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for SetupError {
    fn from(e: serde_json::Error) -> Self {
        SetupError::InvalidConfig(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_dimensions_includes_both_sides() {
        let err = SetupError::InvalidDimensions {
            width: 0,
            height: 480,
        };
        let msg = format!("{err}");
        assert!(msg.contains("0x480"), "expected size in message, got: {msg}");
    }

    #[test]
    fn invalid_clear_color_includes_channels() {
        let err = SetupError::InvalidClearColor([1.5, 0.0, 0.0, 1.0]);
        let msg = format!("{err}");
        assert!(msg.contains("1.5"), "missing offending channel in: {msg}");
    }

    #[test]
    fn unknown_preset_includes_name() {
        let err = SetupError::UnknownPreset("phong".into());
        assert!(err.to_string().contains("phong"));
    }

    #[test]
    fn serde_json_error_routes_to_invalid_config() {
        let bad = serde_json::from_str::<serde_json::Value>("{nope");
        let err = SetupError::from(bad.unwrap_err());
        assert!(matches!(err, SetupError::InvalidConfig(_)));
    }

    #[test]
    fn setup_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SetupError>();
    }

    #[test]
    fn setup_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<SetupError>();
    }
}
