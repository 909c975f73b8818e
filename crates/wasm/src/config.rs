//! Surface config resolution for a canvas.

use serde_json::{Map, Value};
use shaderkit_core::{SetupError, SurfaceConfig};

/// Builds the config for a canvas of `canvas_width` x `canvas_height`.
///
/// `config_json` is parsed strictly. `width` and `height` the caller leaves
/// out are taken from the canvas, so the page layout is only changed when
/// asked for. Other omitted keys take the usual defaults.
pub(crate) fn resolve_config(
    config_json: Option<&str>,
    canvas_width: u32,
    canvas_height: u32,
) -> Result<SurfaceConfig, SetupError> {
    let mut value = match config_json {
        Some(text) => serde_json::from_str(text)?,
        None => Value::Object(Map::new()),
    };
    let Some(map) = value.as_object_mut() else {
        return Err(SetupError::InvalidConfig(
            "surface config must be a JSON object".to_string(),
        ));
    };
    map.entry("width").or_insert_with(|| Value::from(canvas_width));
    map.entry("height").or_insert_with(|| Value::from(canvas_height));

    let config: SurfaceConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_json_uses_canvas_size() {
        let config = resolve_config(None, 640, 480).unwrap();
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.clear_color, SurfaceConfig::default().clear_color);
    }

    #[test]
    fn json_without_size_keeps_canvas_size() {
        let config = resolve_config(Some(r#"{"depth_test": true}"#), 640, 480).unwrap();
        assert_eq!((config.width, config.height), (640, 480));
        assert!(config.depth_test);
    }

    #[test]
    fn json_size_overrides_canvas() {
        let config = resolve_config(Some(r#"{"width": 320}"#), 640, 480).unwrap();
        assert_eq!((config.width, config.height), (320, 480));
    }

    #[test]
    fn zero_sized_canvas_is_rejected() {
        let err = resolve_config(None, 0, 150).unwrap_err();
        assert!(matches!(err, SetupError::InvalidDimensions { width: 0, .. }));
    }

    #[test]
    fn malformed_or_mistyped_json_is_invalid_config() {
        assert!(matches!(
            resolve_config(Some("{width"), 640, 480),
            Err(SetupError::InvalidConfig(_))
        ));
        assert!(matches!(
            resolve_config(Some(r#"{"width": "wide"}"#), 640, 480),
            Err(SetupError::InvalidConfig(_))
        ));
        assert!(matches!(
            resolve_config(Some("[1, 2]"), 640, 480),
            Err(SetupError::InvalidConfig(_))
        ));
    }
}
