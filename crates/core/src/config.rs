//! Surface configuration for a render context.
//!
//! `SurfaceConfig` holds what every scene sets up before its first frame:
//! canvas size, clear colour and whether depth testing is on. It can be
//! deserialized strictly with serde, or read leniently from a JSON object
//! with [`SurfaceConfig::from_json`], where missing or wrongly-typed keys
//! fall back to the defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SetupError;

/// Default surface width in pixels.
pub const DEFAULT_WIDTH: u32 = 800;
/// Default surface height in pixels.
pub const DEFAULT_HEIGHT: u32 = 600;
/// Default clear colour: a warm off-white.
pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.99, 0.99, 0.9, 1.0];

/// Size and per-frame state of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub clear_color: [f32; 4],
    pub depth_test: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            clear_color: DEFAULT_CLEAR_COLOR,
            depth_test: false,
        }
    }
}

impl SurfaceConfig {
    /// Reads a config from a JSON object, falling back to the default for
    /// each key that is missing or has the wrong type.
    pub fn from_json(params: &Value) -> Self {
        let defaults = Self::default();
        Self {
            width: param_u32(params, "width", defaults.width),
            height: param_u32(params, "height", defaults.height),
            clear_color: param_rgba(params, "clear_color", defaults.clear_color),
            depth_test: params
                .get("depth_test")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.depth_test),
        }
    }

    /// Parses a JSON document strictly.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::InvalidConfig` if the text is not valid JSON for
    /// this type, or any error from [`validate`](Self::validate).
    pub fn from_json_str(text: &str) -> Result<Self, SetupError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the surface has a non-zero size and a clear colour in range.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.width == 0 || self.height == 0 {
            return Err(SetupError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !self
            .clear_color
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
        {
            return Err(SetupError::InvalidClearColor(self.clear_color));
        }
        Ok(())
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

fn param_u32(params: &Value, name: &str, default: u32) -> u32 {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}

/// Reads a 4-element numeric array. Anything else yields `default`.
fn param_rgba(params: &Value, name: &str, default: [f32; 4]) -> [f32; 4] {
    let Some(items) = params.get(name).and_then(Value::as_array) else {
        return default;
    };
    let channels: Vec<f32> = items.iter().filter_map(Value::as_f64).map(|v| v as f32).collect();
    match channels.as_slice() {
        [r, g, b, a] if items.len() == 4 => [*r, *g, *b, *a],
        _ => default,
    }
}
