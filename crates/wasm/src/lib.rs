//! WebAssembly bindings for shaderkit.
//!
//! Wraps a canvas's WebGL2 context in a [`Surface`] that builds programs and
//! runs per-frame setup from JavaScript.
//!
//! ## Example
//!
//! ```js
//! import { Surface, presetNames } from 'shaderkit-wasm';
//!
//! const surface = new Surface(document.getElementById('glcanvas'),
//!   '{"width": 640, "height": 480, "depth_test": true}');
//!
//! const id = surface.buildPreset('lit');
//! surface.beginFrame();
//! surface.useProgram(id);
//! surface.setMatrix(id, "u_matrix", surface.orbitMvp(3.0, 0.5, 0.0));
//! surface.releaseProgram(id);
//! ```

use shaderkit_core::ShaderPreset;
use wasm_bindgen::prelude::*;

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod config;
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
mod slots;
#[cfg(target_arch = "wasm32")]
mod surface;

#[cfg(target_arch = "wasm32")]
pub use surface::Surface;

/// Installs the panic hook for readable panics in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(debug_assertions)]
    console_error_panic_hook::set_once();
}

#[wasm_bindgen(js_name = version)]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Names accepted by `Surface.buildPreset`.
#[wasm_bindgen(js_name = presetNames)]
pub fn preset_names() -> Vec<String> {
    ShaderPreset::list_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}
