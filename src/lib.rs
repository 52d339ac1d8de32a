//! helmet-viewer
//!
//! A small cross-platform (native and WASM) viewer that renders a single glTF
//! model lit by an HDRI environment map. Every frame goes through a fixed
//! two-stage post-processing chain (scene pass, then an RGB shift) and the
//! model tilts towards the pointer with an eased rotation.
//!
//! High-level modules
//! - `camera`: perspective camera, projection and the view uniform
//! - `config`: compile-time defaults handed to [`flow::run`]
//! - `context`: window surface plus the [`render::Renderer`] that draws into it
//! - `data_structures`: meshes, materials, textures, instances and the scene
//! - `flow`: the winit event loop driving loading, input, resize and redraw
//! - `interaction`: pointer-to-rotation mapping and the eased rotation tween
//! - `loader`: the sequential environment-then-model loading pipeline
//! - `pipelines`: the PBR scene pipeline and the post-processing composer
//! - `resources`: helpers to fetch and decode HDRI and glTF assets
//! - `render`: per-frame GPU updates and the composed draw
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod interaction;
pub mod loader;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use config::ViewerConfig;
pub use flow::run;
pub use winit::dpi::{PhysicalPosition, PhysicalSize};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    run(ViewerConfig::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
