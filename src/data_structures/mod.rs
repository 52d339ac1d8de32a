//! Viewer data structures: models, textures, instances and the scene.
//!
//! - `model` contains vertex, mesh and material definitions and the GPU model
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds the per-instance transform uploaded for the model
//! - `scene` holds the environment and model slots filled by the loader

pub mod instance;
pub mod model;
pub mod scene;
pub mod texture;
