//! Sequential asset loading: first the environment, then the model.
//!
//! [`load_assets`] runs the two stages in order and reports each outcome as a
//! [`LoadEvent`]. The model stage starts only after the environment stage has
//! finished, whether it succeeded or not; a failed environment is reported and
//! the scene falls back to neutral lighting instead of stalling.
//!
//! The stages are expressed through [`AssetLoader`] so the ordering can be
//! exercised without a GPU. [`GpuAssetLoader`] is the implementation the
//! viewer uses.

use anyhow::Context as _;

use crate::{
    data_structures::model::Model,
    resources::{self, environment::EnvironmentMap},
};

/// The outcome of one loading stage.
#[derive(Debug)]
pub enum LoadEvent<E, M> {
    Environment(anyhow::Result<E>),
    Model(anyhow::Result<M>),
}

#[allow(async_fn_in_trait)]
pub trait AssetLoader {
    type Environment;
    type Model;

    async fn load_environment(&self, url: &str) -> anyhow::Result<Self::Environment>;

    async fn load_model(&self, path: &str) -> anyhow::Result<Self::Model>;
}

/// Load the environment, then the model, handing each stage result to `emit`.
///
/// `emit` is called exactly twice: once with a [`LoadEvent::Environment`] and
/// then once with a [`LoadEvent::Model`].
pub async fn load_assets<L: AssetLoader>(
    loader: &L,
    environment_url: &str,
    model_path: &str,
    mut emit: impl FnMut(LoadEvent<L::Environment, L::Model>),
) {
    log::info!("Loading environment map {environment_url}");
    let environment = loader
        .load_environment(environment_url)
        .await
        .with_context(|| format!("An error occurred while loading the environment map {environment_url}"));
    emit(LoadEvent::Environment(environment));

    log::info!("Loading model {model_path}");
    let model = loader
        .load_model(model_path)
        .await
        .with_context(|| format!("An error occurred while loading the model {model_path}"));
    emit(LoadEvent::Model(model));
}

/// Loads assets straight into GPU resources.
///
/// Device and queue are cheap clones of the renderer's handles.
#[derive(Clone, Debug)]
pub struct GpuAssetLoader {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub material_layout: wgpu::BindGroupLayout,
    pub environment_layout: wgpu::BindGroupLayout,
}

impl AssetLoader for GpuAssetLoader {
    type Environment = EnvironmentMap;
    type Model = Model;

    async fn load_environment(&self, url: &str) -> anyhow::Result<EnvironmentMap> {
        let bytes = resources::load_binary(url).await?;
        EnvironmentMap::from_hdr_bytes(&self.device, &self.queue, &self.environment_layout, &bytes, url)
    }

    async fn load_model(&self, path: &str) -> anyhow::Result<Model> {
        resources::load_model_gltf(path, &self.device, &self.queue, &self.material_layout).await
    }
}
