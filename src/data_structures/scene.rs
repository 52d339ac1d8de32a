//! The scene: one environment slot and one model slot.
//!
//! Both slots start empty and are filled exactly once by the loading
//! pipeline. Everything that reads the model has to cope with it being absent
//! because the load resolves asynchronously (or never, if it failed).

use anyhow::{Context as _, bail};
use cgmath::{Euler, Quaternion, Rad, Vector3};

use crate::{data_structures::instance::Instance, interaction::Tilt, loader::LoadEvent};

/// The single model placed in the scene together with its transform.
#[derive(Debug)]
pub struct ModelNode<M> {
    pub asset: M,
    pub position: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub rotation: Euler<Rad<f32>>,
}

impl<M> ModelNode<M> {
    /// Place `asset` at the origin with unit scale and no rotation.
    pub fn new(asset: M) -> Self {
        Self {
            asset,
            position: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            rotation: Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
        }
    }

    pub fn tilt(&self) -> Tilt {
        Tilt {
            pitch: self.rotation.x.0,
            yaw: self.rotation.y.0,
        }
    }

    pub fn set_tilt(&mut self, tilt: Tilt) {
        self.rotation.x = Rad(tilt.pitch);
        self.rotation.y = Rad(tilt.yaw);
    }

    pub fn instance(&self) -> Instance {
        Instance {
            position: self.position,
            rotation: Quaternion::from(self.rotation),
            scale: self.scale,
        }
    }
}

/// Which slot a successfully applied [`LoadEvent`] filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Environment,
    Model,
}

#[derive(Debug)]
pub struct Scene<E, M> {
    environment: Option<E>,
    model: Option<ModelNode<M>>,
}

impl<E, M> Default for Scene<E, M> {
    fn default() -> Self {
        Self {
            environment: None,
            model: None,
        }
    }
}

impl<E, M> Scene<E, M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment(&self) -> Option<&E> {
        self.environment.as_ref()
    }

    /// Fill the environment slot. It can only be written once.
    pub fn set_environment(&mut self, environment: E) -> anyhow::Result<()> {
        if self.environment.is_some() {
            bail!("The scene environment has already been set");
        }
        self.environment = Some(environment);
        Ok(())
    }

    pub fn model(&self) -> Option<&ModelNode<M>> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut ModelNode<M>> {
        self.model.as_mut()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Add the model at the origin with unit scale. A second model is rejected.
    pub fn insert_model(&mut self, asset: M) -> anyhow::Result<&mut ModelNode<M>> {
        if self.model.is_some() {
            bail!("The scene already contains a model");
        }
        Ok(self.model.insert(ModelNode::new(asset)))
    }

    /// Apply one stage result of the loading pipeline.
    ///
    /// A failed environment stage still fills the slot with `fallback` so the
    /// model renders with neutral lighting, but the failure is returned so the
    /// caller can report it. A failed model stage leaves the model slot empty.
    pub fn apply(
        &mut self,
        event: LoadEvent<E, M>,
        fallback: impl FnOnce() -> E,
    ) -> anyhow::Result<Applied> {
        match event {
            LoadEvent::Environment(Ok(environment)) => {
                self.set_environment(environment)?;
                Ok(Applied::Environment)
            }
            LoadEvent::Environment(Err(e)) => {
                self.set_environment(fallback())?;
                Err(e).context("Falling back to a neutral environment")
            }
            LoadEvent::Model(Ok(model)) => {
                self.insert_model(model)?;
                Ok(Applied::Model)
            }
            LoadEvent::Model(Err(e)) => Err(e),
        }
    }
}
