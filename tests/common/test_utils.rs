use std::cell::RefCell;

use helmet_viewer::loader::AssetLoader;

/// Stand-in assets: the environment and the model are just their source names.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FakeEnvironment(pub String);

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FakeModel(pub String);

/// An [`AssetLoader`] that succeeds or fails on demand and records every call.
pub(crate) struct MockLoader {
    environment_fails: bool,
    model_fails: bool,
    calls: RefCell<Vec<String>>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self {
            environment_fails: false,
            model_fails: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing_environment(mut self) -> Self {
        self.environment_fails = true;
        self
    }

    pub fn failing_model(mut self) -> Self {
        self.model_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl AssetLoader for MockLoader {
    type Environment = FakeEnvironment;
    type Model = FakeModel;

    async fn load_environment(&self, url: &str) -> anyhow::Result<FakeEnvironment> {
        self.calls.borrow_mut().push(format!("environment {url}"));
        if self.environment_fails {
            anyhow::bail!("404 Not Found");
        }
        Ok(FakeEnvironment(url.to_string()))
    }

    async fn load_model(&self, path: &str) -> anyhow::Result<FakeModel> {
        self.calls.borrow_mut().push(format!("model {path}"));
        if self.model_fails {
            anyhow::bail!("unexpected end of file");
        }
        Ok(FakeModel(path.to_string()))
    }
}

#[cfg(feature = "integration-tests")]
pub(crate) fn headless_renderer(
    size: [u32; 2],
    config: &helmet_viewer::ViewerConfig,
) -> anyhow::Result<helmet_viewer::render::Renderer> {
    use helmet_viewer::{context::request_device, render::Renderer};

    futures::executor::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let (_adapter, device, queue) = request_device(&instance, None).await?;
        Renderer::new(device, queue, wgpu::TextureFormat::Rgba8UnormSrgb, size, config)
    })
}
