use std::sync::Arc;

use anyhow::Context as _;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    config::ViewerConfig,
    render::{Renderer, ViewerScene},
};

/// Size of the drawing buffer for a window of `size` physical pixels.
///
/// The device pixel ratio used for the buffer is capped at `max_pixel_ratio`,
/// so on very dense displays the buffer is smaller than the window and gets
/// upscaled by the compositor.
pub fn drawing_buffer_size(
    size: PhysicalSize<u32>,
    scale_factor: f64,
    max_pixel_ratio: f64,
) -> PhysicalSize<u32> {
    if scale_factor <= max_pixel_ratio || scale_factor <= 0.0 {
        return size;
    }
    let ratio = max_pixel_ratio / scale_factor;
    PhysicalSize::new(
        (size.width as f64 * ratio).round() as u32,
        (size.height as f64 * ratio).round() as u32,
    )
}

/// A window size together with the drawing buffer that renders it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub window: PhysicalSize<u32>,
    pub buffer: PhysicalSize<u32>,
}

impl Viewport {
    pub fn new(window: PhysicalSize<u32>, scale_factor: f64, max_pixel_ratio: f64) -> Self {
        Self {
            window,
            buffer: drawing_buffer_size(window, scale_factor, max_pixel_ratio),
        }
    }

    /// A viewport whose buffer matches the window, as used by headless targets.
    pub fn unscaled(size: PhysicalSize<u32>) -> Self {
        Self {
            window: size,
            buffer: size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.width == 0 || self.buffer.height == 0
    }
}

/// Request an adapter and device able to run the viewer.
///
/// Pass the window surface when there is one; headless callers pass `None`.
pub async fn request_device(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
) -> anyhow::Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .context("No suitable GPU adapter found")?;
    log::info!("Using adapter {:?}", adapter.get_info());

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            // WebGL doesn't support all of wgpu's features, so if
            // we're building for the web we'll have to disable some.
            required_limits: if cfg!(target_arch = "wasm32") {
                wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits())
            } else {
                wgpu::Limits::default()
            },
            ..Default::default()
        })
        .await
        .context("Couldn't create the GPU device")?;
    Ok((adapter, device, queue))
}

pub struct Context {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    pub renderer: Renderer,
    max_pixel_ratio: f64,
    is_surface_configured: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>, viewer: &ViewerConfig) -> anyhow::Result<Self> {
        let viewport = Viewport::new(window.inner_size(), window.scale_factor(), viewer.max_pixel_ratio);

        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Couldn't create a surface for the window")?;
        let (adapter, device, queue) = request_device(&instance, Some(&surface)).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The composer encodes to sRGB itself if the surface isn't sRGB
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("The surface reports no supported formats")?;
        // Transparent canvas: keep the alpha of the frame instead of forcing it opaque
        let alpha_mode = [
            wgpu::CompositeAlphaMode::PreMultiplied,
            wgpu::CompositeAlphaMode::PostMultiplied,
        ]
        .into_iter()
        .find(|mode| surface_caps.alpha_modes.contains(mode))
        .or_else(|| surface_caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: viewport.buffer.width.max(1),
            height: viewport.buffer.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        log::debug!("Surface {:?} {:?}", config.format, config.alpha_mode);

        let renderer = Renderer::new(device, queue, surface_format, [config.width, config.height], viewer)?;

        let mut ctx = Self {
            window,
            surface,
            config,
            renderer,
            max_pixel_ratio: viewer.max_pixel_ratio,
            is_surface_configured: false,
        };
        ctx.configure(viewport);
        Ok(ctx)
    }

    /// Resize the drawing buffer, the camera aspect and every offscreen target.
    ///
    /// `size` is the new physical size of the window. Zero sizes (minimised
    /// windows) leave everything as it is.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.configure(Viewport::new(size, self.window.scale_factor(), self.max_pixel_ratio));
    }

    /// Configure the surface again at its current size, e.g. after it was lost.
    pub fn reconfigure(&mut self) {
        self.resize(self.window.inner_size());
    }

    fn configure(&mut self, viewport: Viewport) {
        if viewport.is_empty() {
            return;
        }
        self.config.width = viewport.buffer.width;
        self.config.height = viewport.buffer.height;
        self.surface.configure(&self.renderer.device, &self.config);
        self.renderer.resize_viewport(&viewport);
        self.is_surface_configured = true;
    }

    pub fn render(&mut self, scene: &ViewerScene) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }
        self.renderer.update(scene);

        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.renderer.render(&view, scene);
        output.present();
        Ok(())
    }
}
