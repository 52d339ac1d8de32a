//! Per-frame GPU work.
//!
//! [`Renderer`] owns everything that outlives a single frame: the camera
//! uniform, the PBR pipeline, the post-processing [`Composer`] and the bind
//! group layouts the loader needs to build assets against. It does not know
//! about windows or surfaces; it renders into whatever view it is handed, so
//! it can also be driven headless.

use std::iter;

use winit::dpi::PhysicalSize;

use crate::{
    camera::{Camera, CameraResources, Projection},
    config::ViewerConfig,
    context::Viewport,
    data_structures::{
        model::{DrawModel, Model},
        scene::Scene,
    },
    loader::GpuAssetLoader,
    pipelines::{
        basic,
        post::{Composer, RgbShiftUniform, SCENE_TARGET_FORMAT},
    },
    resources::{self, environment::EnvironmentMap},
};

/// The scene as the viewer renders it.
pub type ViewerScene = Scene<EnvironmentMap, Model>;

pub struct Renderer {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub camera: CameraResources,
    pub projection: Projection,
    pub clear_colour: wgpu::Color,
    // only read back by the headless readback
    #[cfg_attr(not(feature = "integration-tests"), allow(dead_code))]
    output_format: wgpu::TextureFormat,
    pbr_pipeline: wgpu::RenderPipeline,
    composer: Composer,
    material_layout: wgpu::BindGroupLayout,
    environment_layout: wgpu::BindGroupLayout,
    fallback_environment: EnvironmentMap,
}

impl Renderer {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        output_format: wgpu::TextureFormat,
        size: [u32; 2],
        config: &ViewerConfig,
    ) -> anyhow::Result<Self> {
        let projection = Projection::from_config(size[0], size[1], &config.camera);
        let camera = Camera::new(config.camera.position, config.camera.target);
        let camera = CameraResources::new(&device, camera, &projection, config.exposure);

        let material_layout = resources::texture::material_layout(&device);
        let environment_layout = resources::environment::environment_layout(&device);
        let fallback_environment = EnvironmentMap::neutral(&device, &queue, &environment_layout)?;

        let sample_count = config.sample_count();
        let pbr_pipeline = basic::mk_pbr_pipeline(
            &device,
            SCENE_TARGET_FORMAT,
            sample_count,
            &material_layout,
            &camera.bind_group_layout,
            &environment_layout,
        );
        let shift = RgbShiftUniform::new(config.rgb_shift_amount, config.rgb_shift_angle, output_format);
        let composer = Composer::new(&device, output_format, size, sample_count, shift);
        log::debug!(
            "Renderer ready: {}x{} {output_format:?}, {sample_count}x MSAA",
            size[0],
            size[1]
        );

        Ok(Self {
            device,
            queue,
            camera,
            projection,
            clear_colour: config.clear_colour,
            output_format,
            pbr_pipeline,
            composer,
            material_layout,
            environment_layout,
            fallback_environment,
        })
    }

    pub fn size(&self) -> [u32; 2] {
        self.composer.size()
    }

    /// Update the camera aspect and recreate the composer targets.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.resize_viewport(&Viewport::unscaled(PhysicalSize::new(width, height)));
    }

    /// Size the composer targets to the drawing buffer and the camera to the window.
    pub fn resize_viewport(&mut self, viewport: &Viewport) {
        if viewport.is_empty() {
            return;
        }
        self.projection.fit(viewport);
        self.composer.set_size(&self.device, viewport.buffer.width, viewport.buffer.height);
    }

    /// A loader that builds assets against this renderer's device and layouts.
    pub fn loader(&self) -> GpuAssetLoader {
        GpuAssetLoader {
            device: self.device.clone(),
            queue: self.queue.clone(),
            material_layout: self.material_layout.clone(),
            environment_layout: self.environment_layout.clone(),
        }
    }

    /// A handle to the neutral environment used when the HDRI is unavailable.
    pub fn fallback_environment(&self) -> EnvironmentMap {
        self.fallback_environment.clone()
    }

    /// Upload the camera and the model transform for the next frame.
    pub fn update(&mut self, scene: &ViewerScene) {
        self.camera.write_to_buffer(&self.queue, &self.projection);
        if let Some(node) = scene.model() {
            node.asset.write_instance(&self.queue, &node.instance());
        }
    }

    /// Run the pass chain into `output` and submit it.
    pub fn render(&self, output: &wgpu::TextureView, scene: &ViewerScene) {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
        self.encode(&mut encoder, output, scene);
        self.queue.submit(iter::once(encoder.finish()));
    }

    fn encode(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView, scene: &ViewerScene) {
        let environment = scene.environment().unwrap_or(&self.fallback_environment);
        self.composer
            .render(encoder, output, self.clear_colour, |render_pass| {
                // Until the model arrives only the clear colour is drawn
                let Some(node) = scene.model() else {
                    return;
                };
                render_pass.set_pipeline(&self.pbr_pipeline);
                render_pass.draw_model_instanced(
                    &node.asset,
                    0..1,
                    &self.camera.bind_group,
                    &environment.bind_group,
                );
            });
    }

    /// Render one frame offscreen and read it back as RGBA8.
    #[cfg(feature = "integration-tests")]
    pub async fn render_to_image(&mut self, scene: &ViewerScene) -> anyhow::Result<image::RgbaImage> {
        use anyhow::Context as _;

        let [width, height] = self.size();
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Readback Output Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.output_format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Rows of a texture copy have to be aligned to 256 bytes
        let unpadded_bytes_per_row = 4 * width;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Readback Buffer"),
            size: (padded_bytes_per_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        self.update(scene);
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
        self.encode(&mut encoder, &view, scene);
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(iter::once(encoder.finish()));

        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        self.device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(std::time::Duration::from_secs(3)),
        })?;
        rx.receive()
            .await
            .context("The readback buffer was dropped before it was mapped")??;

        let data = buffer_slice.get_mapped_range();
        let pixels: Vec<u8> = data
            .chunks(padded_bytes_per_row as usize)
            .flat_map(|row| &row[..unpadded_bytes_per_row as usize])
            .copied()
            .collect();
        drop(data);
        output_buffer.unmap();

        image::RgbaImage::from_raw(width, height, pixels).context("Readback buffer has the wrong size")
    }
}
