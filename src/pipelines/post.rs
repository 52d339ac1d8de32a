//! Post-processing composer.
//!
//! The composer owns the offscreen targets of the frame and runs the fixed
//! chain in [`PASS_CHAIN`]: the scene is drawn (multisampled when enabled)
//! into an sRGB offscreen target, then the RGB shift pass samples that
//! target and writes the final image into the surface view.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::Texture,
    pipelines::basic,
};

/// Format of the offscreen target the scene pass renders into.
pub const SCENE_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassKind {
    /// Draws the scene into the offscreen target.
    Scene,
    /// Offsets the red and blue channels in opposite directions and writes to the output.
    RgbShift,
}

/// Pass order of every frame. The last pass writes to the output.
pub const PASS_CHAIN: [PassKind; 2] = [PassKind::Scene, PassKind::RgbShift];

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RgbShiftUniform {
    pub amount: f32,
    pub angle: f32,
    /// Non-zero when the output view is not sRGB and the shader has to encode itself.
    pub encode_srgb: u32,
    _padding: u32,
}

impl RgbShiftUniform {
    pub fn new(amount: f32, angle: f32, output_format: wgpu::TextureFormat) -> Self {
        Self {
            amount,
            angle,
            encode_srgb: u32::from(!output_format.is_srgb()),
            _padding: 0,
        }
    }

    /// Texture-space offset applied to red; blue gets the negated offset.
    pub fn offset(&self) -> [f32; 2] {
        [self.amount * self.angle.cos(), self.amount * self.angle.sin()]
    }
}

pub struct Composer {
    size: [u32; 2],
    sample_count: u32,
    /// Multisampled colour attachment, resolved into `scene_target`.
    msaa_target: Option<Texture>,
    scene_target: Texture,
    depth: Texture,
    sampler: wgpu::Sampler,
    shift_layout: wgpu::BindGroupLayout,
    shift_pipeline: wgpu::RenderPipeline,
    shift_buffer: wgpu::Buffer,
    shift_bind_group: wgpu::BindGroup,
}

impl Composer {
    pub fn new(
        device: &wgpu::Device,
        output_format: wgpu::TextureFormat,
        size: [u32; 2],
        sample_count: u32,
        shift: RgbShiftUniform,
    ) -> Self {
        let shift_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
            label: Some("rgb_shift_bind_group_layout"),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("RGB Shift Pipeline Layout"),
            bind_group_layouts: &[&shift_layout],
            push_constant_ranges: &[],
        });
        let shift_pipeline = basic::mk_render_pipeline(
            device,
            &layout,
            output_format,
            Some(wgpu::BlendState::REPLACE),
            None,
            1,
            &[],
            wgpu::ShaderModuleDescriptor {
                label: Some("RGB Shift Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("rgb_shift.wgsl").into()),
            },
        );

        let shift_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("RGB Shift Buffer"),
            contents: bytemuck::cast_slice(&[shift]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("post sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let (msaa_target, scene_target, depth) = Self::create_targets(device, size, sample_count);
        let shift_bind_group =
            Self::create_shift_bind_group(device, &shift_layout, &scene_target, &sampler, &shift_buffer);

        Self {
            size,
            sample_count,
            msaa_target,
            scene_target,
            depth,
            sampler,
            shift_layout,
            shift_pipeline,
            shift_buffer,
            shift_bind_group,
        }
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    /// Recreate every intermediate target at the new size. Zero sizes are ignored.
    pub fn set_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 || self.size == [width, height] {
            return;
        }
        self.size = [width, height];
        let (msaa_target, scene_target, depth) = Self::create_targets(device, self.size, self.sample_count);
        self.shift_bind_group = Self::create_shift_bind_group(
            device,
            &self.shift_layout,
            &scene_target,
            &self.sampler,
            &self.shift_buffer,
        );
        self.msaa_target = msaa_target;
        self.scene_target = scene_target;
        self.depth = depth;
    }

    /// Record the whole chain. `draw_scene` records the draw calls of the scene pass.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        output: &wgpu::TextureView,
        clear_colour: wgpu::Color,
        draw_scene: impl FnOnce(&mut wgpu::RenderPass<'_>),
    ) {
        let mut draw_scene = Some(draw_scene);
        for pass in PASS_CHAIN {
            match pass {
                PassKind::Scene => {
                    let (view, resolve_target) = match &self.msaa_target {
                        Some(msaa) => (&msaa.view, Some(&self.scene_target.view)),
                        None => (&self.scene_target.view, None),
                    };
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Scene Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view,
                            resolve_target,
                            depth_slice: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(clear_colour),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                            view: &self.depth.view,
                            depth_ops: Some(wgpu::Operations {
                                load: wgpu::LoadOp::Clear(1.0),
                                store: wgpu::StoreOp::Store,
                            }),
                            stencil_ops: None,
                        }),
                        occlusion_query_set: None,
                        timestamp_writes: None,
                    });
                    if let Some(draw) = draw_scene.take() {
                        draw(&mut render_pass);
                    }
                }
                PassKind::RgbShift => {
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("RGB Shift Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: output,
                            resolve_target: None,
                            depth_slice: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(clear_colour),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        occlusion_query_set: None,
                        timestamp_writes: None,
                    });
                    render_pass.set_pipeline(&self.shift_pipeline);
                    render_pass.set_bind_group(0, &self.shift_bind_group, &[]);
                    render_pass.draw(0..3, 0..1);
                }
            }
        }
    }

    fn create_targets(
        device: &wgpu::Device,
        size: [u32; 2],
        sample_count: u32,
    ) -> (Option<Texture>, Texture, Texture) {
        let msaa_target = (sample_count > 1).then(|| {
            Texture::create_render_target(device, size, SCENE_TARGET_FORMAT, sample_count, "scene msaa target")
        });
        let scene_target = Texture::create_render_target(device, size, SCENE_TARGET_FORMAT, 1, "scene target");
        let depth = Texture::create_depth_texture(device, size, sample_count, "scene depth");
        (msaa_target, scene_target, depth)
    }

    fn create_shift_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        scene_target: &Texture,
        sampler: &wgpu::Sampler,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&scene_target.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer.as_entire_binding(),
                },
            ],
            label: Some("rgb_shift_bind_group"),
        })
    }
}
