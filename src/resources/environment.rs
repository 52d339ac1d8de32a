//! HDRI environment maps.
//!
//! A Radiance `.hdr` panorama is decoded to linear RGBA f32 pixels and uploaded
//! twice: at full resolution for reflections and as a small blurred copy that
//! stands in for the diffuse irradiance.

use anyhow::Context as _;
use image::{ImageFormat, Rgba, Rgba32FImage, imageops};

use crate::data_structures::texture::Texture;

/// Size of the blurred copy used for diffuse lighting.
pub const IRRADIANCE_SIZE: [u32; 2] = [64, 32];
const IRRADIANCE_BLUR_SIGMA: f32 = 4.0;
/// Radiance of the neutral fallback environment.
const NEUTRAL_RADIANCE: f32 = 0.5;

/// Decode a Radiance HDR image into linear RGBA f32 pixels (alpha = 1).
pub fn decode_hdr(bytes: &[u8]) -> anyhow::Result<Rgba32FImage> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Hdr)
        .context("Couldn't decode HDR image")?;
    Ok(img.to_rgba32f())
}

/// Downsample and blur a panorama into a cheap irradiance approximation.
pub fn irradiance(radiance: &Rgba32FImage) -> Rgba32FImage {
    let small = imageops::resize(
        radiance,
        IRRADIANCE_SIZE[0],
        IRRADIANCE_SIZE[1],
        imageops::FilterType::Triangle,
    );
    imageops::blur(&small, IRRADIANCE_BLUR_SIGMA)
}

/// Texture coordinates of direction `dir` in an equirectangular panorama.
///
/// `+y` maps to the top row (`v = 0`), `-y` to the bottom row. This must stay
/// in sync with `equirect_uv` in `pbr.wgsl`.
pub fn equirect_uv(dir: cgmath::Vector3<f32>) -> [f32; 2] {
    use cgmath::InnerSpace;
    let d = dir.normalize();
    let u = 0.5 + d.z.atan2(d.x) / std::f32::consts::TAU;
    let v = 0.5 - d.y.clamp(-1.0, 1.0).asin() / std::f32::consts::PI;
    [u, v]
}

pub fn environment_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let hdr_texture = wgpu::BindingType::Texture {
        multisampled: false,
        view_dimension: wgpu::TextureViewDimension::D2,
        sample_type: wgpu::TextureSampleType::Float { filterable: false },
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: hdr_texture,
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: hdr_texture,
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                count: None,
            },
        ],
        label: Some("environment_bind_group_layout"),
    })
}

/// Reflection and irradiance textures of the scene environment.
#[derive(Clone, Debug)]
pub struct EnvironmentMap {
    pub radiance: Texture,
    pub irradiance: Texture,
    pub bind_group: wgpu::BindGroup,
}

impl EnvironmentMap {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        radiance: &Rgba32FImage,
        irradiance: &Rgba32FImage,
        label: &str,
    ) -> anyhow::Result<Self> {
        let radiance = Texture::from_hdr(device, queue, radiance, label);
        let irradiance = Texture::from_hdr(device, queue, irradiance, &format!("{label} irradiance"));
        let sampler = radiance
            .sampler
            .as_ref()
            .context("Environment textures are created with a sampler")?;
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&radiance.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&irradiance.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some(label),
        });
        Ok(Self {
            radiance,
            irradiance,
            bind_group,
        })
    }

    pub fn from_hdr_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        bytes: &[u8],
        label: &str,
    ) -> anyhow::Result<Self> {
        let radiance = decode_hdr(bytes).with_context(|| format!("Invalid environment map {label}"))?;
        let limit = device.limits().max_texture_dimension_2d;
        if radiance.width() > limit || radiance.height() > limit {
            anyhow::bail!(
                "Environment map {label} is {}x{} but the device only supports {limit}px textures",
                radiance.width(),
                radiance.height()
            );
        }
        let irradiance = irradiance(&radiance);
        log::debug!("Decoded environment map {label} ({}x{})", radiance.width(), radiance.height());
        Self::new(device, queue, layout, &radiance, &irradiance, label)
    }

    /// Uniform grey lighting, used until (or instead of) the HDRI.
    pub fn neutral(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) -> anyhow::Result<Self> {
        let pixel = Rgba([NEUTRAL_RADIANCE, NEUTRAL_RADIANCE, NEUTRAL_RADIANCE, 1.0]);
        let img = Rgba32FImage::from_pixel(1, 1, pixel);
        Self::new(device, queue, layout, &img, &img, "neutral environment")
    }
}
