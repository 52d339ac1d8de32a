use std::collections::HashMap;

use anyhow::{Context as _, bail};
use cgmath::SquareMatrix;

use crate::data_structures::{
    model::{self, MaterialTextures, MaterialUniform},
    texture::Texture,
};

/**
 * This module contains all logic for loading meshes, textures and environment maps from external files.
 */
pub mod environment;
pub mod mesh;
pub mod texture;

/// Whether `file_name` is an absolute http(s) URL rather than an asset name.
pub fn is_remote(file_name: &str) -> bool {
    file_name.starts_with("http://") || file_name.starts_with("https://")
}

/// Resolve `uri` (as found inside an asset) against the asset that referenced it.
pub fn resolve_relative(base: &str, uri: &str) -> String {
    if is_remote(uri) {
        return uri.to_string();
    }
    match base.rfind('/') {
        Some(idx) => format!("{}/{}", &base[..idx], uri),
        None => uri.to_string(),
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    if is_remote(file_name) {
        return Ok(reqwest::Url::parse(file_name)?);
    }
    let window = web_sys::window().context("No browser window available")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("Couldn't read the page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

/// Directories searched for local assets: `./assets` next to the working
/// directory, then the copy the build script leaves in `OUT_DIR`.
#[cfg(not(target_arch = "wasm32"))]
pub fn asset_dirs() -> [std::path::PathBuf; 2] {
    [
        std::path::Path::new("./").join("assets"),
        std::path::Path::new(env!("OUT_DIR")).join("assets"),
    ]
}

/// The first existing path for `file_name` among [`asset_dirs`], or the
/// working directory's `assets/` entry if none has it.
#[cfg(not(target_arch = "wasm32"))]
pub fn resolve_asset_path(file_name: &str) -> std::path::PathBuf {
    let [local, built] = asset_dirs();
    let built = built.join(file_name);
    let local = local.join(file_name);
    if !local.exists() && built.exists() { built } else { local }
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url)
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = if is_remote(file_name) {
        reqwest::get(file_name)
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec()
    } else {
        let path = resolve_asset_path(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Couldn't read {}", path.display()))?
    };

    Ok(data)
}

/// Load a glTF model with its buffers and metallic-roughness materials.
///
/// Node transforms are baked into the vertex data so the resulting model can
/// be placed with a single instance transform.
pub async fn load_model_gltf(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> anyhow::Result<model::Model> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf = gltf::Gltf::from_slice(&gltf_bytes)
        .with_context(|| format!("Couldn't parse glTF file {file_name}"))?;
    let buffer_data = load_buffers(&gltf, file_name).await?;

    // Load materials
    let mut textures: HashMap<(usize, bool), Texture> = HashMap::new();
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let name = material.name().unwrap_or("material").to_string();
        let pbr = material.pbr_metallic_roughness();
        let mut maps = MaterialTextures::defaults(device, queue);
        if let Some(info) = pbr.base_color_texture() {
            maps.base_color = load_image(info.texture().source(), false, &buffer_data, file_name, device, queue, &mut textures).await?;
        }
        if let Some(info) = pbr.metallic_roughness_texture() {
            maps.metallic_roughness = load_image(info.texture().source(), true, &buffer_data, file_name, device, queue, &mut textures).await?;
        }
        if let Some(normal) = material.normal_texture() {
            maps.normal = load_image(normal.texture().source(), true, &buffer_data, file_name, device, queue, &mut textures).await?;
        }
        if let Some(occlusion) = material.occlusion_texture() {
            maps.occlusion = load_image(occlusion.texture().source(), true, &buffer_data, file_name, device, queue, &mut textures).await?;
        }
        if let Some(info) = material.emissive_texture() {
            maps.emissive = load_image(info.texture().source(), false, &buffer_data, file_name, device, queue, &mut textures).await?;
        }
        let [er, eg, eb] = material.emissive_factor();
        let uniform = MaterialUniform {
            base_color_factor: pbr.base_color_factor(),
            emissive_factor: [er, eg, eb, 0.0],
            metallic_factor: pbr.metallic_factor(),
            roughness_factor: pbr.roughness_factor(),
            normal_scale: material.normal_texture().map_or(1.0, |n| n.scale()),
            occlusion_strength: material.occlusion_texture().map_or(1.0, |o| o.strength()),
        };
        materials.push(model::Material::new(device, &name, maps, uniform, layout));
    }
    // Primitives without a material use glTF's default material, appended last
    let default_material = materials.len();

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .with_context(|| format!("glTF file {file_name} contains no scene"))?;
    let mut meshes = Vec::new();
    for node in scene.nodes() {
        collect_meshes(node, cgmath::Matrix4::identity(), &buffer_data, default_material, device, &mut meshes)?;
    }
    if meshes.is_empty() {
        bail!("glTF file {file_name} contains no triangle meshes");
    }
    if meshes.iter().any(|mesh| mesh.material == default_material) {
        materials.push(model::Material::new(
            device,
            "default material",
            MaterialTextures::defaults(device, queue),
            MaterialUniform::default(),
            layout,
        ));
    }
    log::info!(
        "Loaded {file_name}: {} meshes, {} materials",
        meshes.len(),
        materials.len()
    );

    Ok(model::Model::new(device, meshes, materials))
}

async fn load_buffers(gltf: &gltf::Gltf, file_name: &str) -> anyhow::Result<Vec<Vec<u8>>> {
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .with_context(|| format!("{file_name} references a binary chunk it doesn't contain"))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                if uri.starts_with("data:") {
                    bail!("{file_name}: embedded data URIs are not supported");
                }
                let bin = load_binary(&resolve_relative(file_name, uri)).await?;
                buffer_data.push(bin);
            }
        }
    }
    Ok(buffer_data)
}

async fn load_image(
    image: gltf::Image<'_>,
    linear: bool,
    buffer_data: &[Vec<u8>],
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    cache: &mut HashMap<(usize, bool), Texture>,
) -> anyhow::Result<Texture> {
    let key = (image.index(), linear);
    if let Some(texture) = cache.get(&key) {
        return Ok(texture.clone());
    }
    let texture = match image.source() {
        gltf::image::Source::View { view, mime_type } => {
            let buffer = buffer_data
                .get(view.buffer().index())
                .context("Image view points to a missing buffer")?;
            let bytes = buffer
                .get(view.offset()..view.offset() + view.length())
                .context("Image view exceeds its buffer")?;
            let label = format!("{file_name} image {}", image.index());
            Texture::from_bytes(device, queue, bytes, &label, mime_type.split('/').last(), linear)?
        }
        gltf::image::Source::Uri { uri, mime_type } => {
            texture::load_texture(
                &resolve_relative(file_name, uri),
                linear,
                device,
                queue,
                mime_type.and_then(|mt| mt.split('/').last()),
            )
            .await?
        }
    };
    cache.insert(key, texture.clone());
    Ok(texture)
}

fn collect_meshes(
    node: gltf::Node,
    parent: cgmath::Matrix4<f32>,
    buffer_data: &[Vec<u8>],
    default_material: usize,
    device: &wgpu::Device,
    meshes: &mut Vec<model::Mesh>,
) -> anyhow::Result<()> {
    let local: cgmath::Matrix4<f32> = node.transform().matrix().into();
    let world = parent * local;

    if let Some(gltf_mesh) = node.mesh() {
        let name = gltf_mesh.name().unwrap_or("unknown_mesh");
        for primitive in gltf_mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!("Skipping non-triangle primitive {} of mesh {}", primitive.index(), name);
                continue;
            }
            let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));

            let mut vertices: Vec<model::ModelVertex> = reader
                .read_positions()
                .with_context(|| format!("Primitive {} of mesh {name} has no positions", primitive.index()))?
                .map(|position| model::ModelVertex {
                    position,
                    ..Default::default()
                })
                .collect();
            if let Some(normals) = reader.read_normals() {
                vertices.iter_mut().zip(normals).for_each(|(v, normal)| v.normal = normal);
            }
            if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                vertices.iter_mut().zip(tex_coords).for_each(|(v, uv)| v.tex_coords = uv);
            }
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertices.len() as u32).collect(),
            };
            match reader.read_tangents() {
                Some(tangents) => vertices.iter_mut().zip(tangents).for_each(|(v, tangent)| {
                    // glTF stores the bitangent sign in w
                    let tangent: cgmath::Vector4<f32> = tangent.into();
                    let normal: cgmath::Vector3<f32> = v.normal.into();
                    v.tangent = tangent.truncate().into();
                    v.bitangent = (normal.cross(tangent.truncate()) * tangent.w).into();
                }),
                None => mesh::compute_tangents(&mut vertices, &indices),
            }
            mesh::bake_transform(&mut vertices, world);

            let material = primitive.material().index().unwrap_or(default_material);
            meshes.push(mesh::mk_mesh(device, name, &vertices, &indices, material));
        }
    }

    for child in node.children() {
        collect_meshes(child, world, buffer_data, default_material, device, meshes)?;
    }
    Ok(())
}
