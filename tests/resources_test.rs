use std::io::Cursor;

use cgmath::{Matrix4, Vector3};
use helmet_viewer::{
    data_structures::model::ModelVertex,
    resources::{
        environment::{IRRADIANCE_SIZE, decode_hdr, equirect_uv, irradiance},
        is_remote,
        mesh::{bake_transform, compute_tangents},
        asset_dirs, resolve_asset_path, resolve_relative,
    },
};
use image::{DynamicImage, ImageFormat, Rgb, Rgb32FImage};

fn encode_hdr(width: u32, height: u32, value: f32) -> Vec<u8> {
    let img = Rgb32FImage::from_pixel(width, height, Rgb([value, value * 0.5, value * 0.25]));
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb32F(img)
        .write_to(&mut bytes, ImageFormat::Hdr)
        .unwrap();
    bytes.into_inner()
}

fn vertex(position: [f32; 3], tex_coords: [f32; 2]) -> ModelVertex {
    ModelVertex {
        position,
        tex_coords,
        normal: [0.0, 0.0, 1.0],
        ..Default::default()
    }
}

#[test]
fn decodes_radiance_hdr_to_linear_rgba() {
    let img = decode_hdr(&encode_hdr(8, 4, 2.0)).unwrap();

    assert_eq!(img.dimensions(), (8, 4));
    let pixel = img.get_pixel(3, 2);
    // RGBE keeps 8 bits of mantissa
    assert!((pixel[0] - 2.0).abs() < 0.02, "{pixel:?}");
    assert!((pixel[1] - 1.0).abs() < 0.02, "{pixel:?}");
    assert!((pixel[2] - 0.5).abs() < 0.02, "{pixel:?}");
    assert_eq!(pixel[3], 1.0);
}

#[test]
fn rejects_bytes_that_are_not_hdr() {
    let err = decode_hdr(b"<html>404 Not Found</html>").unwrap_err();
    assert!(format!("{err:#}").contains("HDR"));
}

#[test]
fn irradiance_is_small_and_keeps_constant_radiance() {
    let radiance = decode_hdr(&encode_hdr(128, 64, 1.0)).unwrap();
    let irradiance = irradiance(&radiance);

    assert_eq!(irradiance.dimensions(), (IRRADIANCE_SIZE[0], IRRADIANCE_SIZE[1]));
    let pixel = irradiance.get_pixel(IRRADIANCE_SIZE[0] / 2, IRRADIANCE_SIZE[1] / 2);
    assert!((pixel[0] - 1.0).abs() < 0.05, "{pixel:?}");
}

#[test]
fn equirect_maps_poles_and_horizon() {
    let [_, v] = equirect_uv(Vector3::unit_y());
    assert!(v.abs() < 1e-6);
    let [_, v] = equirect_uv(-Vector3::unit_y());
    assert!((v - 1.0).abs() < 1e-6);

    let [u, v] = equirect_uv(Vector3::unit_x());
    assert!((u - 0.5).abs() < 1e-6);
    assert!((v - 0.5).abs() < 1e-6);
    let [u, _] = equirect_uv(Vector3::unit_z());
    assert!((u - 0.75).abs() < 1e-6);
}

#[test]
fn tangents_follow_uv_layout() {
    let mut vertices = vec![
        vertex([0.0, 0.0, 0.0], [0.0, 1.0]),
        vertex([1.0, 0.0, 0.0], [1.0, 1.0]),
        vertex([0.0, 1.0, 0.0], [0.0, 0.0]),
    ];
    compute_tangents(&mut vertices, &[0, 1, 2]);

    for v in &vertices {
        assert_eq!(v.tangent, [1.0, 0.0, 0.0]);
        assert_eq!(v.bitangent, [0.0, 1.0, 0.0]);
    }
}

#[test]
fn degenerate_and_out_of_range_triangles_are_skipped() {
    let mut vertices = vec![
        vertex([0.0, 0.0, 0.0], [0.5, 0.5]),
        vertex([1.0, 0.0, 0.0], [0.5, 0.5]),
        vertex([0.0, 1.0, 0.0], [0.5, 0.5]),
    ];
    compute_tangents(&mut vertices, &[0, 1, 2, 0, 1, 7]);

    for v in &vertices {
        assert_eq!(v.tangent, [0.0; 3]);
        assert_eq!(v.bitangent, [0.0; 3]);
    }
}

#[test]
fn baked_transform_moves_positions_and_keeps_unit_normals() {
    let mut vertices = vec![vertex([1.0, 0.0, 0.0], [0.0, 0.0])];
    let world = Matrix4::from_translation(Vector3::new(0.0, 2.0, 0.0)) * Matrix4::from_scale(3.0);
    bake_transform(&mut vertices, world);

    assert_eq!(vertices[0].position, [3.0, 2.0, 0.0]);
    let [x, y, z] = vertices[0].normal;
    assert!(x.abs() < 1e-6 && y.abs() < 1e-6 && (z - 1.0).abs() < 1e-6, "{:?}", vertices[0].normal);
}

#[test]
fn relative_uris_resolve_next_to_their_asset() {
    assert_eq!(resolve_relative("DamagedHelmet.gltf", "DamagedHelmet.bin"), "DamagedHelmet.bin");
    assert_eq!(
        resolve_relative("helmet/DamagedHelmet.gltf", "Default_albedo.jpg"),
        "helmet/Default_albedo.jpg"
    );
    assert_eq!(
        resolve_relative("https://example.com/models/helmet.gltf", "helmet.bin"),
        "https://example.com/models/helmet.bin"
    );
    assert_eq!(
        resolve_relative("helmet.gltf", "https://cdn.example.com/a.png"),
        "https://cdn.example.com/a.png"
    );
}

#[test]
fn remote_names_are_detected() {
    assert!(is_remote("https://dl.polyhaven.org/file/ph-assets/HDRIs/hdr/1k/pond_bridge_night_1k.hdr"));
    assert!(!is_remote("DamagedHelmet.gltf"));
}

#[test]
fn missing_assets_resolve_under_the_working_directory() {
    let path = resolve_asset_path("NoSuchModel.gltf");
    assert_eq!(path, asset_dirs()[0].join("NoSuchModel.gltf"));
}

#[test]
fn assets_copied_by_the_build_are_found() {
    let [_, built] = asset_dirs();
    std::fs::create_dir_all(&built).unwrap();
    let file = built.join("copied_only_at_build_time.bin");
    std::fs::write(&file, [1u8, 2, 3]).unwrap();

    let resolved = resolve_asset_path("copied_only_at_build_time.bin");
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let bytes = runtime.block_on(helmet_viewer::resources::load_binary("copied_only_at_build_time.bin"));
    std::fs::remove_file(&file).unwrap();

    assert_eq!(resolved, file);
    assert_eq!(bytes.unwrap(), vec![1, 2, 3]);
}
