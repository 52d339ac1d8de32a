use helmet_viewer::{
    PhysicalSize, ViewerConfig,
    camera::Projection,
    config::{CameraConfig, RGB_SHIFT_AMOUNT},
    context::{Viewport, drawing_buffer_size},
    pipelines::post::{PASS_CHAIN, PassKind, RgbShiftUniform},
};

#[test]
fn projection_follows_viewport_aspect() {
    let mut projection = Projection::from_config(800, 600, &CameraConfig::default());
    assert!((projection.aspect() - 800.0 / 600.0).abs() < 1e-6);

    projection.resize(1920, 1080);
    assert!((projection.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
}

#[test]
fn zero_height_resize_keeps_previous_aspect() {
    let mut projection = Projection::from_config(1920, 1080, &CameraConfig::default());
    projection.resize(1920, 0);
    assert!((projection.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
}

#[test]
fn drawing_buffer_keeps_low_pixel_ratios() {
    let size = PhysicalSize::new(1920, 1080);
    assert_eq!(drawing_buffer_size(size, 1.0, 2.0), size);
    assert_eq!(drawing_buffer_size(size, 2.0, 2.0), size);
}

#[test]
fn drawing_buffer_caps_pixel_ratio() {
    // a 1000x500 css pixel window on a 3x display
    let size = PhysicalSize::new(3000, 1500);
    assert_eq!(drawing_buffer_size(size, 3.0, 2.0), PhysicalSize::new(2000, 1000));
}

#[test]
fn scene_pass_runs_before_rgb_shift() {
    assert_eq!(PASS_CHAIN, [PassKind::Scene, PassKind::RgbShift]);
    assert_eq!(PASS_CHAIN.last(), Some(&PassKind::RgbShift));
}

#[test]
fn rgb_shift_offset_follows_angle() {
    let shift = RgbShiftUniform::new(RGB_SHIFT_AMOUNT, 0.0, wgpu::TextureFormat::Bgra8UnormSrgb);
    let [x, y] = shift.offset();
    assert!((x - 0.003).abs() < 1e-7);
    assert!(y.abs() < 1e-7);
    assert_eq!(shift.encode_srgb, 0);

    let vertical = RgbShiftUniform::new(RGB_SHIFT_AMOUNT, std::f32::consts::FRAC_PI_2, wgpu::TextureFormat::Bgra8Unorm);
    let [x, y] = vertical.offset();
    assert!(x.abs() < 1e-7);
    assert!((y - 0.003).abs() < 1e-7);
    assert_eq!(vertical.encode_srgb, 1);
}

#[test]
fn default_config_matches_the_viewer() {
    let config = ViewerConfig::default();
    assert!(config.environment_url.ends_with("pond_bridge_night_1k.hdr"));
    assert_eq!(config.model_path, "DamagedHelmet.gltf");
    assert_eq!(config.sample_count(), 4);
    assert_eq!(config.max_pixel_ratio, 2.0);
    assert_eq!(config.tween_duration, instant::Duration::from_millis(500));
    assert_eq!(config.clear_colour, wgpu::Color::TRANSPARENT);
    assert_eq!(config.camera.position, [0.0, 0.0, 3.5]);
}

#[test]
fn camera_aspect_follows_window_not_rounded_buffer() {
    let window = PhysicalSize::new(1001, 333);
    let viewport = Viewport::new(window, 3.0, 2.0);
    assert_eq!(viewport.buffer, PhysicalSize::new(667, 222));

    let mut projection = Projection::from_config(1, 1, &CameraConfig::default());
    projection.fit(&viewport);
    assert!((projection.aspect() - 1001.0 / 333.0).abs() < 1e-6);
}

#[test]
fn unscaled_viewport_and_empty_windows() {
    let size = PhysicalSize::new(640, 480);
    assert_eq!(Viewport::unscaled(size).buffer, size);
    assert!(Viewport::new(PhysicalSize::new(0, 480), 1.0, 2.0).is_empty());
    assert!(!Viewport::new(size, 3.0, 2.0).is_empty());
}
