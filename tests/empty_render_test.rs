#[cfg(feature = "integration-tests")]
mod common;

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_transparent_canvas_without_model() {
    use helmet_viewer::{ViewerConfig, render::ViewerScene};

    use crate::common::test_utils::headless_renderer;

    let config = ViewerConfig::default();
    let mut renderer = headless_renderer([64, 48], &config).expect("no GPU available for the test");
    let scene = ViewerScene::new();

    let img = futures::executor::block_on(renderer.render_to_image(&scene)).unwrap();

    assert_eq!(img.dimensions(), (64, 48));
    for pixel in img.pixels() {
        assert_eq!(*pixel, image::Rgba([0, 0, 0, 0]));
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_render_clear_colour_through_the_pass_chain() {
    use helmet_viewer::{ViewerConfig, render::ViewerScene};

    use crate::common::test_utils::headless_renderer;

    let config = ViewerConfig {
        clear_colour: wgpu::Color::WHITE,
        ..Default::default()
    };
    let mut renderer = headless_renderer([300, 20], &config).expect("no GPU available for the test");
    let mut scene = ViewerScene::new();
    scene.set_environment(renderer.fallback_environment()).unwrap();

    let img = futures::executor::block_on(renderer.render_to_image(&scene)).unwrap();

    // a uniform image stays uniform under the RGB shift
    for pixel in img.pixels() {
        assert_eq!(*pixel, image::Rgba([255, 255, 255, 255]));
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_resize_offscreen_targets() {
    use helmet_viewer::{ViewerConfig, render::ViewerScene};

    use crate::common::test_utils::headless_renderer;

    let mut renderer = headless_renderer([32, 32], &ViewerConfig::default()).expect("no GPU available for the test");
    renderer.resize(80, 20);
    renderer.resize(0, 20);

    assert_eq!(renderer.size(), [80, 20]);
    assert!((renderer.projection.aspect() - 4.0).abs() < 1e-6);

    let img = futures::executor::block_on(renderer.render_to_image(&ViewerScene::new())).unwrap();
    assert_eq!(img.dimensions(), (80, 20));
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_size_targets_to_buffer_and_camera_to_window() {
    use helmet_viewer::{PhysicalSize, ViewerConfig, context::Viewport};

    use crate::common::test_utils::headless_renderer;

    let mut renderer = headless_renderer([32, 32], &ViewerConfig::default()).expect("no GPU available for the test");
    renderer.resize_viewport(&Viewport::new(PhysicalSize::new(1001, 333), 3.0, 2.0));

    assert_eq!(renderer.size(), [667, 222]);
    assert!((renderer.projection.aspect() - 1001.0 / 333.0).abs() < 1e-6);
}
