use std::f32::consts::PI;

use helmet_viewer::{
    PhysicalPosition, PhysicalSize,
    config::MAX_SWING,
    data_structures::scene::ModelNode,
    interaction::{
        ControllerState, InteractionController, RotationTween, Tilt, ease_out_quad, pointer_to_tilt,
    },
};
use instant::Duration;

const EPS: f32 = 1e-5;
const VIEWPORT: PhysicalSize<u32> = PhysicalSize::new(1920, 1080);
const TWEEN: Duration = Duration::from_millis(500);

fn assert_close(actual: f32, expected: f32) {
    assert!((actual - expected).abs() < EPS, "expected {expected}, got {actual}");
}

fn active_controller() -> InteractionController {
    let mut controller = InteractionController::new(MAX_SWING, TWEEN);
    controller.activate();
    controller
}

#[test]
fn centre_of_viewport_targets_no_tilt() {
    let tilt = pointer_to_tilt(PhysicalPosition::new(960.0, 540.0), VIEWPORT, MAX_SWING);
    assert_close(tilt.pitch, 0.0);
    assert_close(tilt.yaw, 0.0);
}

#[test]
fn corners_target_half_the_swing() {
    let half = PI * 0.12 / 2.0;

    let top_left = pointer_to_tilt(PhysicalPosition::new(0.0, 0.0), VIEWPORT, MAX_SWING);
    assert_close(top_left.pitch, -half);
    assert_close(top_left.yaw, -half);

    let bottom_right = pointer_to_tilt(PhysicalPosition::new(1920.0, 1080.0), VIEWPORT, MAX_SWING);
    assert_close(bottom_right.pitch, half);
    assert_close(bottom_right.yaw, half);
}

#[test]
fn pointer_outside_viewport_is_clamped() {
    let inside = pointer_to_tilt(PhysicalPosition::new(1920.0, 0.0), VIEWPORT, MAX_SWING);
    let outside = pointer_to_tilt(PhysicalPosition::new(5000.0, -300.0), VIEWPORT, MAX_SWING);
    assert_eq!(inside, outside);
}

#[test]
fn empty_viewport_targets_no_tilt() {
    let tilt = pointer_to_tilt(PhysicalPosition::new(10.0, 10.0), PhysicalSize::new(0, 0), MAX_SWING);
    assert_eq!(tilt, Tilt::default());
}

#[test]
fn ease_out_quad_decelerates() {
    assert_close(ease_out_quad(0.0), 0.0);
    assert_close(ease_out_quad(0.5), 0.75);
    assert_close(ease_out_quad(1.0), 1.0);
    assert_close(ease_out_quad(2.0), 1.0);
}

#[test]
fn tween_reaches_target_after_its_duration() {
    let target = Tilt { pitch: 0.2, yaw: -0.1 };
    let mut tween = RotationTween::new(Tilt::default(), target, TWEEN);

    let halfway = tween.advance(Duration::from_millis(250));
    assert_close(halfway.pitch, 0.2 * 0.75);
    assert_close(halfway.yaw, -0.1 * 0.75);
    assert!(!tween.is_finished());

    let done = tween.advance(Duration::from_millis(400));
    assert_eq!(done, target);
    assert!(tween.is_finished());
    assert_close(tween.progress(), 1.0);
}

#[test]
fn idle_controller_ignores_pointer() {
    let mut controller = InteractionController::new(MAX_SWING, TWEEN);
    let mut node = ModelNode::new(());

    controller.on_pointer_moved(PhysicalPosition::new(0.0, 0.0), VIEWPORT, Some(&node));
    controller.update(TWEEN, Some(&mut node));

    assert_eq!(controller.state(), ControllerState::Idle);
    assert!(controller.tween().is_none());
    assert_eq!(node.tilt(), Tilt::default());
}

#[test]
fn pointer_without_model_is_a_no_op() {
    let mut controller = active_controller();
    controller.on_pointer_moved::<()>(PhysicalPosition::new(0.0, 0.0), VIEWPORT, None);
    assert!(controller.tween().is_none());
}

#[test]
fn model_eases_towards_the_pointer() {
    let mut controller = active_controller();
    let mut node = ModelNode::new(());

    controller.on_pointer_moved(PhysicalPosition::new(1920.0, 1080.0), VIEWPORT, Some(&node));
    let target = controller.tween().unwrap().target();

    controller.update(Duration::from_millis(250), Some(&mut node));
    assert_close(node.tilt().yaw, target.yaw * 0.75);
    assert_close(node.tilt().pitch, target.pitch * 0.75);

    controller.update(Duration::from_millis(250), Some(&mut node));
    assert_eq!(node.tilt(), target);
    assert!(controller.tween().is_none());
    // the tilt is carried by the model's rotation
    assert_close(node.rotation.y.0, target.yaw);
    assert_close(node.rotation.x.0, target.pitch);
}

#[test]
fn new_pointer_event_restarts_from_current_rotation() {
    let mut controller = active_controller();
    let mut node = ModelNode::new(());

    controller.on_pointer_moved(PhysicalPosition::new(1920.0, 540.0), VIEWPORT, Some(&node));
    controller.update(Duration::from_millis(250), Some(&mut node));
    let midway = node.tilt();
    assert!(midway.yaw > 0.0);

    // moving back to the centre retargets without jumping
    controller.on_pointer_moved(PhysicalPosition::new(960.0, 540.0), VIEWPORT, Some(&node));
    let tween = controller.tween().unwrap();
    assert_eq!(tween.value(), midway);
    assert_eq!(tween.target(), Tilt::default());

    controller.update(Duration::from_millis(500), Some(&mut node));
    assert_close(node.tilt().yaw, 0.0);
}

#[test]
fn tilt_is_uploaded_as_instance_rotation() {
    use cgmath::{Vector4, Zero};

    let mut node = ModelNode::new(());
    node.set_tilt(Tilt { pitch: 0.0, yaw: PI / 2.0 });

    let model = node.instance().to_raw().model_matrix();
    let rotated = model * Vector4::new(1.0, 0.0, 0.0, 0.0);
    let expected = Vector4::new(0.0, 0.0, -1.0, 0.0);
    assert!((rotated - expected).x.abs() < EPS && (rotated - expected).z.abs() < EPS, "{rotated:?}");

    let origin = model * Vector4::new(0.0, 0.0, 0.0, 1.0);
    assert_eq!(origin.truncate(), cgmath::Vector3::zero());
}
