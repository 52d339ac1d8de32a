use futures::executor::block_on;
use helmet_viewer::{
    PhysicalPosition, PhysicalSize,
    config::MAX_SWING,
    data_structures::scene::{Applied, Scene},
    flow::handle_load,
    interaction::{ControllerState, InteractionController},
    loader::{LoadEvent, load_assets},
};
use instant::Duration;

use crate::common::test_utils::{FakeEnvironment, FakeModel, MockLoader};

mod common;

const ENV: &str = "https://example.com/night.hdr";
const MODEL: &str = "DamagedHelmet.gltf";

type FakeScene = Scene<FakeEnvironment, FakeModel>;

fn neutral() -> FakeEnvironment {
    FakeEnvironment("neutral".to_string())
}

fn collect(loader: &MockLoader) -> Vec<LoadEvent<FakeEnvironment, FakeModel>> {
    let mut events = Vec::new();
    block_on(load_assets(loader, ENV, MODEL, |event| events.push(event)));
    events
}

#[test]
fn loads_environment_before_model() {
    let loader = MockLoader::new();
    let events = collect(&loader);

    assert_eq!(loader.calls(), vec![format!("environment {ENV}"), format!("model {MODEL}")]);
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], LoadEvent::Environment(Ok(FakeEnvironment(url))) if url == ENV));
    assert!(matches!(&events[1], LoadEvent::Model(Ok(FakeModel(path))) if path == MODEL));
}

#[test]
fn model_is_absent_until_its_stage_is_applied() {
    let loader = MockLoader::new();
    let mut scene = FakeScene::new();
    let mut events = collect(&loader).into_iter();

    assert!(!scene.has_model());
    assert!(scene.environment().is_none());

    let applied = scene.apply(events.next().unwrap(), neutral).unwrap();
    assert_eq!(applied, Applied::Environment);
    assert_eq!(scene.environment(), Some(&FakeEnvironment(ENV.to_string())));
    assert!(!scene.has_model());

    let applied = scene.apply(events.next().unwrap(), neutral).unwrap();
    assert_eq!(applied, Applied::Model);
    let node = scene.model().unwrap();
    assert_eq!(node.asset, FakeModel(MODEL.to_string()));
    assert_eq!(node.position, cgmath::Vector3::new(0.0, 0.0, 0.0));
    assert_eq!(node.scale, cgmath::Vector3::new(1.0, 1.0, 1.0));
}

#[test]
fn failed_environment_falls_back_and_still_loads_model() {
    let loader = MockLoader::new().failing_environment();
    let mut scene = FakeScene::new();
    let events = collect(&loader);

    // the model stage still runs after the failure
    assert_eq!(loader.calls().len(), 2);

    let mut errors = Vec::new();
    for event in events {
        if let Err(e) = scene.apply(event, neutral) {
            errors.push(format!("{e:#}"));
        }
    }

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("environment map"), "{}", errors[0]);
    assert!(errors[0].contains("404 Not Found"), "{}", errors[0]);
    assert_eq!(scene.environment(), Some(&neutral()));
    assert!(scene.has_model());
}

#[test]
fn failed_model_is_reported_once_and_leaves_scene_empty() {
    let loader = MockLoader::new().failing_model();
    let mut scene = FakeScene::new();

    let results: Vec<_> = collect(&loader)
        .into_iter()
        .map(|event| scene.apply(event, neutral))
        .collect();

    assert!(results[0].is_ok());
    let errors: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(errors.len(), 1);
    let message = format!("{:#}", errors[0]);
    assert!(message.contains(MODEL), "{message}");
    assert!(message.contains("unexpected end of file"), "{message}");
    assert!(!scene.has_model());
}

#[test]
fn scene_holds_a_single_model() {
    let mut scene = FakeScene::new();
    scene.insert_model(FakeModel("a".to_string())).unwrap();

    assert!(scene.insert_model(FakeModel("b".to_string())).is_err());
    assert_eq!(scene.model().unwrap().asset, FakeModel("a".to_string()));
}

#[test]
fn a_second_environment_is_rejected() {
    let mut scene = FakeScene::new();
    scene.set_environment(neutral()).unwrap();

    let result = scene.apply(LoadEvent::Environment(Ok(FakeEnvironment(ENV.to_string()))), neutral);

    assert!(result.is_err());
    assert_eq!(scene.environment(), Some(&neutral()));
}

fn controller() -> InteractionController {
    InteractionController::new(MAX_SWING, Duration::from_millis(500))
}

#[test]
fn failed_model_keeps_pointer_inert() {
    let loader = MockLoader::new().failing_model();
    let mut scene = FakeScene::new();
    let mut controller = controller();

    let results: Vec<_> = collect(&loader)
        .into_iter()
        .map(|event| handle_load(&mut scene, &mut controller, event, neutral))
        .collect();

    assert_eq!(results[0].as_ref().ok(), Some(&Applied::Environment));
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    assert_eq!(controller.state(), ControllerState::Idle);

    controller.on_pointer_moved(PhysicalPosition::new(0.0, 0.0), PhysicalSize::new(800, 600), scene.model());
    assert!(controller.tween().is_none());
}

#[test]
fn only_the_model_stage_activates_the_controller() {
    let loader = MockLoader::new().failing_environment();
    let mut scene = FakeScene::new();
    let mut controller = controller();
    let mut events = collect(&loader).into_iter();

    // the fallback environment is installed, but nothing is interactive yet
    let environment = handle_load(&mut scene, &mut controller, events.next().unwrap(), neutral);
    assert!(environment.is_err());
    assert_eq!(scene.environment(), Some(&neutral()));
    assert_eq!(controller.state(), ControllerState::Idle);

    let model = handle_load(&mut scene, &mut controller, events.next().unwrap(), neutral).unwrap();
    assert_eq!(model, Applied::Model);
    assert_eq!(controller.state(), ControllerState::Active);
    assert!(events.next().is_none());

    controller.on_pointer_moved(PhysicalPosition::new(0.0, 0.0), PhysicalSize::new(800, 600), scene.model());
    assert!(controller.tween().is_some());
}
