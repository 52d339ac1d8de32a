//! Application event loop.
//!
//! [`run`] opens the window (or binds to the `canvas` element on the web),
//! creates the GPU [`Context`] and starts the asset loading pipeline in the
//! background. Load results, pointer moves, resizes and redraws are then all
//! handled on the event loop, so the scene is only ever touched from there.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and the context
//! 2. loading runs on the async runtime and reports each stage as a [`ViewerEvent::Load`]
//! 3. once the model is in the scene, pointer moves drive the tilt tween
//! 4. every redraw advances the tween, uploads the frame state and runs the pass chain

use std::{fmt::Debug, sync::Arc};

use instant::Instant;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    config::ViewerConfig,
    context::Context,
    data_structures::{
        model::Model,
        scene::{Applied, Scene},
    },
    interaction::InteractionController,
    loader::{LoadEvent, load_assets},
    render::ViewerScene,
    resources::environment::EnvironmentMap,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub enum ViewerEvent {
    /// The context finished initialising asynchronously (web only).
    #[allow(dead_code)]
    Initialized(Context),
    Load(LoadEvent<EnvironmentMap, Model>),
}

impl Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Load(LoadEvent::Environment(res)) => f
                .debug_tuple("Load::Environment")
                .field(&res.is_ok())
                .finish(),
            Self::Load(LoadEvent::Model(res)) => {
                f.debug_tuple("Load::Model").field(&res.is_ok()).finish()
            }
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    config: ViewerConfig,
    ctx: Option<Context>,
    initializing: bool,
    scene: ViewerScene,
    controller: InteractionController,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<ViewerEvent>, config: ViewerConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        let controller = InteractionController::new(config.max_swing, config.tween_duration);
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            ctx: None,
            initializing: false,
            scene: ViewerScene::new(),
            controller,
            last_time: Instant::now(),
        })
    }

    /// Store the context and start loading the environment, then the model.
    fn on_context_ready(&mut self, ctx: Context) {
        let loader = ctx.renderer.loader();
        let proxy = self.proxy.clone();
        let environment_url = self.config.environment_url.clone();
        let model_path = self.config.model_path.clone();
        let load = async move {
            load_assets(&loader, &environment_url, &model_path, |event| {
                if proxy.send_event(ViewerEvent::Load(event)).is_err() {
                    log::warn!("The event loop closed before loading finished");
                }
            })
            .await;
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(load);
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(load);

        ctx.window.request_redraw();
        self.last_time = Instant::now();
        self.ctx = Some(ctx);
    }

    fn on_load(&mut self, event: LoadEvent<EnvironmentMap, Model>) {
        let Some(ctx) = &self.ctx else {
            log::warn!("Dropping a load result that arrived without a context");
            return;
        };
        if let Err(e) = handle_load(&mut self.scene, &mut self.controller, event, || {
            ctx.renderer.fallback_environment()
        }) {
            log::error!("{e:#}");
        }
    }
}

/// Apply one loading stage to the scene and wake the controller once the model is in.
///
/// A failed environment still fills the slot with `fallback` and is returned
/// as an error so it gets reported; the controller stays idle until a model
/// is actually added.
pub fn handle_load<E, M>(
    scene: &mut Scene<E, M>,
    controller: &mut InteractionController,
    event: LoadEvent<E, M>,
    fallback: impl FnOnce() -> E,
) -> anyhow::Result<Applied> {
    let applied = scene.apply(event, fallback)?;
    match applied {
        Applied::Environment => log::info!("Environment map ready"),
        Applied::Model => {
            log::info!("Model ready");
            controller.activate();
        }
    }
    Ok(applied)
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.ctx.is_some() || self.initializing {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Damaged Helmet");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Couldn't create the window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.initializing = true;

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(Context::new(window, &self.config)) {
                Ok(ctx) => self.on_context_ready(ctx),
                Err(e) => {
                    log::error!("App initialization failed. Cannot create the main context: {e:#}");
                    event_loop.exit();
                }
            }
            self.initializing = false;
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            let config = self.config.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Context::new(window, &config).await {
                    Ok(ctx) => {
                        if proxy.send_event(ViewerEvent::Initialized(ctx)).is_err() {
                            log::error!("The event loop closed during initialization");
                        }
                    }
                    Err(e) => log::error!("App initialization failed. Cannot create the main context: {e:#}"),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        log::debug!("{event:?}");
        match event {
            ViewerEvent::Initialized(mut ctx) => {
                // This is the message from our wasm `spawn_local`
                self.initializing = false;
                // Important: Trigger a resize now that we are initialized
                let size = ctx.window.inner_size();
                ctx.resize(size);
                self.on_context_ready(ctx);
            }
            ViewerEvent::Load(load) => self.on_load(load),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(ctx) = self.ctx.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => ctx.resize(size),
            WindowEvent::ScaleFactorChanged { .. } => ctx.reconfigure(),
            WindowEvent::CursorMoved { position, .. } => {
                self.controller
                    .on_pointer_moved(position, ctx.window.inner_size(), self.scene.model());
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                self.controller.update(dt, self.scene.model_mut());

                // invoke main render loop
                ctx.window.request_redraw();
                match ctx.render(&self.scene) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => ctx.reconfigure(),
                    Err(e) => log::error!("Unable to render {e}"),
                }
            }
            _ => {}
        }
    }
}

/// Open the viewer and block until its window is closed.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
