use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::assets::ImageSource;
use crate::core::{Renderer, TickOutcome};
use crate::device::{Gpu, GpuInit, WgpuBackend};
use crate::input::{self, InputState, KeyBindings, UiEvent, UiSender};
use crate::scene::SceneDesc;
use crate::time::{IntervalTimer, RenderLoop};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Render loop frequency.
    pub refresh_hz: u32,
    pub bindings: KeyBindings,
    /// Close the window on Escape.
    pub exit_on_escape: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "nabu".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            refresh_hz: 60,
            bindings: KeyBindings::default(),
            exit_on_escape: true,
        }
    }
}

/// What a scene factory hands the runtime once the window exists.
pub struct SceneSetup {
    pub desc: SceneDesc,
    pub images: Box<dyn ImageSource>,
}

type Shared = RenderLoop<Renderer<WgpuBackend>>;

/// Entry point for the runtime.
///
/// The winit loop runs on the calling thread and only forwards input; the
/// scene is updated and drawn on the render loop's thread.
pub struct Runtime;

impl Runtime {
    /// Runs until the window closes.
    ///
    /// `factory` is called once, with the drawable size in physical pixels,
    /// after the window and device exist.
    pub fn run<F>(config: RuntimeConfig, gpu_init: GpuInit, factory: F) -> Result<()>
    where
        F: FnOnce(PhysicalSize<u32>) -> Result<SceneSetup> + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, factory);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.failure.map_or(Ok(()), Err)
    }
}

struct AppState<F> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    factory: Option<F>,

    window: Option<Arc<Window>>,
    input: InputState,
    events: Option<UiSender>,
    render: Option<Shared>,

    /// Startup error reported by `Runtime::run` after the loop exits.
    failure: Option<anyhow::Error>,
}

impl<F> AppState<F>
where
    F: FnOnce(PhysicalSize<u32>) -> Result<SceneSetup> + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, factory: F) -> Self {
        Self {
            config,
            gpu_init,
            factory: Some(factory),
            window: None,
            input: InputState::default(),
            events: None,
            render: None,
            failure: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );
        self.window = Some(Arc::clone(&window));

        let gpu = pollster::block_on(Gpu::new(Arc::clone(&window), self.gpu_init.clone()))
            .context("GPU initialization failed")?;
        let size = gpu.size();

        let (tx, rx) = input::channel();
        let mut renderer = Renderer::new(WgpuBackend::new(gpu))
            .with_input(rx)
            .with_bindings(self.config.bindings.clone());

        let factory = self.factory.take().context("scene factory already consumed")?;
        let setup = factory(size)?;
        renderer
            .load_scene(&setup.desc, setup.images.as_ref())
            .context("failed to load scene")?;

        let mut render = RenderLoop::new(renderer);
        let timer = IntervalTimer::from_hz(self.config.refresh_hz);
        render
            .start(timer, |renderer: &mut Renderer<WgpuBackend>, time| {
                if renderer.tick(time) == TickOutcome::Failed {
                    log::trace!("frame {} failed", time.frame_index);
                }
            })
            .context("failed to spawn render thread")?;

        log::info!("rendering at {} Hz ({}x{})", self.config.refresh_hz, size.width, size.height);
        self.events = Some(tx);
        self.render = Some(render);
        Ok(())
    }

    /// Joins the render thread, then tears the scene down. Idempotent.
    fn shutdown(&mut self) {
        self.events = None;
        if let Some(mut render) = self.render.take() {
            render.stop();
            if let Err(e) = render.lock().teardown() {
                log::warn!("scene teardown failed: {e}");
            }
            log::debug!("render loop stopped and scene torn down");
        }
        self.window = None;
    }

    fn send(&self, event: impl Into<UiEvent>) {
        if let Some(tx) = &self.events {
            tx.send(event);
        }
    }
}

impl<F> ApplicationHandler for AppState<F>
where
    F: FnOnce(PhysicalSize<u32>) -> Result<SceneSetup> + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        event_loop.set_control_flow(ControlFlow::Wait);

        if let Err(e) = self.start(event_loop) {
            log::error!("failed to start: {e:#}");
            self.failure = Some(e);
            self.shutdown();
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.window.as_ref().is_none_or(|w| w.id() != window_id) {
            return;
        }

        for ev in input::platform::translate_window_event(&mut self.input, &event) {
            self.send(ev);
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                event_loop.exit();
            }

            WindowEvent::KeyboardInput { event: key, .. }
                if self.config.exit_on_escape
                    && key.state == ElementState::Pressed
                    && key.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                self.shutdown();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                self.send(UiEvent::Resized { width: size.width, height: size.height });
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    self.send(UiEvent::Resized { width: size.width, height: size.height });
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
