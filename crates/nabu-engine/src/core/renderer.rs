use crate::assets::ImageSource;
use crate::gpu::{FrameStatus, GpuError, GraphicsBackend};
use crate::input::{KeyBindings, UiEvent, UiReceiver};
use crate::scene::{Scene, SceneDesc, SceneError};
use crate::time::FrameTime;

use super::RenderContext;

/// What one tick did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TickOutcome {
    /// Scene drawn and presented.
    Presented,
    /// No drawable was available; nothing drawn.
    Skipped,
    /// Drawing failed; the frame was abandoned.
    Failed,
    /// No scene loaded.
    Idle,
}

/// Owns a graphics backend and the scene drawn with it.
///
/// `tick` never panics on rendering failures: they are logged and the frame
/// is skipped, so a bad frame cannot take down the render thread.
pub struct Renderer<B: GraphicsBackend> {
    backend: B,
    scene: Option<Scene>,
    input: Option<UiReceiver>,
    bindings: KeyBindings,
}

impl<B: GraphicsBackend> Renderer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, scene: None, input: None, bindings: KeyBindings::default() }
    }

    /// Events from this receiver are drained at the start of every tick.
    pub fn with_input(mut self, input: UiReceiver) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_bindings(mut self, bindings: KeyBindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Loads a scene, tearing down the current one first.
    pub fn load_scene(&mut self, desc: &SceneDesc, images: &dyn ImageSource) -> Result<(), SceneError> {
        self.teardown()?;
        self.scene = Some(Scene::load(&mut self.backend, desc, images)?);
        Ok(())
    }

    /// Runs one frame: input, camera, scene update, draw, present.
    pub fn tick(&mut self, time: FrameTime) -> TickOutcome {
        self.drain_input();

        let Some(scene) = self.scene.as_mut() else {
            return TickOutcome::Idle;
        };

        scene.camera_mut().update_view_matrix(time.dt);
        let mut ctx = RenderContext::new(&mut self.backend, time);
        scene.update(&mut ctx);

        match ctx.backend.begin_frame() {
            Ok(FrameStatus::Ready) => {}
            Ok(FrameStatus::Skip) => {
                log::trace!("frame {} skipped: no drawable", time.frame_index);
                return TickOutcome::Skipped;
            }
            Err(e) => {
                log::warn!("frame {}: begin failed: {e}", time.frame_index);
                return TickOutcome::Skipped;
            }
        }

        if let Err(e) = scene.draw(&mut ctx) {
            log::error!("frame {}: draw failed: {e}", time.frame_index);
            ctx.backend.abandon_frame();
            return TickOutcome::Failed;
        }

        match ctx.backend.present() {
            Ok(()) => TickOutcome::Presented,
            Err(e) => {
                log::error!("frame {}: present failed: {e}", time.frame_index);
                TickOutcome::Failed
            }
        }
    }

    fn drain_input(&mut self) {
        let Some(input) = &self.input else {
            return;
        };
        for event in input.drain() {
            match event {
                UiEvent::Input(ev) => {
                    if let Some(scene) = self.scene.as_mut() {
                        scene.handle_input(&ev, &self.bindings);
                    }
                }
                UiEvent::Resized { width, height } => {
                    log::debug!("viewport resized to {width}x{height}");
                    self.backend.resize(width, height);
                    if let Some(scene) = self.scene.as_mut() {
                        scene.resize(width, height);
                    }
                }
            }
        }
    }

    /// Destroys the scene's GPU resources and drops the scene. Idempotent.
    pub fn teardown(&mut self) -> Result<(), GpuError> {
        match self.scene.take() {
            Some(mut scene) => scene.teardown(&mut self.backend),
            None => Ok(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }
}

impl<B: GraphicsBackend> Drop for Renderer<B> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            log::warn!("teardown on drop: {e}");
        }
    }
}
