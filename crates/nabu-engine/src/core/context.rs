use crate::gpu::GraphicsBackend;
use crate::time::FrameTime;

/// Per-tick context passed to `Scene::update` and `Scene::draw`.
///
/// Lifetimes:
/// - `'a` is the duration of the tick
pub struct RenderContext<'a> {
    pub backend: &'a mut dyn GraphicsBackend,
    pub time: FrameTime,
}

impl<'a> RenderContext<'a> {
    pub fn new(backend: &'a mut dyn GraphicsBackend, time: FrameTime) -> Self {
        Self { backend, time }
    }
}
