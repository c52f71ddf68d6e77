//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Intended usage:
//! - one `FrameClock` per render loop
//! - a `RenderLoop` ticks on its own thread, paced by a `TickSource`

mod frame_clock;
mod render_loop;
mod tick_source;

pub use frame_clock::{FrameClock, FrameTime};
pub use render_loop::RenderLoop;
pub use tick_source::{IntervalTimer, TickSource};
