//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The runtime translates platform events into `UiEvent`s and queues them on
//! the channel; the render thread drains the queue at the start of each tick.

mod bindings;
mod channel;
mod state;
mod types;

pub(crate) mod platform;

pub use bindings::{Direction, KeyBindings};
pub use channel::{channel, UiReceiver, UiSender};
pub use state::InputState;
pub use types::{InputEvent, Key, MouseButton, UiEvent};
