use std::collections::HashSet;

use super::types::{InputEvent, Key, MouseButton};

/// Held keys and drag state for a single window.
///
/// The runtime feeds raw platform transitions through this to produce
/// debounced [`InputEvent`]s: repeats are swallowed and a focus loss
/// releases everything still held.
#[derive(Debug)]
pub struct InputState {
    /// Button that turns pointer motion into `MouseDrag`.
    pub drag_button: MouseButton,

    /// Whether `drag_button` is currently held.
    pub dragging: bool,

    /// Last pointer position in physical pixels.
    pub pointer_pos: Option<(f32, f32)>,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            drag_button: MouseButton::Left,
            dragging: false,
            pointer_pos: None,
            keys_down: HashSet::new(),
        }
    }
}

impl InputState {
    /// `KeyDown` on the first press, `None` for repeats.
    pub fn press(&mut self, key: Key) -> Option<InputEvent> {
        self.keys_down.insert(key).then_some(InputEvent::KeyDown(key))
    }

    /// `KeyUp` if the key was held.
    pub fn release(&mut self, key: Key) -> Option<InputEvent> {
        self.keys_down.remove(&key).then_some(InputEvent::KeyUp(key))
    }

    pub fn button(&mut self, button: MouseButton, pressed: bool) {
        if button == self.drag_button {
            self.dragging = pressed;
        }
    }

    /// Records the new pointer position; yields a drag delta while dragging.
    pub fn pointer_moved(&mut self, x: f32, y: f32) -> Option<InputEvent> {
        let previous = self.pointer_pos.replace((x, y));
        match previous {
            Some((px, py)) if self.dragging => Some(InputEvent::MouseDrag { dx: x - px, dy: y - py }),
            _ => None,
        }
    }

    pub fn pointer_left(&mut self) {
        self.pointer_pos = None;
    }

    /// Releases every held key and ends any drag.
    ///
    /// Avoids stuck movement when focus changes mid-press.
    pub fn focus_lost(&mut self) -> Vec<InputEvent> {
        self.dragging = false;
        self.pointer_pos = None;
        self.keys_down.drain().map(InputEvent::KeyUp).collect()
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }
}
