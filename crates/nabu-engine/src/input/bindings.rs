use std::collections::HashMap;

use super::Key;

/// Camera movement direction.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

/// Key to movement direction map.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<Key, Direction>,
}

impl Default for KeyBindings {
    /// WASD plus arrow keys.
    fn default() -> Self {
        Self::empty()
            .bind(Key::W, Direction::Forward)
            .bind(Key::ArrowUp, Direction::Forward)
            .bind(Key::S, Direction::Backward)
            .bind(Key::ArrowDown, Direction::Backward)
            .bind(Key::A, Direction::Left)
            .bind(Key::ArrowLeft, Direction::Left)
            .bind(Key::D, Direction::Right)
            .bind(Key::ArrowRight, Direction::Right)
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self { map: HashMap::new() }
    }

    /// Binds `key`, replacing any previous binding of that key.
    pub fn bind(mut self, key: Key, direction: Direction) -> Self {
        self.map.insert(key, direction);
        self
    }

    pub fn unbind(&mut self, key: Key) -> Option<Direction> {
        self.map.remove(&key)
    }

    pub fn direction(&self, key: Key) -> Option<Direction> {
        self.map.get(&key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_wasd_and_arrows() {
        let b = KeyBindings::default();
        assert_eq!(b.direction(Key::W), Some(Direction::Forward));
        assert_eq!(b.direction(Key::ArrowDown), Some(Direction::Backward));
        assert_eq!(b.direction(Key::A), Some(Direction::Left));
        assert_eq!(b.direction(Key::ArrowRight), Some(Direction::Right));
        assert_eq!(b.direction(Key::Q), None);
    }

    #[test]
    fn rebinding_replaces() {
        let mut b = KeyBindings::default().bind(Key::W, Direction::Backward);
        assert_eq!(b.direction(Key::W), Some(Direction::Backward));
        assert_eq!(b.unbind(Key::W), Some(Direction::Backward));
        assert_eq!(b.direction(Key::W), None);
    }
}
