use std::collections::HashSet;

use glam::Vec2;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::engine::events::{Event, EventKind};

/// Polled input state, kept current by the application before each event
/// reaches the layers.
#[derive(Debug, Default)]
pub struct InputHandler {
    pressed_keys: HashSet<KeyCode>,
    pressed_buttons: HashSet<MouseButton>,
    mouse_position: Vec2,
}

impl InputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_event(&mut self, event: &Event) {
        match event.kind {
            EventKind::KeyPressed(e) => {
                self.pressed_keys.insert(e.key);
            }
            EventKind::KeyReleased(e) => {
                self.pressed_keys.remove(&e.key);
            }
            EventKind::MouseButtonPressed(e) => {
                self.pressed_buttons.insert(e.button);
            }
            EventKind::MouseButtonReleased(e) => {
                self.pressed_buttons.remove(&e.button);
            }
            EventKind::MouseMoved(e) => {
                self.mouse_position = Vec2::new(e.x, e.y);
            }
            _ => (),
        }
    }

    /// Forget held keys and buttons, e.g. when focus is lost.
    pub fn reset(&mut self) {
        self.pressed_keys.clear();
        self.pressed_buttons.clear();
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// Cursor position in window pixels, origin top-left.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Unit-length movement direction from the WASD keys, +Y up.
    pub fn wasd_axis(&self) -> Vec2 {
        let mut axis = Vec2::ZERO;
        if self.is_key_pressed(KeyCode::KeyW) {
            axis.y += 1.0;
        }
        if self.is_key_pressed(KeyCode::KeyS) {
            axis.y -= 1.0;
        }
        if self.is_key_pressed(KeyCode::KeyD) {
            axis.x += 1.0;
        }
        if self.is_key_pressed(KeyCode::KeyA) {
            axis.x -= 1.0;
        }
        axis.normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::*;

    #[test]
    fn tracks_keys_and_buttons() {
        let mut input = InputHandler::new();
        input.on_event(&KeyPressedEvent { key: KeyCode::KeyW, repeat_count: 0 }.into());
        input.on_event(&MouseButtonPressedEvent { button: MouseButton::Left }.into());
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(input.is_mouse_button_pressed(MouseButton::Left));

        input.on_event(&KeyReleasedEvent { key: KeyCode::KeyW }.into());
        assert!(!input.is_key_pressed(KeyCode::KeyW));

        input.reset();
        assert!(!input.is_mouse_button_pressed(MouseButton::Left));
    }

    #[test]
    fn mouse_position_follows_moves() {
        let mut input = InputHandler::new();
        input.on_event(&MouseMovedEvent { x: 100.0, y: 50.0 }.into());
        assert_eq!(input.mouse_position(), Vec2::new(100.0, 50.0));
    }

    #[test]
    fn diagonal_axis_is_normalized() {
        let mut input = InputHandler::new();
        input.on_event(&KeyPressedEvent { key: KeyCode::KeyW, repeat_count: 0 }.into());
        input.on_event(&KeyPressedEvent { key: KeyCode::KeyD, repeat_count: 0 }.into());
        let axis = input.wasd_axis();
        assert!((axis.length() - 1.0).abs() < 1e-6);
        assert!(axis.x > 0.0 && axis.y > 0.0);
    }
}
