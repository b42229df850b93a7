//! Keyboard and mouse state, fed from winit events and polled once per frame.

use std::collections::HashSet;

pub use winit::keyboard::KeyCode;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

impl From<winit::event::MouseButton> for MouseButton {
    fn from(button: winit::event::MouseButton) -> Self {
        match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Other,
        }
    }
}

/// Snapshot of held keys and buttons plus per-frame edges and mouse motion.
///
/// Event handlers call the `on_*` methods as winit delivers events; the frame
/// loop reads the state and then calls [`begin_frame`](Self::begin_frame) to
/// clear the edges before the next batch of events.
#[derive(Debug, Default)]
pub struct InputState {
    pressed_keys: HashSet<KeyCode>,
    just_pressed_keys: HashSet<KeyCode>,

    pressed_buttons: HashSet<MouseButton>,
    just_pressed_buttons: HashSet<MouseButton>,

    mouse_position: Option<(f32, f32)>,
    mouse_delta: (f32, f32),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the per-frame edges and the accumulated mouse delta.
    pub fn begin_frame(&mut self) {
        self.just_pressed_keys.clear();
        self.just_pressed_buttons.clear();
        self.mouse_delta = (0.0, 0.0);
    }

    pub fn on_key_pressed(&mut self, key: KeyCode) {
        if self.pressed_keys.insert(key) {
            self.just_pressed_keys.insert(key);
        }
    }

    pub fn on_key_released(&mut self, key: KeyCode) {
        self.pressed_keys.remove(&key);
    }

    pub fn on_mouse_pressed(&mut self, button: MouseButton) {
        if self.pressed_buttons.insert(button) {
            self.just_pressed_buttons.insert(button);
        }
    }

    pub fn on_mouse_released(&mut self, button: MouseButton) {
        self.pressed_buttons.remove(&button);
    }

    /// Records a cursor position. Motion accumulates until the next
    /// [`begin_frame`](Self::begin_frame); the very first position only
    /// establishes a reference point.
    pub fn on_mouse_moved(&mut self, x: f32, y: f32) {
        if let Some((old_x, old_y)) = self.mouse_position {
            self.mouse_delta.0 += x - old_x;
            self.mouse_delta.1 += y - old_y;
        }
        self.mouse_position = Some((x, y));
    }

    /// Releases everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.pressed_keys.clear();
        self.pressed_buttons.clear();
        self.begin_frame();
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn is_key_just_pressed(&self, key: KeyCode) -> bool {
        self.just_pressed_keys.contains(&key)
    }

    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    pub fn is_mouse_just_pressed(&self, button: MouseButton) -> bool {
        self.just_pressed_buttons.contains(&button)
    }

    /// `1.0` while only `positive` is held, `-1.0` while only `negative` is
    /// held, `0.0` otherwise.
    pub fn axis(&self, positive: KeyCode, negative: KeyCode) -> f32 {
        let mut value = 0.0;
        if self.is_key_pressed(positive) {
            value += 1.0;
        }
        if self.is_key_pressed(negative) {
            value -= 1.0;
        }
        value
    }

    pub fn mouse_position(&self) -> Option<(f32, f32)> {
        self.mouse_position
    }

    /// Mouse movement accumulated since the last [`begin_frame`](Self::begin_frame).
    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press_sets_edge_once() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyW);
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(input.is_key_just_pressed(KeyCode::KeyW));

        input.begin_frame();
        // OS key repeat delivers the press again
        input.on_key_pressed(KeyCode::KeyW);
        assert!(input.is_key_pressed(KeyCode::KeyW));
        assert!(!input.is_key_just_pressed(KeyCode::KeyW));

        input.on_key_released(KeyCode::KeyW);
        assert!(!input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_axis() {
        let mut input = InputState::new();
        assert_eq!(input.axis(KeyCode::KeyW, KeyCode::KeyS), 0.0);

        input.on_key_pressed(KeyCode::KeyW);
        assert_eq!(input.axis(KeyCode::KeyW, KeyCode::KeyS), 1.0);

        input.on_key_pressed(KeyCode::KeyS);
        assert_eq!(input.axis(KeyCode::KeyW, KeyCode::KeyS), 0.0);

        input.on_key_released(KeyCode::KeyW);
        assert_eq!(input.axis(KeyCode::KeyW, KeyCode::KeyS), -1.0);
    }

    #[test]
    fn test_first_mouse_position_has_no_delta() {
        let mut input = InputState::new();
        input.on_mouse_moved(100.0, 50.0);
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
        assert_eq!(input.mouse_position(), Some((100.0, 50.0)));
    }

    #[test]
    fn test_mouse_delta_accumulates_until_begin_frame() {
        let mut input = InputState::new();
        input.on_mouse_moved(0.0, 0.0);
        input.on_mouse_moved(3.0, -1.0);
        input.on_mouse_moved(5.0, 2.0);
        assert_eq!(input.mouse_delta(), (5.0, 2.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
    }

    #[test]
    fn test_mouse_buttons() {
        let mut input = InputState::new();
        input.on_mouse_pressed(MouseButton::Right);
        assert!(input.is_mouse_pressed(MouseButton::Right));
        assert!(input.is_mouse_just_pressed(MouseButton::Right));
        assert!(!input.is_mouse_pressed(MouseButton::Left));

        input.begin_frame();
        assert!(input.is_mouse_pressed(MouseButton::Right));
        assert!(!input.is_mouse_just_pressed(MouseButton::Right));

        input.on_mouse_released(MouseButton::Right);
        assert!(!input.is_mouse_pressed(MouseButton::Right));
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut input = InputState::new();
        input.on_key_pressed(KeyCode::KeyA);
        input.on_mouse_pressed(MouseButton::Left);
        input.clear();
        assert!(!input.is_key_pressed(KeyCode::KeyA));
        assert!(!input.is_mouse_pressed(MouseButton::Left));
    }
}
