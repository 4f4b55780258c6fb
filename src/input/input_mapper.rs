//! Input mapping from raw keys to semantic actions
//!
//! Maps keyboard input to high-level actions like ToggleCageRotate, Exit, etc.
//! Pointer input is NOT mapped here - it goes to the pointer tracker and the
//! gesture protocol.

use winit::event::ElementState;
use winit::keyboard::KeyCode;

/// Actions triggered by keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Switch pointer input between gestures and cage rotation (C key)
    ToggleCageRotate,
    /// Remove every spawned instance (Delete key)
    ClearInstances,
    /// Spawn the next shape above the cage (N key)
    Spawn,
    /// Abort the gesture in progress (Escape while a pointer is down)
    CancelGesture,
    /// Exit application (Escape when idle)
    Exit,
    /// Toggle fullscreen mode (F key)
    ToggleFullscreen,
    /// Toggle orbit smoothing (G key)
    ToggleSmoothing,
}

/// Maps raw key events to semantic actions
pub struct InputMapper;

impl InputMapper {
    /// Map keyboard input to an action
    ///
    /// Returns `Some(action)` for bound keys, `None` otherwise
    pub fn map_keyboard(key: KeyCode, state: ElementState, gesture_active: bool) -> Option<InputAction> {
        // Only handle key presses, not releases
        if state != ElementState::Pressed {
            return None;
        }

        match key {
            KeyCode::Escape => {
                if gesture_active {
                    Some(InputAction::CancelGesture)
                } else {
                    Some(InputAction::Exit)
                }
            }
            KeyCode::KeyC => Some(InputAction::ToggleCageRotate),
            KeyCode::Delete | KeyCode::Backspace => Some(InputAction::ClearInstances),
            KeyCode::KeyN => Some(InputAction::Spawn),
            KeyCode::KeyF => Some(InputAction::ToggleFullscreen),
            KeyCode::KeyG => Some(InputAction::ToggleSmoothing),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_during_gesture_cancels() {
        let action = InputMapper::map_keyboard(KeyCode::Escape, ElementState::Pressed, true);
        assert_eq!(action, Some(InputAction::CancelGesture));
    }

    #[test]
    fn test_escape_when_idle_exits() {
        let action = InputMapper::map_keyboard(KeyCode::Escape, ElementState::Pressed, false);
        assert_eq!(action, Some(InputAction::Exit));
    }

    #[test]
    fn test_unbound_keys_not_mapped() {
        for key in [KeyCode::KeyW, KeyCode::KeyA, KeyCode::KeyS, KeyCode::Space] {
            let action = InputMapper::map_keyboard(key, ElementState::Pressed, false);
            assert_eq!(action, None, "Key {:?} should not be mapped", key);
        }
    }

    #[test]
    fn test_key_release_ignored() {
        let action = InputMapper::map_keyboard(KeyCode::KeyC, ElementState::Released, false);
        assert_eq!(action, None);
    }

    #[test]
    fn test_sandbox_keys() {
        assert_eq!(
            InputMapper::map_keyboard(KeyCode::KeyC, ElementState::Pressed, false),
            Some(InputAction::ToggleCageRotate)
        );
        assert_eq!(
            InputMapper::map_keyboard(KeyCode::Delete, ElementState::Pressed, false),
            Some(InputAction::ClearInstances)
        );
        assert_eq!(
            InputMapper::map_keyboard(KeyCode::KeyN, ElementState::Pressed, true),
            Some(InputAction::Spawn)
        );
        assert_eq!(
            InputMapper::map_keyboard(KeyCode::KeyG, ElementState::Pressed, false),
            Some(InputAction::ToggleSmoothing)
        );
    }
}
