//! Input State: which keys are held right now, mapped to logical actions.
//!
//! # Invariants
//! - Key names are compared case-insensitively.
//! - State is polled by the frame update, never pushed into it.

pub mod action;

pub use action::{Action, KeyBindings, MovementKeys};
use std::collections::HashSet;

/// Set of currently held keys, stored lowercased.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_down(&mut self, key: &str) {
        if self.held.insert(key.to_lowercase()) {
            tracing::trace!(key, "key down");
        }
    }

    pub fn key_up(&mut self, key: &str) {
        if self.held.remove(&key.to_lowercase()) {
            tracing::trace!(key, "key up");
        }
    }

    /// Apply a key event.
    pub fn set_key(&mut self, key: &str, pressed: bool) {
        if pressed {
            self.key_down(key);
        } else {
            self.key_up(key);
        }
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        !key.is_empty() && self.held.contains(&key.to_lowercase())
    }

    /// True when any key bound to `action` is held.
    pub fn is_active(&self, bindings: &KeyBindings, action: Action) -> bool {
        bindings.keys_for(action).any(|key| self.is_key_pressed(key))
    }

    pub fn movement(&self, bindings: &KeyBindings) -> MovementKeys {
        MovementKeys {
            forward: self.is_active(bindings, Action::MoveForward),
            back: self.is_active(bindings, Action::MoveBack),
            left: self.is_active(bindings, Action::MoveLeft),
            right: self.is_active(bindings, Action::MoveRight),
        }
    }

    /// Release everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }

    pub fn held_count(&self) -> usize {
        self.held.len()
    }
}

pub fn crate_info() -> &'static str {
    "mazewalk-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_insensitive() {
        let mut input = InputState::new();
        input.key_down("W");
        assert!(input.is_key_pressed("w"));
        assert!(input.is_key_pressed("W"));
        input.key_up("w");
        assert!(!input.is_key_pressed("W"));
    }

    #[test]
    fn empty_key_is_never_pressed() {
        let mut input = InputState::new();
        input.key_down("");
        assert!(!input.is_key_pressed(""));
    }

    #[test]
    fn arrow_aliases_drive_movement() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new();
        input.key_down("ArrowUp");
        input.key_down("d");
        let m = input.movement(&bindings);
        assert!(m.forward && m.right);
        assert!(!m.back && !m.left);
        assert!(m.any());
    }

    #[test]
    fn space_triggers_action() {
        let bindings = KeyBindings::default();
        let mut input = InputState::new();
        assert!(!input.is_active(&bindings, Action::TriggerAction));
        input.set_key(" ", true);
        assert!(input.is_active(&bindings, Action::TriggerAction));
        input.clear();
        assert_eq!(input.held_count(), 0);
    }

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
