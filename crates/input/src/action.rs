use std::collections::BTreeMap;

/// A logical action produced by one or more keys.
///
/// The controller consumes actions, never raw key names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    /// Start the one-shot action clip.
    TriggerAction,
}

/// Key name (lowercase) to action mapping. Several keys may share an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    bindings: BTreeMap<String, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self::empty();
        for (key, action) in [
            ("w", Action::MoveForward),
            ("arrowup", Action::MoveForward),
            ("s", Action::MoveBack),
            ("arrowdown", Action::MoveBack),
            ("a", Action::MoveLeft),
            ("arrowleft", Action::MoveLeft),
            ("d", Action::MoveRight),
            ("arrowright", Action::MoveRight),
            (" ", Action::TriggerAction),
        ] {
            bindings.bind(key, action);
        }
        bindings
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    pub fn bind(&mut self, key: &str, action: Action) {
        self.bindings.insert(key.to_lowercase(), action);
    }

    pub fn action_for(&self, key: &str) -> Option<Action> {
        self.bindings.get(&key.to_lowercase()).copied()
    }

    pub fn keys_for(&self, action: Action) -> impl Iterator<Item = &str> {
        self.bindings
            .iter()
            .filter(move |(_, a)| **a == action)
            .map(|(k, _)| k.as_str())
    }
}

/// Snapshot of the four movement actions for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementKeys {
    pub fn any(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_have_aliases() {
        let b = KeyBindings::default();
        let keys: Vec<&str> = b.keys_for(Action::MoveForward).collect();
        assert_eq!(keys, vec!["arrowup", "w"]);
        assert_eq!(b.action_for("ArrowLeft"), Some(Action::MoveLeft));
        assert_eq!(b.action_for("q"), None);
    }

    #[test]
    fn rebinding_replaces_key() {
        let mut b = KeyBindings::empty();
        b.bind("E", Action::TriggerAction);
        assert_eq!(b.action_for("e"), Some(Action::TriggerAction));
        b.bind("e", Action::MoveBack);
        assert_eq!(b.keys_for(Action::TriggerAction).count(), 0);
    }

    #[test]
    fn movement_keys_any() {
        assert!(!MovementKeys::default().any());
        let m = MovementKeys {
            left: true,
            ..Default::default()
        };
        assert!(m.any());
    }
}
