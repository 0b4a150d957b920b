use crate::action::{Clip, ClipAction, LoopMode};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Reported by [`AnimationMixer::update`] during the frame it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationEvent {
    /// A play-once action reached its last frame.
    Finished { clip: String },
}

/// Owns the actions of one character and advances them together.
///
/// Uses BTreeMap so events come out in a stable order within a frame.
#[derive(Debug, Clone, Default)]
pub struct AnimationMixer {
    actions: BTreeMap<String, ClipAction>,
    time: f32,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip. Replaces any action with the same name.
    pub fn add_clip(&mut self, clip: Clip, loop_mode: LoopMode) -> &mut ClipAction {
        let action = ClipAction::new(clip.clone(), loop_mode);
        match self.actions.entry(clip.name) {
            Entry::Occupied(mut entry) => {
                entry.insert(action);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(action),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn action(&self, name: &str) -> Option<&ClipAction> {
        self.actions.get(name)
    }

    pub fn action_mut(&mut self, name: &str) -> Option<&mut ClipAction> {
        self.actions.get_mut(name)
    }

    pub fn clip_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Total time advanced so far.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Non-zero blend weights, for debugging and HUD output.
    pub fn weights(&self) -> Vec<(&str, f32)> {
        self.actions
            .iter()
            .map(|(name, a)| (name.as_str(), a.effective_weight()))
            .filter(|(_, w)| *w > 0.0)
            .collect()
    }

    /// Advance every action by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> Vec<AnimationEvent> {
        self.time += dt;
        let mut events = Vec::new();
        for (name, action) in &mut self.actions {
            if action.advance(dt) {
                tracing::debug!(clip = %name, "animation finished");
                events.push(AnimationEvent::Finished { clip: name.clone() });
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_reports_finished_once() {
        let mut mixer = AnimationMixer::new();
        mixer.add_clip(Clip::new("kick", 0.5), LoopMode::Once).play();
        mixer.add_clip(Clip::new("idle", 2.0), LoopMode::Repeat).play();

        assert!(mixer.update(0.25).is_empty());
        let events = mixer.update(0.5);
        assert_eq!(
            events,
            vec![AnimationEvent::Finished {
                clip: "kick".into()
            }]
        );
        assert!(mixer.update(0.5).is_empty());
        assert!((mixer.time() - 1.25).abs() < 1e-5);
    }

    #[test]
    fn weights_skip_disabled_actions() {
        let mut mixer = AnimationMixer::new();
        mixer.add_clip(Clip::new("idle", 1.0), LoopMode::Repeat).play();
        mixer.add_clip(Clip::new("run", 1.0), LoopMode::Repeat);
        assert_eq!(mixer.weights(), vec![("idle", 1.0)]);
        assert_eq!(mixer.len(), 2);
        assert!(mixer.contains("run"));
        assert!(!mixer.contains("kick"));
    }
}
