use crate::action::{Clip, LoopMode};
use crate::mixer::{AnimationEvent, AnimationMixer};

/// Chooses which clip is current and crossfades between them.
#[derive(Debug, Clone)]
pub struct AnimationSelector {
    mixer: AnimationMixer,
    current: Option<String>,
    crossfade: f32,
}

impl AnimationSelector {
    pub fn new(mixer: AnimationMixer, crossfade: f32) -> Self {
        Self {
            mixer,
            current: None,
            crossfade,
        }
    }

    /// Build a mixer from loaded clips; `is_looping` picks each clip's loop mode.
    pub fn from_clips(
        clips: impl IntoIterator<Item = Clip>,
        is_looping: impl Fn(&str) -> bool,
        crossfade: f32,
    ) -> Self {
        let mut mixer = AnimationMixer::new();
        for clip in clips {
            let mode = if is_looping(&clip.name) {
                LoopMode::Repeat
            } else {
                LoopMode::Once
            };
            mixer.add_clip(clip, mode);
        }
        Self::new(mixer, crossfade)
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn mixer(&self) -> &AnimationMixer {
        &self.mixer
    }

    pub fn has_clip(&self, name: &str) -> bool {
        self.mixer.contains(name)
    }

    /// Play the first clip outright, without a fade.
    pub fn start(&mut self, name: &str) -> bool {
        let Some(action) = self.mixer.action_mut(name) else {
            return false;
        };
        action.reset().play();
        self.current = Some(name.to_string());
        true
    }

    /// Crossfade to `name`.
    ///
    /// Requesting the current clip, or one that was never loaded, does nothing
    /// and returns false.
    pub fn switch_to(&mut self, name: &str) -> bool {
        if self.current.as_deref() == Some(name) || !self.mixer.contains(name) {
            return false;
        }
        if let Some(previous) = self.current.take() {
            if let Some(action) = self.mixer.action_mut(&previous) {
                action.fade_out(self.crossfade);
            }
        }
        if let Some(next) = self.mixer.action_mut(name) {
            next.reset()
                .set_effective_time_scale(1.0)
                .set_effective_weight(1.0)
                .fade_in(self.crossfade)
                .play();
        }
        tracing::debug!(clip = name, "switching animation");
        self.current = Some(name.to_string());
        true
    }

    pub fn update(&mut self, dt: f32) -> Vec<AnimationEvent> {
        self.mixer.update(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> AnimationSelector {
        let clips = [
            Clip::new("idle", 2.0),
            Clip::new("run", 0.8),
            Clip::new("kick", 1.0),
        ];
        let mut s = AnimationSelector::from_clips(clips, |n| n != "kick", 0.2);
        assert!(s.start("idle"));
        s
    }

    #[test]
    fn switching_to_current_is_noop() {
        let mut s = selector();
        s.update(0.5);
        let before = s.mixer().action("idle").unwrap().clone();
        assert!(!s.switch_to("idle"));
        assert_eq!(s.mixer().action("idle").unwrap(), &before);
        assert_eq!(s.current(), Some("idle"));
    }

    #[test]
    fn unknown_clip_is_skipped() {
        let mut s = selector();
        assert!(!s.switch_to("dance"));
        assert_eq!(s.current(), Some("idle"));
    }

    #[test]
    fn switch_crossfades_both_actions() {
        let mut s = selector();
        s.update(0.5);
        assert!(s.switch_to("run"));
        assert_eq!(s.current(), Some("run"));

        let run = s.mixer().action("run").unwrap();
        assert_eq!(run.time(), 0.0);
        assert_eq!(run.effective_weight(), 0.0);
        assert!(s.mixer().action("idle").unwrap().is_fading());

        s.update(0.1);
        let idle_w = s.mixer().action("idle").unwrap().effective_weight();
        let run_w = s.mixer().action("run").unwrap().effective_weight();
        assert!((idle_w - 0.5).abs() < 1e-4);
        assert!((run_w - 0.5).abs() < 1e-4);

        s.update(0.2);
        assert!(!s.mixer().action("idle").unwrap().is_enabled());
        assert_eq!(s.mixer().action("run").unwrap().effective_weight(), 1.0);
    }

    #[test]
    fn one_shot_holds_until_switched_away() {
        let mut s = selector();
        assert!(s.switch_to("kick"));
        let events = s.update(1.5);
        assert_eq!(
            events,
            vec![AnimationEvent::Finished {
                clip: "kick".into()
            }]
        );
        assert_eq!(s.current(), Some("kick"));
        assert_eq!(s.mixer().action("kick").unwrap().time(), 1.0);
        assert!(s.switch_to("idle"));
        assert!(s.mixer().action("kick").unwrap().is_fading());
    }

    #[test]
    fn empty_selector_ignores_requests() {
        let mut s = AnimationSelector::new(AnimationMixer::new(), 0.2);
        assert!(!s.start("idle"));
        assert!(!s.switch_to("run"));
        assert_eq!(s.current(), None);
        assert!(s.update(1.0).is_empty());
    }
}
