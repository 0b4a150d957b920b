use glam::Vec3;
use mazewalk_animation::{AnimationEvent, AnimationSelector, Clip};
use mazewalk_common::{AnimationConfig, Transform};
use serde::Serialize;

/// Which of the three animation states the character is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimState {
    Idle,
    Run,
    Action,
}

/// The player character: where it stands, which way it faces and what it is playing.
///
/// While `busy` the one-shot action owns the animator. Movement and
/// locomotion clip requests are ignored until the action's finished event
/// arrives.
#[derive(Debug, Clone)]
pub struct Character {
    pub transform: Transform,
    /// Unit horizontal direction chosen this frame, or zero.
    pub move_direction: Vec3,
    animator: AnimationSelector,
    clips: AnimationConfig,
    busy: bool,
}

impl Character {
    /// Place the character and start its idle clip, if one was loaded.
    pub fn new(transform: Transform, clips: Vec<Clip>, config: &AnimationConfig) -> Self {
        let mut animator =
            AnimationSelector::from_clips(clips, |name| config.is_looping(name), config.crossfade_seconds);
        if !animator.start(&config.idle_clip) {
            tracing::warn!(clip = %config.idle_clip, "idle clip missing, character starts without animation");
        }
        Self {
            transform,
            move_direction: Vec3::ZERO,
            animator,
            clips: config.clone(),
            busy: false,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn animator(&self) -> &AnimationSelector {
        &self.animator
    }

    pub fn current_animation(&self) -> Option<&str> {
        self.animator.current()
    }

    pub fn state(&self) -> Option<AnimState> {
        let current = self.animator.current()?;
        if current == self.clips.action_clip {
            Some(AnimState::Action)
        } else if current == self.clips.run_clip {
            Some(AnimState::Run)
        } else if current == self.clips.idle_clip {
            Some(AnimState::Idle)
        } else {
            None
        }
    }

    /// Start the one-shot action unless one is already playing.
    ///
    /// Returns true if the action clip actually started. A missing clip leaves
    /// the character free to move.
    pub fn try_begin_action(&mut self) -> bool {
        if self.busy {
            return false;
        }
        if self.animator.switch_to(&self.clips.action_clip) {
            self.busy = true;
            tracing::debug!(clip = %self.clips.action_clip, "action started");
            true
        } else {
            false
        }
    }

    /// Pick run or idle from movement intent. Ignored while busy.
    pub fn request_locomotion(&mut self, moving: bool) {
        if self.busy {
            return;
        }
        let clip = if moving {
            &self.clips.run_clip
        } else {
            &self.clips.idle_clip
        };
        self.animator.switch_to(clip);
    }

    /// React to a mixer event. Only the finish of the action clip releases the busy flag.
    pub fn handle_animation_event(&mut self, event: &AnimationEvent) {
        match event {
            AnimationEvent::Finished { clip } => {
                if self.busy && *clip == self.clips.action_clip {
                    self.busy = false;
                    tracing::debug!(clip = %clip, "action finished");
                }
            }
        }
    }

    /// Advance the mixer and apply its events before returning them.
    pub fn advance_animation(&mut self, dt: f32) -> Vec<AnimationEvent> {
        let events = self.animator.update(dt);
        for event in &events {
            self.handle_animation_event(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clips() -> Vec<Clip> {
        vec![
            Clip::new("idle", 2.0),
            Clip::new("run", 0.8),
            Clip::new("kick", 1.0),
        ]
    }

    fn character() -> Character {
        Character::new(Transform::default(), clips(), &AnimationConfig::default())
    }

    #[test]
    fn starts_idle() {
        let c = character();
        assert_eq!(c.current_animation(), Some("idle"));
        assert_eq!(c.state(), Some(AnimState::Idle));
        assert!(!c.is_busy());
    }

    #[test]
    fn locomotion_toggles_run_and_idle() {
        let mut c = character();
        c.request_locomotion(true);
        assert_eq!(c.state(), Some(AnimState::Run));
        c.request_locomotion(false);
        assert_eq!(c.state(), Some(AnimState::Idle));
    }

    #[test]
    fn action_blocks_locomotion_until_finished() {
        let mut c = character();
        assert!(c.try_begin_action());
        assert!(c.is_busy());
        assert!(!c.try_begin_action());

        c.request_locomotion(true);
        assert_eq!(c.state(), Some(AnimState::Action));

        let events = c.advance_animation(0.5);
        assert!(events.is_empty());
        assert!(c.is_busy());

        let events = c.advance_animation(0.6);
        assert_eq!(events.len(), 1);
        assert!(!c.is_busy());
        c.request_locomotion(true);
        assert_eq!(c.state(), Some(AnimState::Run));
    }

    #[test]
    fn unrelated_finish_keeps_busy() {
        let mut c = character();
        c.try_begin_action();
        c.handle_animation_event(&AnimationEvent::Finished {
            clip: "wave".into(),
        });
        assert!(c.is_busy());
        c.handle_animation_event(&AnimationEvent::Finished {
            clip: "kick".into(),
        });
        assert!(!c.is_busy());
    }

    #[test]
    fn missing_action_clip_never_sets_busy() {
        let mut c = Character::new(
            Transform::default(),
            vec![Clip::new("idle", 1.0), Clip::new("run", 1.0)],
            &AnimationConfig::default(),
        );
        assert!(!c.try_begin_action());
        assert!(!c.is_busy());
    }

    #[test]
    fn no_clips_is_inert() {
        let mut c = Character::new(Transform::default(), Vec::new(), &AnimationConfig::default());
        assert_eq!(c.state(), None);
        c.request_locomotion(true);
        assert_eq!(c.current_animation(), None);
        assert!(c.advance_animation(1.0).is_empty());
    }
}
