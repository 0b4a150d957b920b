use serde::{Deserialize, Serialize};

/// How an action behaves when its time reaches the clip duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopMode {
    /// Wrap to the start and keep playing.
    Repeat,
    /// Stop at the last frame and hold it.
    Once,
}

/// A named animation clip. Keyframe data stays with the rendering engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,
    /// Seconds.
    pub duration: f32,
}

impl Clip {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct WeightFade {
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

/// Playback state of one clip: time, speed, blend weight and an optional fade.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipAction {
    clip: Clip,
    loop_mode: LoopMode,
    time: f32,
    time_scale: f32,
    weight: f32,
    fade: Option<WeightFade>,
    enabled: bool,
    paused: bool,
    finished: bool,
}

impl ClipAction {
    pub fn new(clip: Clip, loop_mode: LoopMode) -> Self {
        Self {
            clip,
            loop_mode,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            fade: None,
            enabled: false,
            paused: false,
            finished: false,
        }
    }

    pub fn clip(&self) -> &Clip {
        &self.clip
    }

    pub fn name(&self) -> &str {
        &self.clip.name
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn is_running(&self) -> bool {
        self.enabled && !self.paused
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Contribution to the blended pose; zero when disabled.
    pub fn effective_weight(&self) -> f32 {
        if self.enabled { self.weight } else { 0.0 }
    }

    /// Rewind to the start and clear any pause, fade or finished state.
    pub fn reset(&mut self) -> &mut Self {
        self.time = 0.0;
        self.enabled = true;
        self.paused = false;
        self.finished = false;
        self.fade = None;
        self
    }

    pub fn play(&mut self) -> &mut Self {
        self.enabled = true;
        self
    }

    pub fn stop(&mut self) -> &mut Self {
        self.enabled = false;
        self.fade = None;
        self
    }

    pub fn set_effective_time_scale(&mut self, scale: f32) -> &mut Self {
        self.time_scale = scale;
        self
    }

    /// Set the weight immediately, cancelling any fade in progress.
    pub fn set_effective_weight(&mut self, weight: f32) -> &mut Self {
        self.weight = weight;
        self.fade = None;
        self
    }

    /// Ramp weight from 0 to 1 over `duration` seconds.
    pub fn fade_in(&mut self, duration: f32) -> &mut Self {
        self.schedule_fade(0.0, 1.0, duration)
    }

    /// Ramp weight from its current value to 0; the action stops once it gets there.
    pub fn fade_out(&mut self, duration: f32) -> &mut Self {
        self.schedule_fade(self.weight, 0.0, duration)
    }

    fn schedule_fade(&mut self, from: f32, to: f32, duration: f32) -> &mut Self {
        self.weight = from;
        self.fade = Some(WeightFade {
            from,
            to,
            elapsed: 0.0,
            duration: duration.max(0.0),
        });
        self
    }

    /// Advance by `dt` seconds. Returns true on the update where a play-once
    /// action reaches its end.
    pub(crate) fn advance(&mut self, dt: f32) -> bool {
        if !self.enabled {
            return false;
        }
        self.advance_fade(dt);
        if !self.enabled || self.paused {
            return false;
        }

        self.time += dt * self.time_scale;
        let duration = self.clip.duration;
        match self.loop_mode {
            LoopMode::Repeat => {
                if duration > 0.0 {
                    self.time = self.time.rem_euclid(duration);
                } else {
                    self.time = 0.0;
                }
                false
            }
            LoopMode::Once => {
                if self.time >= duration && !self.finished {
                    self.time = duration;
                    self.paused = true;
                    self.finished = true;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn advance_fade(&mut self, dt: f32) {
        let Some(mut fade) = self.fade else {
            return;
        };
        fade.elapsed += dt;
        let t = if fade.duration > 0.0 {
            (fade.elapsed / fade.duration).min(1.0)
        } else {
            1.0
        };
        self.weight = fade.from + (fade.to - fade.from) * t;
        if t >= 1.0 {
            self.fade = None;
            if fade.to == 0.0 {
                self.enabled = false;
            }
        } else {
            self.fade = Some(fade);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn once(duration: f32) -> ClipAction {
        let mut a = ClipAction::new(Clip::new("kick", duration), LoopMode::Once);
        a.play();
        a
    }

    #[test]
    fn new_action_is_idle() {
        let a = ClipAction::new(Clip::new("idle", 1.0), LoopMode::Repeat);
        assert!(!a.is_running());
        assert_eq!(a.effective_weight(), 0.0);
    }

    #[test]
    fn repeat_wraps_time() {
        let mut a = ClipAction::new(Clip::new("run", 1.0), LoopMode::Repeat);
        a.play();
        assert!(!a.advance(0.75));
        assert!(!a.advance(0.5));
        assert!((a.time() - 0.25).abs() < 1e-5);
        assert!(a.is_running());
    }

    #[test]
    fn once_holds_last_frame_and_finishes_once() {
        let mut a = once(0.5);
        assert!(!a.advance(0.3));
        assert!(a.advance(0.3));
        assert_eq!(a.time(), 0.5);
        assert!(a.is_finished());
        assert!(!a.advance(0.3));
        assert_eq!(a.time(), 0.5);
        // Held, still contributing to the pose.
        assert_eq!(a.effective_weight(), 1.0);
    }

    #[test]
    fn reset_allows_replay() {
        let mut a = once(0.1);
        a.advance(0.2);
        a.reset();
        assert!(!a.is_finished());
        assert_eq!(a.time(), 0.0);
        assert!(a.advance(0.2));
    }

    #[test]
    fn fade_in_ramps_weight() {
        let mut a = ClipAction::new(Clip::new("run", 1.0), LoopMode::Repeat);
        a.reset().set_effective_weight(1.0).fade_in(0.2).play();
        assert_eq!(a.effective_weight(), 0.0);
        a.advance(0.1);
        assert!((a.effective_weight() - 0.5).abs() < 1e-5);
        a.advance(0.2);
        assert_eq!(a.effective_weight(), 1.0);
        assert!(!a.is_fading());
    }

    #[test]
    fn fade_out_disables_action() {
        let mut a = ClipAction::new(Clip::new("idle", 1.0), LoopMode::Repeat);
        a.play();
        a.fade_out(0.2);
        a.advance(0.1);
        assert!(a.is_enabled());
        a.advance(0.1);
        assert!(!a.is_enabled());
        assert_eq!(a.effective_weight(), 0.0);
    }

    #[test]
    fn set_weight_cancels_fade() {
        let mut a = ClipAction::new(Clip::new("idle", 1.0), LoopMode::Repeat);
        a.play().fade_out(1.0);
        a.set_effective_weight(0.7);
        a.advance(2.0);
        assert!(a.is_enabled());
        assert_eq!(a.effective_weight(), 0.7);
    }
}
