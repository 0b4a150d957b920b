//! Animation playback: named clip actions, weight crossfades, finished events.
//!
//! Skinning and pose sampling belong to the rendering engine. This crate only
//! tracks what each clip's time and blend weight are, which is all the frame
//! update needs to decide what plays next.
//!
//! # Invariants
//! - Exactly one action is current at a time; fades may overlap.
//! - A play-once action reports `Finished` exactly once per playback.

mod action;
mod mixer;
mod selector;

pub use action::{Clip, ClipAction, LoopMode};
pub use mixer::{AnimationEvent, AnimationMixer};
pub use selector::AnimationSelector;

pub fn crate_info() -> &'static str {
    "mazewalk-animation v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("animation"));
    }
}
