//! wgpu render backend for the maze walkthrough.
//!
//! Draws the imported maze surfaces, a box proxy for the character and a
//! ground grid from the third-person camera, then the minimap inset on top.
//!
//! # Invariants
//! - Rendering never mutates the session.
//! - The minimap pass clears depth and restores the full-surface viewport afterwards.
//! - The minimap marker is drawn only by the minimap pass.

mod frame;
mod gpu;
mod shaders;

pub use frame::{MinimapPass, SceneFrame};
pub use gpu::WgpuRenderer;

pub fn crate_info() -> &'static str {
    "mazewalk-render-wgpu v0.1.0"
}
