//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read a [`mazewalk_kernel::Session`]; they never mutate it.
//! - The main camera sees only the scene layer; the minimap sees every layer.
//! - Viewport and scissor state changed for the minimap inset is restored
//!   before the next pass.

mod layers;
pub mod minimap;
mod renderer;

pub use layers::RenderLayers;
pub use minimap::{
    Indicator, MinimapCamera, ViewportRect, ViewportState, ViewportTarget, inset_rect,
    render_inset,
};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "mazewalk-render v0.1.0"
}
