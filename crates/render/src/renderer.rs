use glam::{Mat4, Vec3};
use mazewalk_kernel::Session;
use std::fmt::Write;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 10.0, 10.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
        }
    }
}

impl RenderView {
    /// The third-person view of a running session.
    pub fn from_session(session: &Session) -> Self {
        let orbit = session.orbit();
        Self {
            eye: orbit.position,
            target: orbit.target,
            fov_degrees: session.config().camera.fov_degrees,
        }
    }

    pub fn view_projection(&self, aspect: f32, near: f32, far: f32) -> Mat4 {
        let projection = Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, near, far);
        projection * Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads session state and a view configuration, then produces
/// output. It never mutates the session.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given session and view.
    fn render(&self, session: &Session, view: &RenderView) -> Self::Output;
}

/// Human-readable frame summary for the CLI, logs and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, session: &Session, view: &RenderView) -> String {
        let mut out = String::new();
        let world = session.world();
        let character = session.character();
        let p = character.position();

        let _ = writeln!(
            out,
            "=== Frame {} (t={:.2}s) ===",
            session.frame_count(),
            session.elapsed()
        );
        let _ = writeln!(
            out,
            "Walls: {} of {} surfaces",
            world.walls().len(),
            world.surface_count()
        );
        let _ = writeln!(
            out,
            "Character: pos=({:.2}, {:.2}, {:.2}) yaw={:.2} anim={} busy={}",
            p.x,
            p.y,
            p.z,
            character.transform.yaw(),
            character.current_animation().unwrap_or("none"),
            character.is_busy()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z, view.fov_degrees
        );
        out
    }
}
