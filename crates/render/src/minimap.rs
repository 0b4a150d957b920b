//! Top-down minimap: camera framing, inset placement, the character marker,
//! and the viewport bookkeeping around the inset pass.

use crate::layers::RenderLayers;
use glam::{Mat4, Quat, Vec3};
use mazewalk_common::{Aabb, MinimapConfig, Transform};

/// Pixel rectangle with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ViewportRect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Bottom-right square for the minimap, or `None` when disabled or the surface is empty.
///
/// The square shrinks to fit surfaces smaller than the configured size and
/// never extends past the surface edges.
pub fn inset_rect(surface_width: u32, surface_height: u32, cfg: &MinimapConfig) -> Option<ViewportRect> {
    if !cfg.enabled {
        return None;
    }
    let size = cfg.size_px.min(surface_width).min(surface_height);
    if size == 0 {
        return None;
    }
    let span = size.saturating_add(cfg.margin_px);
    Some(ViewportRect {
        x: surface_width.saturating_sub(span),
        y: surface_height.saturating_sub(span),
        width: size,
        height: size,
    })
}

/// Orthographic camera looking straight down on the maze, north (-Z) up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Half the side of the square the projection covers.
    pub half_extent: f32,
    pub near: f32,
    pub far: f32,
}

impl MinimapCamera {
    /// Frame the horizontal footprint of `bounds` with the configured margin.
    pub fn fit(bounds: &Aabb, cfg: &MinimapConfig, maze_scale: f32) -> Option<Self> {
        if bounds.is_empty() {
            return None;
        }
        let size = bounds.size();
        let span = size.x.max(size.z) * cfg.frame_margin;
        if span <= 0.0 {
            return None;
        }
        let center = bounds.center();
        let height = span * cfg.camera_height_factor;
        let camera = Self {
            eye: center + Vec3::new(0.0, height, 0.0),
            target: center,
            up: Vec3::NEG_Z,
            half_extent: span / 2.0,
            near: 0.1,
            far: (3000.0 * maze_scale).max(height + size.y),
        };
        tracing::debug!(half_extent = camera.half_extent, "minimap camera fitted");
        Some(camera)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        let h = self.half_extent;
        Mat4::orthographic_rh(-h, h, -h, h, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view_matrix()
    }
}

/// The marker showing the character on the minimap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Indicator {
    pub position: Vec3,
    pub yaw: f32,
    pub radius: f32,
    pub layers: RenderLayers,
}

impl Indicator {
    /// Follow the character's horizontal position and heading, floating above
    /// the maze centre height.
    pub fn track(character: &Transform, maze_bounds: &Aabb, cfg: &MinimapConfig, radius: f32) -> Self {
        let base_y = if maze_bounds.is_empty() {
            character.position.y
        } else {
            maze_bounds.center().y
        };
        Self {
            position: Vec3::new(
                character.position.x,
                base_y + cfg.indicator_y_offset,
                character.position.z,
            ),
            yaw: character.yaw(),
            radius,
            layers: RenderLayers::MINIMAP_ONLY,
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.radius),
            Quat::from_rotation_y(self.yaw),
            self.position,
        )
    }
}

/// Viewport and scissor settings of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportState {
    pub viewport: ViewportRect,
    pub scissor: ViewportRect,
    pub scissor_test: bool,
}

/// A target whose viewport state can be read, replaced and depth-cleared.
pub trait ViewportTarget {
    fn viewport_state(&self) -> ViewportState;
    fn set_viewport_state(&mut self, state: ViewportState);
    fn clear_depth(&mut self);
}

/// Draw into `rect` over whatever is already on the target.
///
/// Depth is cleared first so the inset never z-fights the main view. The
/// previous viewport state is back in place when this returns.
pub fn render_inset<T, R>(target: &mut T, rect: ViewportRect, draw: impl FnOnce(&mut T) -> R) -> R
where
    T: ViewportTarget + ?Sized,
{
    let saved = target.viewport_state();
    target.set_viewport_state(ViewportState {
        viewport: rect,
        scissor: rect,
        scissor_test: true,
    });
    target.clear_depth();
    let output = draw(target);
    target.set_viewport_state(saved);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[derive(Default)]
    struct RecordingTarget {
        state: ViewportState,
        log: Vec<String>,
    }

    impl ViewportTarget for RecordingTarget {
        fn viewport_state(&self) -> ViewportState {
            self.state
        }

        fn set_viewport_state(&mut self, state: ViewportState) {
            self.log.push(format!("set {}x{}", state.viewport.width, state.viewport.height));
            self.state = state;
        }

        fn clear_depth(&mut self) {
            self.log.push("clear depth".into());
        }
    }

    fn maze_bounds() -> Aabb {
        Aabb::new(Vec3::new(-100.0, 0.0, -50.0), Vec3::new(100.0, 20.0, 50.0))
    }

    #[test]
    fn inset_sits_bottom_right() {
        let rect = inset_rect(1280, 720, &MinimapConfig::default()).unwrap();
        assert_eq!(
            rect,
            ViewportRect {
                x: 960,
                y: 400,
                width: 300,
                height: 300
            }
        );
    }

    #[test]
    fn inset_shrinks_on_tiny_surfaces() {
        let rect = inset_rect(200, 120, &MinimapConfig::default()).unwrap();
        assert_eq!(rect.width, 120);
        assert!(rect.x + rect.width <= 200);
        assert!(rect.y + rect.height <= 120);
    }

    #[test]
    fn disabled_or_empty_has_no_inset() {
        let off = MinimapConfig {
            enabled: false,
            ..MinimapConfig::default()
        };
        assert!(inset_rect(1280, 720, &off).is_none());
        assert!(inset_rect(0, 720, &MinimapConfig::default()).is_none());
    }

    #[test]
    fn camera_frames_widest_axis() {
        let cam = MinimapCamera::fit(&maze_bounds(), &MinimapConfig::default(), 10.0).unwrap();
        assert!((cam.half_extent - 110.0).abs() < 1e-4);
        assert!((cam.eye.y - (10.0 + 220.0 * 1.5)).abs() < 1e-3);
        assert_eq!(cam.target, Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(cam.up, Vec3::NEG_Z);
    }

    #[test]
    fn camera_projects_maze_corners_inside_clip_space() {
        let cam = MinimapCamera::fit(&maze_bounds(), &MinimapConfig::default(), 10.0).unwrap();
        let vp = cam.view_projection();
        for corner in [Vec3::new(-100.0, 0.0, -50.0), Vec3::new(100.0, 20.0, 50.0)] {
            let ndc = vp.project_point3(corner);
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
            assert!((0.0..=1.0).contains(&ndc.z));
        }
        // North (-Z) is screen up, east (+X) is screen right.
        let north = vp.project_point3(Vec3::new(0.0, 10.0, -40.0));
        let east = vp.project_point3(Vec3::new(40.0, 10.0, 0.0));
        assert!(north.y > 0.0);
        assert!(east.x > 0.0);
    }

    #[test]
    fn empty_bounds_cannot_be_framed() {
        assert!(MinimapCamera::fit(&Aabb::EMPTY, &MinimapConfig::default(), 10.0).is_none());
    }

    #[test]
    fn indicator_tracks_position_and_heading() {
        let character = Transform {
            position: Vec3::new(12.0, 3.0, -7.0),
            rotation: Quat::from_rotation_y(FRAC_PI_2),
            ..Transform::default()
        };
        let ind = Indicator::track(&character, &maze_bounds(), &MinimapConfig::default(), 120.0);
        assert_eq!(ind.position, Vec3::new(12.0, 15.0, -7.0));
        assert!((ind.yaw - FRAC_PI_2).abs() < 1e-5);
        assert_eq!(ind.layers, RenderLayers::MINIMAP_ONLY);
    }

    #[test]
    fn inset_restores_viewport_state() {
        let mut target = RecordingTarget::default();
        let before = ViewportState {
            viewport: ViewportRect::full(1280, 720),
            scissor: ViewportRect::full(1280, 720),
            scissor_test: false,
        };
        target.state = before;
        let rect = inset_rect(1280, 720, &MinimapConfig::default()).unwrap();

        let seen = render_inset(&mut target, rect, |t| {
            t.log.push("draw".into());
            t.viewport_state()
        });

        assert_eq!(seen.viewport, rect);
        assert_eq!(seen.scissor, rect);
        assert!(seen.scissor_test);
        assert_eq!(target.state, before);
        assert_eq!(
            target.log,
            vec!["set 300x300", "clear depth", "draw", "set 1280x720"]
        );
    }
}
