use glam::{Mat4, Vec3};
use mazewalk_kernel::Session;
use mazewalk_render::{Indicator, MinimapCamera, RenderView, ViewportRect, inset_rect};

/// Matrices and placement for the minimap inset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimapPass {
    pub view_proj: Mat4,
    pub rect: ViewportRect,
    pub indicator: Indicator,
}

/// Everything the GPU passes need for one frame, derived from the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneFrame {
    pub main_view_proj: Mat4,
    /// Unit cube to character proxy.
    pub character_model: Mat4,
    pub minimap: Option<MinimapPass>,
}

impl SceneFrame {
    pub fn build(
        session: &Session,
        width: u32,
        height: u32,
        minimap_camera: Option<&MinimapCamera>,
    ) -> Self {
        let config = session.config();
        let aspect = ViewportRect::full(width, height).aspect();
        let main_view_proj = RenderView::from_session(session).view_projection(
            aspect,
            config.camera.near,
            config.camera.far(config.maze.scale),
        );

        let transform = &session.character().transform;
        let height_world = config.character.height();
        let width_world = config.character.radius() * 2.0;
        let character_model = Mat4::from_scale_rotation_translation(
            Vec3::new(width_world, height_world, width_world),
            transform.rotation,
            transform.position + Vec3::new(0.0, height_world / 2.0, 0.0),
        );

        let minimap = match (minimap_camera, inset_rect(width, height, &config.minimap)) {
            (Some(camera), Some(rect)) => Some(MinimapPass {
                view_proj: camera.view_projection(),
                rect,
                indicator: Indicator::track(
                    transform,
                    &session.world().bounds(),
                    &config.minimap,
                    config.indicator_size(),
                ),
            }),
            _ => None,
        };

        Self {
            main_view_proj,
            character_model,
            minimap,
        }
    }
}
