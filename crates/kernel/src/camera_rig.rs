//! Third-person follow camera that keeps its distance and stays out of walls.
//!
//! Each frame runs two corrections on top of the orbit camera. The distance
//! correction restores the preferred follow distance. The wall correction
//! then pulls the camera in front of any wall between it and the character.
//! Wall avoidance is computed from the distance-corrected position, so it
//! always wins. Both are approached by smoothing, never snapped to.

use crate::orbit::OrbitCamera;
use glam::Vec3;
use mazewalk_common::{CameraConfig, Collider, Ray};
use serde::Serialize;

const COINCIDENT_DISTANCE: f32 = 0.001;

/// Intermediate results of one rig update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RigFrame {
    pub ideal_target: Vec3,
    pub distance_corrected: Vec3,
    /// Set when a wall sits between the target and the distance-corrected camera.
    pub wall_corrected: Option<Vec3>,
    pub wall_hit: Option<f32>,
}

impl RigFrame {
    /// Where the camera is being pulled this frame.
    pub fn goal(&self) -> Vec3 {
        self.wall_corrected.unwrap_or(self.distance_corrected)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    pub target_y_offset: f32,
    /// Default camera offset; its direction is the fallback when the camera
    /// sits on the target.
    pub offset: Vec3,
    pub preferred_distance: f32,
    pub follow_speed: f32,
    pub clearance: f32,
    pub correction_lerp: f32,
    pub distance_tolerance: f32,
    pub ray_near: f32,
}

impl CameraRig {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            target_y_offset: config.target_y_offset,
            offset: config.offset,
            preferred_distance: config.preferred_distance(),
            follow_speed: config.follow_speed,
            clearance: config.collision_clearance,
            correction_lerp: config.correction_lerp_speed,
            distance_tolerance: config.distance_tolerance,
            ray_near: config.ray_near,
        }
    }

    pub fn ideal_target(&self, character_position: Vec3) -> Vec3 {
        character_position + Vec3::new(0.0, self.target_y_offset, 0.0)
    }

    /// Snap the orbit camera onto the character at the default offset.
    pub fn place_initial(&self, orbit: &mut OrbitCamera, character_position: Vec3) {
        let target = self.ideal_target(character_position);
        orbit.target = target;
        orbit.position = target + self.offset;
    }

    /// Camera position at exactly the preferred distance, if the current one is off.
    pub fn distance_corrected(&self, camera: Vec3, target: Vec3) -> Vec3 {
        let distance = camera.distance(target);
        if (self.preferred_distance - distance).abs() <= self.distance_tolerance {
            return camera;
        }
        let direction = (camera - target)
            .try_normalize()
            .unwrap_or_else(|| self.fallback_direction());
        target + direction * self.preferred_distance
    }

    /// Pull `camera` in front of the nearest wall on the line from `target`.
    ///
    /// Returns the corrected position and the raw hit distance.
    pub fn wall_corrected<C: Collider>(
        &self,
        target: Vec3,
        camera: Vec3,
        walls: &[C],
    ) -> Option<(Vec3, f32)> {
        let mut direction = camera - target;
        let mut reach = direction.length();
        if reach < COINCIDENT_DISTANCE {
            reach = self.clearance;
            direction = self.fallback_direction();
        }
        let ray = Ray::new(target, direction)?;
        let hit = walls
            .iter()
            .filter_map(|wall| wall.raycast(&ray, self.ray_near, reach))
            .min_by(f32::total_cmp)?;
        let distance = (hit - self.clearance * 0.5).max(self.clearance);
        Some((ray.at(distance), hit))
    }

    /// One frame: follow, orbit, correct distance, avoid walls, smooth.
    pub fn update<C: Collider>(
        &self,
        orbit: &mut OrbitCamera,
        character_position: Vec3,
        walls: &[C],
    ) -> RigFrame {
        let ideal_target = self.ideal_target(character_position);
        orbit.target = orbit.target.lerp(ideal_target, self.follow_speed);
        orbit.update();

        let distance_corrected = self.distance_corrected(orbit.position, orbit.target);
        let wall = self.wall_corrected(ideal_target, distance_corrected, walls);
        let frame = RigFrame {
            ideal_target,
            distance_corrected,
            wall_corrected: wall.map(|(position, _)| position),
            wall_hit: wall.map(|(_, hit)| hit),
        };

        orbit.position = orbit.position.lerp(frame.goal(), self.correction_lerp);
        orbit.target = ideal_target;
        frame
    }

    fn fallback_direction(&self) -> Vec3 {
        self.offset.try_normalize().unwrap_or(Vec3::Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazewalk_common::{Aabb, MeshNode, TriangleMesh};

    const NO_WALLS: [Aabb; 0] = [];

    fn rig() -> CameraRig {
        CameraRig::from_config(&CameraConfig::default())
    }

    #[test]
    fn distance_correction_lands_on_preferred_distance() {
        let rig = rig();
        let target = Vec3::new(3.0, 50.0, -7.0);
        for camera in [
            target + Vec3::new(0.0, 10.0, 20.0),
            target + Vec3::new(400.0, 300.0, -100.0),
            target + Vec3::new(-1.0, 0.0, 0.0),
        ] {
            let corrected = rig.distance_corrected(camera, target);
            assert!((corrected.distance(target) - rig.preferred_distance).abs() < 1e-3);
            let original_dir = (camera - target).normalize();
            let corrected_dir = (corrected - target).normalize();
            assert!(original_dir.dot(corrected_dir) > 0.9999);
        }
    }

    #[test]
    fn distance_within_tolerance_is_untouched() {
        let rig = rig();
        let camera = Vec3::new(0.0, 100.05, 200.0);
        assert_eq!(rig.distance_corrected(camera, Vec3::ZERO), camera);
    }

    #[test]
    fn coincident_camera_uses_offset_direction() {
        let rig = rig();
        let corrected = rig.distance_corrected(Vec3::ONE, Vec3::ONE);
        let expected = Vec3::ONE + rig.offset;
        assert!((corrected - expected).length() < 1e-3);
    }

    #[test]
    fn wall_pulls_camera_in_front() {
        let rig = rig();
        let target = Vec3::ZERO;
        let camera = Vec3::new(0.0, 0.0, 200.0);
        // Near face at z = 100.
        let walls = [Aabb::new(
            Vec3::new(-50.0, -50.0, 100.0),
            Vec3::new(50.0, 50.0, 110.0),
        )];
        let (corrected, hit) = rig.wall_corrected(target, camera, &walls).unwrap();
        assert!((hit - 100.0).abs() < 1e-3);
        assert!((corrected.length() - 97.5).abs() < 1e-3);
    }

    #[test]
    fn wall_hugging_target_keeps_clearance() {
        let rig = rig();
        let walls = [Aabb::new(
            Vec3::new(-50.0, -50.0, 2.0),
            Vec3::new(50.0, 50.0, 10.0),
        )];
        let (corrected, hit) = rig
            .wall_corrected(Vec3::ZERO, Vec3::new(0.0, 0.0, 200.0), &walls)
            .unwrap();
        assert!((hit - 2.0).abs() < 1e-4);
        assert!((corrected.length() - rig.clearance).abs() < 1e-4);
    }

    #[test]
    fn coincident_camera_casts_along_offset_within_clearance() {
        let rig = rig();
        let target = Vec3::new(0.0, 50.0, 0.0);
        let dir = rig.offset.normalize();
        // Face crossed 3 units along the offset direction.
        let near_face = 3.0 * dir.z;
        let walls = [Aabb::new(
            Vec3::new(-50.0, -50.0, near_face),
            Vec3::new(50.0, 150.0, near_face + 10.0),
        )];
        let (corrected, hit) = rig.wall_corrected(target, target, &walls).unwrap();
        assert!((hit - 3.0).abs() < 1e-3);
        assert!((corrected - (target + dir * rig.clearance)).length() < 1e-3);

        // Beyond the clearance reach nothing is hit.
        let far = [Aabb::new(
            Vec3::new(-50.0, -50.0, 10.0),
            Vec3::new(50.0, 150.0, 20.0),
        )];
        assert!(rig.wall_corrected(target, target, &far).is_none());
    }

    #[test]
    fn wall_behind_camera_is_ignored() {
        let rig = rig();
        let walls = [Aabb::new(
            Vec3::new(-50.0, -50.0, 300.0),
            Vec3::new(50.0, 50.0, 310.0),
        )];
        assert!(
            rig.wall_corrected(Vec3::ZERO, Vec3::new(0.0, 0.0, 200.0), &walls)
                .is_none()
        );
    }

    #[test]
    fn nearest_of_several_mesh_walls_wins() {
        let rig = rig();
        let walls = [
            MeshNode::new(
                "wall_far",
                TriangleMesh::cuboid(Vec3::new(5.0, -8.0, 150.0), Vec3::splat(20.0)),
            ),
            MeshNode::new(
                "wall_near",
                TriangleMesh::cuboid(Vec3::new(3.0, 7.0, 60.0), Vec3::splat(20.0)),
            ),
        ];
        let (_, hit) = rig
            .wall_corrected(Vec3::ZERO, Vec3::new(0.0, 0.0, 200.0), &walls)
            .unwrap();
        assert!((hit - 40.0).abs() < 1e-3);
    }

    #[test]
    fn place_initial_sets_offset() {
        let rig = rig();
        let mut orbit = OrbitCamera::new(Vec3::ZERO, Vec3::ZERO);
        rig.place_initial(&mut orbit, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(orbit.target, Vec3::new(10.0, 50.0, 0.0));
        assert_eq!(orbit.position, Vec3::new(10.0, 150.0, 200.0));
    }

    #[test]
    fn camera_converges_on_preferred_distance() {
        let rig = rig();
        let mut orbit = OrbitCamera::new(Vec3::ZERO, Vec3::ZERO);
        rig.place_initial(&mut orbit, Vec3::ZERO);
        orbit.position = orbit.target + Vec3::new(0.0, 30.0, 60.0);
        for _ in 0..200 {
            rig.update(&mut orbit, Vec3::ZERO, &NO_WALLS);
        }
        assert!((orbit.distance() - rig.preferred_distance).abs() < 0.5);
        assert_eq!(orbit.target, Vec3::new(0.0, 50.0, 0.0));
    }

    #[test]
    fn camera_settles_in_front_of_wall() {
        let rig = rig();
        let mut orbit = OrbitCamera::new(Vec3::ZERO, Vec3::ZERO);
        rig.place_initial(&mut orbit, Vec3::ZERO);
        // Slab across the default offset line, roughly halfway out.
        let walls = [Aabb::new(
            Vec3::new(-100.0, -100.0, 100.0),
            Vec3::new(100.0, 300.0, 110.0),
        )];
        let mut frame = rig.update(&mut orbit, Vec3::ZERO, &walls);
        assert!(frame.wall_corrected.is_some());
        for _ in 0..200 {
            frame = rig.update(&mut orbit, Vec3::ZERO, &walls);
        }
        assert!(orbit.position.z < 100.0);
        assert!(frame.wall_hit.is_some());
    }
}
