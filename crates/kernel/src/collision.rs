//! Axis-separated AABB collision between the character and the wall set.
//!
//! X and Z are tested independently, so pushing diagonally into a wall keeps
//! the free axis and the character slides along it. Y is never tested.
//!
//! Cost is O(walls) per query with no spatial index. Fine for a hand-built maze,
//! a scaling limit for anything larger.

use glam::Vec3;
use mazewalk_common::{Aabb, CharacterConfig, Collider};

/// The character's collision volume, already scaled to world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterBody {
    pub height: f32,
    pub radius: f32,
    /// Shrinks the box so grazing a wall does not count as touching it.
    pub padding: f32,
}

impl CharacterBody {
    pub fn from_config(config: &CharacterConfig) -> Self {
        Self {
            height: config.height(),
            radius: config.radius(),
            padding: config.padding(),
        }
    }

    /// Box around a character standing at `position` (its feet).
    pub fn aabb_at(&self, position: Vec3) -> Aabb {
        let center = position + Vec3::new(0.0, self.height / 2.0, 0.0);
        let width = self.radius * 2.0 - self.padding * 2.0;
        let size = Vec3::new(width, self.height - self.padding, width);
        Aabb::from_center_size(center, size)
    }
}

/// Filter a desired displacement against the walls.
///
/// An axis whose translated box would overlap any wall is zeroed; the other
/// axes pass through untouched. With no walls the input comes back unchanged.
pub fn allowed_displacement<C: Collider>(
    position: Vec3,
    desired: Vec3,
    body: &CharacterBody,
    walls: &[C],
) -> Vec3 {
    if walls.is_empty() {
        return desired;
    }

    let body_box = body.aabb_at(position);
    // Computed once and shared by both axis tests.
    let wall_boxes: Vec<Aabb> = walls.iter().map(Collider::world_aabb).collect();
    let blocked = |offset: Vec3| {
        let moved = body_box.translated(offset);
        wall_boxes.iter().any(|wall| moved.intersects(wall))
    };

    let mut allowed = desired;
    if blocked(Vec3::new(desired.x, 0.0, 0.0)) {
        allowed.x = 0.0;
    }
    if blocked(Vec3::new(0.0, 0.0, desired.z)) {
        allowed.z = 0.0;
    }
    allowed
}
