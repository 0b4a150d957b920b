use glam::{Affine3A, Quat, Vec3};
use mazewalk_common::{Aabb, Collider, MazeConfig, MeshNode};

/// The loaded maze: every surface, and the subset that blocks movement and sight.
///
/// Built once after loading and read-only from then on.
#[derive(Debug, Clone)]
pub struct World {
    walls: Vec<MeshNode>,
    scenery: Vec<MeshNode>,
    bounds: Aabb,
}

impl World {
    /// A world with no geometry at all.
    pub fn empty() -> Self {
        Self {
            walls: Vec::new(),
            scenery: Vec::new(),
            bounds: Aabb::EMPTY,
        }
    }

    /// Place the maze's mesh nodes under the maze transform and pick out the walls.
    pub fn from_nodes(nodes: Vec<MeshNode>, maze: &MazeConfig) -> Self {
        let root = Affine3A::from_scale_rotation_translation(
            Vec3::splat(maze.scale),
            Quat::IDENTITY,
            Vec3::new(0.0, maze.y_offset, 0.0),
        );
        let (walls, scenery): (Vec<MeshNode>, Vec<MeshNode>) = nodes
            .into_iter()
            .map(|node| MeshNode {
                mesh: node.mesh.with_parent(root),
                ..node
            })
            .partition(|node| node.name_contains(&maze.wall_label));

        let world = Self::from_parts(walls, scenery);
        tracing::info!(
            walls = world.walls.len(),
            surfaces = world.surface_count(),
            "maze loaded"
        );
        if world.walls.is_empty() {
            tracing::warn!(
                "no collidable walls found (no mesh name contains '{}')",
                maze.wall_label
            );
        }
        world
    }

    /// Assemble a world from already-placed nodes.
    pub fn from_parts(walls: Vec<MeshNode>, scenery: Vec<MeshNode>) -> Self {
        let bounds = walls
            .iter()
            .chain(scenery.iter())
            .map(Collider::world_aabb)
            .fold(Aabb::EMPTY, |acc, b| acc.union(&b));
        Self {
            walls,
            scenery,
            bounds,
        }
    }

    /// Collidable surfaces.
    pub fn walls(&self) -> &[MeshNode] {
        &self.walls
    }

    /// Non-collidable surfaces (floors, decoration).
    pub fn scenery(&self) -> &[MeshNode] {
        &self.scenery
    }

    /// Every surface, walls first.
    pub fn surfaces(&self) -> impl Iterator<Item = &MeshNode> {
        self.walls.iter().chain(self.scenery.iter())
    }

    pub fn surface_count(&self) -> usize {
        self.walls.len() + self.scenery.len()
    }

    /// Bounds of the whole maze, walls and scenery alike.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }
}
