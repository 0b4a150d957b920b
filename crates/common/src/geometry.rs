//! Minimal geometry capability the core depends on: boxes, rays, triangle meshes.
//!
//! Vector arithmetic comes from glam. Everything here is recomputed from the
//! current transform on every call; nothing is cached between frames.

use glam::{Affine3A, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box defined by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// A box containing nothing. Intersects no other box.
    pub const EMPTY: Self = Self {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest box containing every point. Empty input yields [`Aabb::EMPTY`].
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |acc, p| Self {
            min: acc.min.min(p),
            max: acc.max.max(p),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// Overlap test. Boxes that merely touch count as intersecting.
    pub fn intersects(&self, other: &Aabb) -> bool {
        !(other.max.x < self.min.x
            || other.min.x > self.max.x
            || other.max.y < self.min.y
            || other.min.y > self.max.y
            || other.max.z < self.min.z
            || other.min.z > self.max.z)
    }
}

/// A half-line with a unit-length direction, so hit parameters are distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Build a ray; the direction is normalized. Returns `None` for a zero direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Something the character can bump into and the camera can see through or not.
pub trait Collider {
    /// World-space bounds, derived from the current transform.
    fn world_aabb(&self) -> Aabb;

    /// Distance to the nearest surface hit within `[near, far]`.
    fn raycast(&self, ray: &Ray, near: f32, far: f32) -> Option<f32>;
}

impl Collider for Aabb {
    fn world_aabb(&self) -> Aabb {
        *self
    }

    fn raycast(&self, ray: &Ray, near: f32, far: f32) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            if dir.abs() < f32::EPSILON {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }
            let mut t0 = (self.min[axis] - origin) / dir;
            let mut t1 = (self.max[axis] - origin) / dir;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }
        // Starting inside the box, the first surface crossed is the exit face.
        [t_enter, t_exit]
            .into_iter()
            .find(|t| *t >= near && *t <= far)
    }
}

/// Triangle soup in local space plus the transform placing it in the world.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangleMesh {
    pub triangles: Vec<[Vec3; 3]>,
    pub transform: Affine3A,
}

impl TriangleMesh {
    pub fn new(triangles: Vec<[Vec3; 3]>, transform: Affine3A) -> Self {
        Self {
            triangles,
            transform,
        }
    }

    /// Axis-aligned box mesh of 12 triangles centred on `center`.
    pub fn cuboid(center: Vec3, half_extents: Vec3) -> Self {
        let h = half_extents;
        let c = [
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];
        #[rustfmt::skip]
        const FACES: [[usize; 3]; 12] = [
            [0, 2, 1], [0, 3, 2], // -Z
            [4, 5, 6], [4, 6, 7], // +Z
            [0, 4, 7], [0, 7, 3], // -X
            [1, 2, 6], [1, 6, 5], // +X
            [3, 7, 6], [3, 6, 2], // +Y
            [0, 1, 5], [0, 5, 4], // -Y
        ];
        let triangles = FACES.iter().map(|f| [c[f[0]], c[f[1]], c[f[2]]]).collect();
        Self::new(triangles, Affine3A::from_translation(center))
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Triangles transformed into world space.
    pub fn world_triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.triangles.iter().map(|tri| {
            [
                self.transform.transform_point3(tri[0]),
                self.transform.transform_point3(tri[1]),
                self.transform.transform_point3(tri[2]),
            ]
        })
    }

    /// Place this mesh under a parent transform.
    pub fn with_parent(mut self, parent: Affine3A) -> Self {
        self.transform = parent * self.transform;
        self
    }
}

impl Collider for TriangleMesh {
    fn world_aabb(&self) -> Aabb {
        Aabb::from_points(self.world_triangles().flatten())
    }

    fn raycast(&self, ray: &Ray, near: f32, far: f32) -> Option<f32> {
        self.world_triangles()
            .filter_map(|tri| ray_triangle(ray, &tri))
            .filter(|t| *t >= near && *t <= far)
            .min_by(f32::total_cmp)
    }
}

/// Möller–Trumbore, both faces.
fn ray_triangle(ray: &Ray, tri: &[Vec3; 3]) -> Option<f32> {
    let edge1 = tri[1] - tri[0];
    let edge2 = tri[2] - tri[0];
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - tri[0];
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    Some(edge2.dot(q) * inv_det)
}

/// One renderable surface of a loaded scene.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub name: String,
    pub mesh: TriangleMesh,
}

impl MeshNode {
    pub fn new(name: impl Into<String>, mesh: TriangleMesh) -> Self {
        Self {
            name: name.into(),
            mesh,
        }
    }

    /// Case-insensitive substring match on the node name.
    pub fn name_contains(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }
}

impl Collider for MeshNode {
    fn world_aabb(&self) -> Aabb {
        self.mesh.world_aabb()
    }

    fn raycast(&self, ray: &Ray, near: f32, far: f32) -> Option<f32> {
        self.mesh.raycast(ray, near, far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(center: Vec3) -> Aabb {
        Aabb::from_center_size(center, Vec3::ONE)
    }

    #[test]
    fn touching_boxes_intersect() {
        let a = unit_box_at(Vec3::ZERO);
        let b = unit_box_at(Vec3::new(1.0, 0.0, 0.0));
        assert!(a.intersects(&b));
        let c = unit_box_at(Vec3::new(1.01, 0.0, 0.0));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn empty_box_intersects_nothing() {
        assert!(Aabb::EMPTY.is_empty());
        assert!(!Aabb::EMPTY.intersects(&unit_box_at(Vec3::ZERO)));
        assert_eq!(Aabb::EMPTY.size(), Vec3::ZERO);
    }

    #[test]
    fn from_points_and_union() {
        let a = Aabb::from_points([Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 0.0, 5.0)]);
        assert_eq!(a.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(a.max, Vec3::new(1.0, 2.0, 5.0));
        let u = a.union(&unit_box_at(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(u.max.x, 10.5);
        // y spans the unit box's -0.5 up to 2.0.
        assert_eq!(u.center().y, 0.75);
    }

    #[test]
    fn ray_hits_box_front_face() {
        let wall = unit_box_at(Vec3::new(0.0, 0.0, 5.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::Z).unwrap();
        let t = wall.raycast(&ray, 0.1, 100.0).unwrap();
        assert!((t - 4.5).abs() < 1e-5);
        assert!(wall.raycast(&ray, 0.1, 4.0).is_none());
    }

    #[test]
    fn ray_from_inside_box_reports_exit() {
        let wall = unit_box_at(Vec3::ZERO);
        let ray = Ray::new(Vec3::ZERO, Vec3::X).unwrap();
        let t = wall.raycast(&ray, 0.1, 100.0).unwrap();
        assert!((t - 0.5).abs() < 1e-5);
    }

    #[test]
    fn zero_direction_ray_is_rejected() {
        assert!(Ray::new(Vec3::ZERO, Vec3::ZERO).is_none());
    }

    #[test]
    fn cuboid_mesh_matches_box() {
        let mesh = TriangleMesh::cuboid(Vec3::new(2.0, 1.0, 0.0), Vec3::new(1.0, 1.0, 0.5));
        assert_eq!(mesh.triangle_count(), 12);
        let bounds = mesh.world_aabb();
        assert_eq!(bounds.min, Vec3::new(1.0, 0.0, -0.5));
        assert_eq!(bounds.max, Vec3::new(3.0, 2.0, 0.5));
    }

    #[test]
    fn mesh_raycast_returns_nearest_face() {
        let mesh = TriangleMesh::cuboid(Vec3::new(0.0, 0.0, 10.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.3, 0.2, 0.0), Vec3::Z).unwrap();
        let t = mesh.raycast(&ray, 0.1, 100.0).unwrap();
        assert!((t - 9.0).abs() < 1e-4);
        let aside = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::Z).unwrap();
        assert!(mesh.raycast(&aside, 0.1, 100.0).is_none());
    }

    #[test]
    fn parent_transform_moves_world_bounds() {
        let mesh = TriangleMesh::cuboid(Vec3::ZERO, Vec3::splat(1.0))
            .with_parent(Affine3A::from_scale(Vec3::splat(10.0)));
        let bounds = mesh.world_aabb();
        assert_eq!(bounds.max, Vec3::splat(10.0));
    }

    #[test]
    fn mesh_node_name_match_is_case_insensitive() {
        let node = MeshNode::new("Outer_WALL.003", TriangleMesh::default());
        assert!(node.name_contains("wall"));
        assert!(!node.name_contains("floor"));
    }
}
