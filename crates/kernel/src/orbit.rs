use glam::{Mat4, Vec3};
use mazewalk_common::CameraConfig;
use std::f32::consts::{PI, TAU};

const POLAR_EPS: f32 = 1e-6;

/// Orbit-style camera: user rotation and zoom around a target point.
///
/// Input accumulates as spherical deltas; [`OrbitCamera::update`] applies a
/// damped share of them each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub position: Vec3,
    /// Fraction of pending rotation applied per update; 1 applies it all at once.
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl OrbitCamera {
    pub fn new(target: Vec3, position: Vec3) -> Self {
        Self {
            target,
            position,
            damping: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar: 0.0,
            max_polar: PI,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    pub fn from_config(config: &CameraConfig, maze_scale: f32) -> Self {
        Self {
            damping: config.orbit_damping,
            max_distance: config.max_orbit_distance(maze_scale),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            ..Self::new(Vec3::ZERO, config.offset)
        }
    }

    /// Queue a rotation from a pointer drag of `dx`, `dy` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        self.delta_theta -= TAU * dx / viewport_height * self.rotate_speed;
        self.delta_phi -= TAU * dy / viewport_height * self.rotate_speed;
    }

    /// Queue a zoom; positive steps move closer.
    pub fn zoom(&mut self, steps: f32) {
        self.scale *= 0.95_f32.powf(steps * self.zoom_speed);
    }

    pub fn has_pending_input(&self) -> bool {
        self.delta_theta != 0.0 || self.delta_phi != 0.0 || self.scale != 1.0
    }

    /// Apply pending rotation and zoom around the current target.
    pub fn update(&mut self) {
        let offset = self.position - self.target;
        let radius = offset.length();
        if radius == 0.0 {
            self.scale = 1.0;
            return;
        }

        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        let damping = self.damping.clamp(0.0, 1.0);
        theta += self.delta_theta * damping;
        phi += self.delta_phi * damping;
        phi = phi.clamp(self.min_polar.max(POLAR_EPS), self.max_polar.min(PI - POLAR_EPS));

        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        let sin_phi = phi.sin();
        let spherical = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        self.position = self.target + spherical;

        self.delta_theta *= 1.0 - damping;
        self.delta_phi *= 1.0 - damping;
        if self.delta_theta.abs() < 1e-6 {
            self.delta_theta = 0.0;
        }
        if self.delta_phi.abs() < 1e-6 {
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;
    }

    /// Unit view direction; -Z when camera and target coincide.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }
}
