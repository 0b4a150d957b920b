use crate::character::Character;
use crate::collision::{CharacterBody, allowed_displacement};
use glam::{Quat, Vec3};
use mazewalk_animation::AnimationEvent;
use mazewalk_common::{CharacterConfig, Collider};
use mazewalk_input::{Action, InputState, KeyBindings};
use serde::Serialize;

/// What the controller decided during one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MoveReport {
    /// Any movement key was held.
    pub trying_to_move: bool,
    pub desired: Vec3,
    /// Displacement actually applied after collision.
    pub allowed: Vec3,
    pub moving: bool,
    pub action_started: bool,
    /// Clips that finished during this frame's animation step.
    pub finished: Vec<String>,
}

/// Turns held keys and the camera's facing into character motion.
#[derive(Debug, Clone)]
pub struct CharacterController {
    pub bindings: KeyBindings,
    pub speed: f32,
    pub turn_rate: f32,
    pub turn_response: f32,
    pub moving_epsilon_sq: f32,
    pub body: CharacterBody,
}

impl CharacterController {
    pub fn from_config(config: &CharacterConfig) -> Self {
        Self {
            bindings: KeyBindings::default(),
            speed: config.speed,
            turn_rate: config.turn_rate,
            turn_response: config.turn_response,
            moving_epsilon_sq: config.moving_epsilon_sq,
            body: CharacterBody::from_config(config),
        }
    }

    /// Screen-relative movement direction from the held keys.
    ///
    /// Forward follows the camera projected onto the ground plane; left is
    /// up × forward. The sum is normalized, so diagonals are not faster.
    pub fn direction(&self, input: &InputState, camera_forward: Vec3) -> Vec3 {
        let keys = input.movement(&self.bindings);
        let forward = Vec3::new(camera_forward.x, 0.0, camera_forward.z).normalize_or_zero();
        let left = Vec3::Y.cross(forward).normalize_or_zero();

        let mut direction = Vec3::ZERO;
        if keys.forward {
            direction += forward;
        }
        if keys.back {
            direction -= forward;
        }
        if keys.left {
            direction += left;
        }
        if keys.right {
            direction -= left;
        }
        direction.normalize_or_zero()
    }

    /// Run one frame of character control, then advance its animation.
    pub fn update<C: Collider>(
        &self,
        character: &mut Character,
        input: &InputState,
        camera_forward: Vec3,
        walls: &[C],
        dt: f32,
    ) -> MoveReport {
        let mut report = MoveReport::default();

        if !character.is_busy() && input.is_active(&self.bindings, Action::TriggerAction) {
            report.action_started = character.try_begin_action();
        }

        report.trying_to_move = input.movement(&self.bindings).any();
        let busy = character.is_busy();

        character.move_direction = if busy || !report.trying_to_move {
            Vec3::ZERO
        } else {
            self.direction(input, camera_forward)
        };

        if character.move_direction.length_squared() > 0.01 {
            let target = Quat::from_rotation_arc(Vec3::Z, character.move_direction);
            let t = (self.turn_rate * dt * self.turn_response).clamp(0.0, 1.0);
            character.transform.rotation = character.transform.rotation.slerp(target, t);
        }

        report.desired = character.move_direction * self.speed * dt;
        report.allowed = if busy {
            Vec3::ZERO
        } else {
            allowed_displacement(character.position(), report.desired, &self.body, walls)
        };
        character.transform.position += report.allowed;

        report.moving =
            report.trying_to_move && report.allowed.length_squared() > self.moving_epsilon_sq;
        character.request_locomotion(report.moving);

        report.finished = character
            .advance_animation(dt)
            .into_iter()
            .map(|event| match event {
                AnimationEvent::Finished { clip } => clip,
            })
            .collect();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::AnimState;
    use mazewalk_animation::Clip;
    use mazewalk_common::{Aabb, AnimationConfig, Transform};

    const DT: f32 = 1.0 / 60.0;

    fn setup() -> (CharacterController, Character) {
        let controller = CharacterController::from_config(&CharacterConfig::default());
        let character = Character::new(
            Transform::default(),
            vec![
                Clip::new("idle", 2.0),
                Clip::new("run", 0.8),
                Clip::new("kick", 0.5),
            ],
            &AnimationConfig::default(),
        );
        (controller, character)
    }

    fn held(keys: &[&str]) -> InputState {
        let mut input = InputState::new();
        for key in keys {
            input.key_down(key);
        }
        input
    }

    const NO_WALLS: [Aabb; 0] = [];

    #[test]
    fn direction_is_camera_relative() {
        let (controller, _) = setup();
        // Camera looks down -Z from above; forward projects onto -Z.
        let cam = Vec3::new(0.0, -0.5, -1.0);
        let d = controller.direction(&held(&["w"]), cam);
        assert!((d - Vec3::NEG_Z).length() < 1e-5);
        let d = controller.direction(&held(&["a"]), cam);
        assert!((d - Vec3::NEG_X).length() < 1e-5);
        let d = controller.direction(&held(&["arrowright"]), cam);
        assert!((d - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn diagonal_is_normalized_and_opposites_cancel() {
        let (controller, _) = setup();
        let d = controller.direction(&held(&["w", "d"]), Vec3::Z);
        assert!((d.length() - 1.0).abs() < 1e-5);
        let d = controller.direction(&held(&["w", "s"]), Vec3::Z);
        assert_eq!(d, Vec3::ZERO);
    }

    #[test]
    fn forward_moves_and_runs() {
        let (controller, mut c) = setup();
        let report = controller.update(&mut c, &held(&["w"]), Vec3::Z, &NO_WALLS, DT);
        assert!(report.moving);
        assert!((c.position().z - 150.0 * DT).abs() < 1e-4);
        assert_eq!(c.state(), Some(AnimState::Run));
    }

    #[test]
    fn character_turns_toward_movement() {
        let (controller, mut c) = setup();
        for _ in 0..120 {
            controller.update(&mut c, &held(&["d"]), Vec3::Z, &NO_WALLS, DT);
        }
        assert!((c.transform.facing() - Vec3::NEG_X).length() < 1e-2);
    }

    #[test]
    fn diagonal_into_wall_slides() {
        let (controller, mut c) = setup();
        let walls = [Aabb::new(
            Vec3::new(-500.0, 0.0, 10.0),
            Vec3::new(500.0, 100.0, 20.0),
        )];
        let report = controller.update(&mut c, &held(&["w", "a"]), Vec3::Z, &walls, DT);
        assert_eq!(report.allowed.z, 0.0);
        assert!(report.allowed.x > 0.0);
        assert!(report.moving);
    }

    #[test]
    fn pressing_into_wall_is_idle() {
        let (controller, mut c) = setup();
        let walls = [Aabb::new(
            Vec3::new(-500.0, 0.0, 10.0),
            Vec3::new(500.0, 100.0, 20.0),
        )];
        c.request_locomotion(true);
        let report = controller.update(&mut c, &held(&["w"]), Vec3::Z, &walls, DT);
        assert!(report.trying_to_move);
        assert!(!report.moving);
        assert_eq!(c.position(), Vec3::ZERO);
        assert_eq!(c.state(), Some(AnimState::Idle));
    }

    #[test]
    fn busy_blocks_movement() {
        let (controller, mut c) = setup();
        let report = controller.update(&mut c, &held(&[" ", "w"]), Vec3::Z, &NO_WALLS, DT);
        assert!(report.action_started);
        assert!(c.is_busy());
        assert_eq!(report.allowed, Vec3::ZERO);
        assert_eq!(c.move_direction, Vec3::ZERO);
        assert_eq!(c.state(), Some(AnimState::Action));
    }
}
