use crate::camera_rig::{CameraRig, RigFrame};
use crate::character::{AnimState, Character};
use crate::controller::{CharacterController, MoveReport};
use crate::orbit::OrbitCamera;
use crate::world::World;
use glam::Vec3;
use mazewalk_animation::Clip;
use mazewalk_common::{GameConfig, Transform};
use mazewalk_input::InputState;
use serde::Serialize;

/// Everything observable about one frame, for HUDs and traces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub elapsed: f32,
    pub position: Vec3,
    pub yaw: f32,
    pub animation: Option<String>,
    pub state: Option<AnimState>,
    pub busy: bool,
    pub movement: MoveReport,
    pub camera: Vec3,
    pub camera_target: Vec3,
    pub rig: RigFrame,
}

/// A running walkthrough: the loaded world plus all per-frame state.
#[derive(Debug, Clone)]
pub struct Session {
    config: GameConfig,
    world: World,
    character: Character,
    controller: CharacterController,
    orbit: OrbitCamera,
    rig: CameraRig,
    frame: u64,
    elapsed: f32,
}

impl Session {
    pub fn new(config: GameConfig, world: World, clips: Vec<Clip>) -> Self {
        let start = config.character.initial_position;
        let character = Character::new(
            Transform::from_position(start),
            clips,
            &config.animation,
        );
        let controller = CharacterController::from_config(&config.character);
        let rig = CameraRig::from_config(&config.camera);
        let mut orbit = OrbitCamera::from_config(&config.camera, config.maze.scale);
        rig.place_initial(&mut orbit, start);

        tracing::info!(
            walls = world.walls().len(),
            clips = character.animator().mixer().len(),
            "session started at {start}"
        );
        Self {
            config,
            world,
            character,
            controller,
            orbit,
            rig,
            frame: 0,
            elapsed: 0.0,
        }
    }

    /// Advance one frame: character, then animation, then camera.
    pub fn update(&mut self, dt: f32, input: &InputState) -> FrameReport {
        let dt = dt.max(0.0);
        let camera_forward = self.orbit.forward();
        let movement = self.controller.update(
            &mut self.character,
            input,
            camera_forward,
            self.world.walls(),
            dt,
        );
        let rig = self
            .rig
            .update(&mut self.orbit, self.character.position(), self.world.walls());

        self.frame += 1;
        self.elapsed += dt;
        FrameReport {
            frame: self.frame,
            elapsed: self.elapsed,
            position: self.character.position(),
            yaw: self.character.transform.yaw(),
            animation: self.character.current_animation().map(str::to_string),
            state: self.character.state(),
            busy: self.character.is_busy(),
            movement,
            camera: self.orbit.position,
            camera_target: self.orbit.target,
            rig,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn orbit(&self) -> &OrbitCamera {
        &self.orbit
    }

    /// For pointer-driven rotation and zoom.
    pub fn orbit_mut(&mut self) -> &mut OrbitCamera {
        &mut self.orbit
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}
