//! Startup configuration.
//!
//! Every value has a compile-time default. A YAML file may override any subset
//! of fields; missing fields keep their defaults.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f32::consts::PI;
use std::path::{Path, PathBuf};

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Where the maze, the character and its clips are read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub maze: PathBuf,
    pub character: PathBuf,
    /// Clip name to file. Each file contributes its first animation.
    pub clips: BTreeMap<String, PathBuf>,
}

impl Default for AssetPaths {
    fn default() -> Self {
        let clips = [
            ("idle", "models/idle.glb"),
            ("run", "models/run_02.glb"),
            ("kick", "models/kick.glb"),
        ]
        .into_iter()
        .map(|(name, path)| (name.to_string(), PathBuf::from(path)))
        .collect();
        Self {
            maze: PathBuf::from("models/map2.glb"),
            character: PathBuf::from("models/idle.glb"),
            clips,
        }
    }
}

impl AssetPaths {
    /// Resolve every relative path against `root`.
    pub fn rebased(&self, root: &Path) -> Self {
        let join = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                root.join(p)
            }
        };
        Self {
            maze: join(&self.maze),
            character: join(&self.character),
            clips: self
                .clips
                .iter()
                .map(|(name, path)| (name.clone(), join(path)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterConfig {
    pub initial_position: Vec3,
    pub scale: f32,
    /// World units per second.
    pub speed: f32,
    /// Radians per second, before the turn response factor.
    pub turn_rate: f32,
    pub turn_response: f32,
    /// Model-space height before scaling.
    pub base_height: f32,
    pub base_radius: f32,
    pub base_padding: f32,
    /// Squared displacement above which the character counts as moving.
    pub moving_epsilon_sq: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            initial_position: Vec3::new(-1300.0, 0.05, 1400.0),
            scale: 30.0,
            speed: 150.0,
            turn_rate: PI,
            turn_response: 5.0,
            base_height: 1.8,
            base_radius: 0.4,
            base_padding: 0.1,
            moving_epsilon_sq: 0.0001,
        }
    }
}

impl CharacterConfig {
    pub fn height(&self) -> f32 {
        self.base_height * self.scale
    }

    pub fn radius(&self) -> f32 {
        self.base_radius * self.scale
    }

    pub fn padding(&self) -> f32 {
        self.base_padding * self.scale
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    pub scale: f32,
    pub y_offset: f32,
    /// Mesh nodes whose name contains this (case-insensitive) are walls.
    pub wall_label: String,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            scale: 10.0,
            y_offset: 0.0,
            wall_label: "wall".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Height of the followed target above the character's feet.
    pub target_y_offset: f32,
    /// Initial camera offset from the target; its length is the preferred distance.
    pub offset: Vec3,
    pub follow_speed: f32,
    /// Minimum distance kept between camera and an obstructing wall.
    pub collision_clearance: f32,
    pub correction_lerp_speed: f32,
    pub distance_tolerance: f32,
    pub ray_near: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub orbit_damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            target_y_offset: 50.0,
            offset: Vec3::new(0.0, 100.0, 200.0),
            follow_speed: 0.08,
            collision_clearance: 5.0,
            correction_lerp_speed: 0.15,
            distance_tolerance: 0.1,
            ray_near: 0.1,
            fov_degrees: 60.0,
            near: 1.0,
            orbit_damping: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

impl CameraConfig {
    pub fn preferred_distance(&self) -> f32 {
        self.offset.length()
    }

    pub fn far(&self, maze_scale: f32) -> f32 {
        5000.0 * maze_scale
    }

    pub fn max_orbit_distance(&self, maze_scale: f32) -> f32 {
        3000.0 * maze_scale
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimapConfig {
    pub enabled: bool,
    pub size_px: u32,
    pub margin_px: u32,
    /// Camera height as a multiple of the maze's largest horizontal dimension.
    pub camera_height_factor: f32,
    /// Extra framing around the maze footprint.
    pub frame_margin: f32,
    pub indicator_y_offset: f32,
    /// Indicator radius as a multiple of the character radius.
    pub indicator_scale: f32,
}

impl Default for MinimapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size_px: 300,
            margin_px: 20,
            camera_height_factor: 1.5,
            frame_margin: 1.1,
            indicator_y_offset: 5.0,
            indicator_scale: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub idle_clip: String,
    pub run_clip: String,
    /// One-shot clip started by the trigger action.
    pub action_clip: String,
    pub crossfade_seconds: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            idle_clip: "idle".into(),
            run_clip: "run".into(),
            action_clip: "kick".into(),
            crossfade_seconds: 0.2,
        }
    }
}

impl AnimationConfig {
    /// Idle and run loop forever; every other clip plays once and holds.
    pub fn is_looping(&self, clip: &str) -> bool {
        clip == self.idle_clip || clip == self.run_clip
    }
}

/// Complete startup configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub assets: AssetPaths,
    pub character: CharacterConfig,
    pub maze: MazeConfig,
    pub camera: CameraConfig,
    pub minimap: MinimapConfig,
    pub animation: AnimationConfig,
}

impl GameConfig {
    /// Load overrides from a YAML file on top of the defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn with_asset_root(mut self, root: impl AsRef<Path>) -> Self {
        self.assets = self.assets.rebased(root.as_ref());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.character.scale <= 0.0 || self.maze.scale <= 0.0 {
            return Err(ConfigError::Invalid("scales must be positive".into()));
        }
        if self.character.speed < 0.0 {
            return Err(ConfigError::Invalid("character speed must not be negative".into()));
        }
        if self.camera.offset.length_squared() == 0.0 {
            return Err(ConfigError::Invalid("camera offset must not be zero".into()));
        }
        if self.animation.crossfade_seconds < 0.0 {
            return Err(ConfigError::Invalid("crossfade must not be negative".into()));
        }
        Ok(())
    }

    /// Indicator radius on the minimap.
    pub fn indicator_size(&self) -> f32 {
        self.character.radius() * self.minimap.indicator_scale
    }
}
