//! Shared types for the maze walkthrough: geometry capability, transforms, configuration.
//!
//! # Invariants
//! - Bounding boxes are always derived from current transforms, never cached.
//! - Configuration defaults are compile-time constants; YAML only overrides them.

pub mod config;
pub mod geometry;
mod types;

pub use config::{
    AnimationConfig, AssetPaths, CameraConfig, CharacterConfig, ConfigError, GameConfig,
    MazeConfig, MinimapConfig,
};
pub use geometry::{Aabb, Collider, MeshNode, Ray, TriangleMesh};
pub use types::Transform;
