//! Walkthrough kernel: the state a frame update reads and writes, and the update itself.
//!
//! # Invariants
//! - The wall set is fixed after load; every per-frame consumer only reads it.
//! - The character's bounding box is derived from its current position on every query.
//! - Collision correction only ever zeroes an axis, never amplifies it.
//! - All state is owned by a [`Session`] and passed explicitly; no globals.

pub mod camera_rig;
pub mod character;
pub mod collision;
pub mod controller;
pub mod orbit;
pub mod session;
pub mod world;

pub use camera_rig::{CameraRig, RigFrame};
pub use character::{AnimState, Character};
pub use collision::{CharacterBody, allowed_displacement};
pub use controller::{CharacterController, MoveReport};
pub use orbit::OrbitCamera;
pub use session::{FrameReport, Session};
pub use world::World;
