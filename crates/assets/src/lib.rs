//! Asset loading: the maze, the character and its animation clips.
//!
//! Every file is requested at once, each on its own scoped thread, and
//! [`load_all`] returns only after all of them have finished.
//!
//! # Failure model
//! - Maze or character failure is fatal: the whole load fails.
//! - A clip that is missing or has no animation is logged and left out.
//! - Nothing is retried.

pub mod demo;
mod import;

pub use import::{load_clip, load_scene};

use mazewalk_animation::Clip;
use mazewalk_common::{AssetPaths, MeshNode};
use std::path::PathBuf;
use std::thread::ScopedJoinHandle;

/// Errors from asset loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("glTF error in {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("{path} contains no animation")]
    NoAnimation { path: PathBuf },
    #[error("maze failed to load: {0}")]
    Maze(#[source] Box<AssetError>),
    #[error("character failed to load: {0}")]
    Character(#[source] Box<AssetError>),
    #[error("loader for {0} panicked")]
    LoaderPanicked(String),
}

/// Everything the walkthrough needs before its first frame.
#[derive(Debug, Clone)]
pub struct LoadedAssets {
    pub maze: Vec<MeshNode>,
    pub character: Vec<MeshNode>,
    /// Only the clips that loaded.
    pub clips: Vec<Clip>,
}

impl LoadedAssets {
    /// The built-in maze with no character mesh and no clips.
    pub fn demo() -> Self {
        Self {
            maze: demo::demo_maze(),
            character: Vec::new(),
            clips: Vec::new(),
        }
    }
}

/// Load every configured asset concurrently.
pub fn load_all(paths: &AssetPaths) -> Result<LoadedAssets, AssetError> {
    tracing::info!(
        clips = paths.clips.len(),
        "loading maze {} and character {}",
        paths.maze.display(),
        paths.character.display()
    );

    std::thread::scope(|scope| {
        let maze_path = &paths.maze;
        let character_path = &paths.character;
        let maze = scope.spawn(move || load_scene(maze_path));
        let character = scope.spawn(move || load_scene(character_path));
        let clips: Vec<_> = paths
            .clips
            .iter()
            .map(|(name, path)| (name, scope.spawn(move || load_clip(name, path))))
            .collect();

        let maze = joined(maze, "maze").map_err(|err| {
            tracing::error!("maze failed to load: {err}");
            AssetError::Maze(Box::new(err))
        });
        let character = joined(character, "character").map_err(|err| {
            tracing::error!("character failed to load: {err}");
            AssetError::Character(Box::new(err))
        });

        let mut loaded = Vec::with_capacity(clips.len());
        for (name, handle) in clips {
            match joined(handle, name) {
                Ok(clip) => {
                    tracing::debug!(clip = %name, duration = clip.duration, "clip loaded");
                    loaded.push(clip);
                }
                Err(err) => tracing::warn!(clip = %name, "animation clip unavailable: {err}"),
            }
        }

        let assets = LoadedAssets {
            maze: maze?,
            character: character?,
            clips: loaded,
        };
        tracing::info!(
            maze_nodes = assets.maze.len(),
            clips = assets.clips.len(),
            "assets loaded"
        );
        Ok(assets)
    })
}

fn joined<T>(
    handle: ScopedJoinHandle<'_, Result<T, AssetError>>,
    what: &str,
) -> Result<T, AssetError> {
    handle
        .join()
        .unwrap_or_else(|_| Err(AssetError::LoaderPanicked(what.to_string())))
}

pub fn crate_info() -> &'static str {
    "mazewalk-assets v0.1.0"
}
