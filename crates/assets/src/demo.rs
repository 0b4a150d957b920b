//! Built-in maze for running without asset files.
//!
//! Coordinates are maze-local; the maze transform scales them like a loaded file.

use glam::Vec3;
use mazewalk_animation::Clip;
use mazewalk_common::{AnimationConfig, MazeConfig, MeshNode, TriangleMesh};

/// `#` is a wall cell, `S` the start cell. Row 0 is the -Z edge.
const LAYOUT: [&str; 11] = [
    "###########",
    "#S..#.....#",
    "#.#.#.###.#",
    "#.#...#...#",
    "#.#####.###",
    "#...#.....#",
    "###.#.###.#",
    "#...#.#...#",
    "#.###.#.#.#",
    "#.....#...#",
    "###########",
];

const CELL: f32 = 20.0;
const WALL_HEIGHT: f32 = 8.0;

fn half_extent() -> f32 {
    LAYOUT.len() as f32 * CELL / 2.0
}

fn cell_center(row: usize, col: usize) -> Vec3 {
    let half = half_extent();
    Vec3::new(
        -half + CELL * (col as f32 + 0.5),
        0.0,
        -half + CELL * (row as f32 + 0.5),
    )
}

/// Wall cuboids named `Wall_<row>_<col>` plus a `Floor` slab.
pub fn demo_maze() -> Vec<MeshNode> {
    let mut nodes: Vec<MeshNode> = LAYOUT
        .iter()
        .enumerate()
        .flat_map(|(row, line)| {
            line.chars()
                .enumerate()
                .filter(|(_, cell)| *cell == '#')
                .map(move |(col, _)| {
                    let center = cell_center(row, col) + Vec3::new(0.0, WALL_HEIGHT / 2.0, 0.0);
                    MeshNode::new(
                        format!("Wall_{row}_{col}"),
                        TriangleMesh::cuboid(
                            center,
                            Vec3::new(CELL / 2.0, WALL_HEIGHT / 2.0, CELL / 2.0),
                        ),
                    )
                })
        })
        .collect();

    let half = half_extent();
    nodes.push(MeshNode::new(
        "Floor",
        TriangleMesh::cuboid(Vec3::new(0.0, -0.5, 0.0), Vec3::new(half, 0.5, half)),
    ));
    nodes
}

/// World-space start position on the `S` cell under the given maze transform.
pub fn start_position(maze: &MazeConfig) -> Vec3 {
    let (row, col) = LAYOUT
        .iter()
        .enumerate()
        .find_map(|(row, line)| line.find('S').map(|col| (row, col)))
        .unwrap_or((1, 1));
    let local = cell_center(row, col);
    Vec3::new(local.x * maze.scale, maze.y_offset, local.z * maze.scale)
}

/// Timing-only stand-ins for the configured clips, so the state machine runs
/// without a character file.
pub fn demo_clips(animation: &AnimationConfig) -> Vec<Clip> {
    vec![
        Clip::new(animation.idle_clip.clone(), 2.0),
        Clip::new(animation.run_clip.clone(), 0.8),
        Clip::new(animation.action_clip.clone(), 1.2),
    ]
}
