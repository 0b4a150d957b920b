use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mazewalk_assets::{demo, load_scene};
use mazewalk_common::{Collider, GameConfig};
use mazewalk_input::{Action, InputState, KeyBindings};
use mazewalk_kernel::{FrameReport, Session, World};
use mazewalk_render::{DebugTextRenderer, RenderView, Renderer};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mazewalk-cli", about = "Headless tools for the maze walkthrough")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML file overriding the built-in configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run the frame update without a window
    Simulate {
        /// glTF/GLB maze; the built-in maze is used when omitted
        #[arg(short, long)]
        maze: Option<PathBuf>,
        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,
        /// Seconds per frame
        #[arg(long, default_value = "0.016")]
        dt: f32,
        /// Keys held for the whole run, comma separated (e.g. "w,d")
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,
        /// Frame on which the action key is tapped
        #[arg(short, long)]
        action_frame: Option<u64>,
        /// Write every frame report to this file as JSON
        #[arg(short, long)]
        trace: Option<PathBuf>,
        /// Print a frame summary every N frames
        #[arg(long, default_value = "30")]
        every: u64,
    },
    /// List the collidable walls of a maze file
    Walls {
        /// glTF/GLB maze
        maze: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    match path {
        Some(path) => GameConfig::from_yaml_file(path)
            .with_context(|| format!("reading configuration {}", path.display())),
        None => Ok(GameConfig::default()),
    }
}

fn load_world(maze: Option<&Path>, config: &mut GameConfig) -> Result<World> {
    match maze {
        Some(path) => {
            let nodes = load_scene(path).with_context(|| format!("loading maze {}", path.display()))?;
            Ok(World::from_nodes(nodes, &config.maze))
        }
        None => {
            config.character.initial_position = demo::start_position(&config.maze);
            Ok(World::from_nodes(demo::demo_maze(), &config.maze))
        }
    }
}

/// Drive `session` with `keys` held throughout and the action key tapped on `action_frame`.
fn run_frames(
    session: &mut Session,
    frames: u64,
    dt: f32,
    keys: &[String],
    action_frame: Option<u64>,
    mut on_frame: impl FnMut(&Session, &FrameReport),
) -> Vec<FrameReport> {
    let mut input = InputState::new();
    for key in keys {
        input.key_down(key);
    }
    let action_key = KeyBindings::default()
        .keys_for(Action::TriggerAction)
        .next()
        .map(str::to_string);

    let mut reports = Vec::with_capacity(frames as usize);
    for frame in 1..=frames {
        let tapped = action_frame == Some(frame);
        if let (true, Some(key)) = (tapped, &action_key) {
            input.key_down(key);
        }
        let report = session.update(dt, &input);
        if let (true, Some(key)) = (tapped, &action_key) {
            input.key_up(key);
        }
        on_frame(session, &report);
        reports.push(report);
    }
    reports
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("mazewalk-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("input: {}", mazewalk_input::crate_info());
            println!("animation: {}", mazewalk_animation::crate_info());
            println!("assets: {}", mazewalk_assets::crate_info());
            println!("render: {}", mazewalk_render::crate_info());
            let config = load_config(cli.config.as_deref())?;
            println!(
                "kernel: speed={} height={:.1} radius={:.1} camera distance={:.1}",
                config.character.speed,
                config.character.height(),
                config.character.radius(),
                config.camera.preferred_distance()
            );
        }
        Commands::Simulate {
            maze,
            frames,
            dt,
            keys,
            action_frame,
            trace,
            every,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            let world = load_world(maze.as_deref(), &mut config)?;
            let clips = demo::demo_clips(&config.animation);
            let mut session = Session::new(config, world, clips);

            println!(
                "Simulating {frames} frames at dt={dt}s, keys={keys:?}, action frame={action_frame:?}"
            );
            let text = DebugTextRenderer::new();
            let every = every.max(1);
            let reports = run_frames(&mut session, frames, dt, &keys, action_frame, |s, report| {
                if report.frame % every == 0 {
                    print!("{}", text.render(s, &RenderView::from_session(s)));
                }
            });

            let blocked = reports
                .iter()
                .filter(|r| r.movement.trying_to_move && !r.movement.moving)
                .count();
            println!(
                "Done: frames={}, blocked frames={blocked}, final position={}",
                session.frame_count(),
                session.character().position()
            );

            if let Some(path) = trace {
                let file = File::create(&path)
                    .with_context(|| format!("creating trace {}", path.display()))?;
                serde_json::to_writer_pretty(BufWriter::new(file), &reports)?;
                println!("Trace written to {}", path.display());
            }
        }
        Commands::Walls { maze } => {
            let mut config = load_config(cli.config.as_deref())?;
            let world = load_world(Some(&maze), &mut config)?;
            println!(
                "{}: {} walls of {} surfaces",
                maze.display(),
                world.walls().len(),
                world.surface_count()
            );
            for wall in world.walls() {
                let b = wall.world_aabb();
                println!(
                    "  {:<24} min=({:.1}, {:.1}, {:.1}) max=({:.1}, {:.1}, {:.1})",
                    wall.name, b.min.x, b.min.y, b.min.z, b.max.x, b.max.y, b.max.z
                );
            }
            let bounds = world.bounds();
            if !bounds.is_empty() {
                println!("Bounds: min={} max={}", bounds.min, bounds.max);
            }
        }
    }

    Ok(())
}
