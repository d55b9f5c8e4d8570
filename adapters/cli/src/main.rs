#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line driver for River Crossing.
//!
//! Loads the level files, runs a fixed-rate frame loop that feeds scripted
//! hero moves and pointer clicks into the world, reports the emitted events
//! and optionally saves the final session.

mod config;

use std::{collections::VecDeque, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use glam::DVec2;
use river_crossing_core::{Command, Event, Intent, VIRTUAL_HEIGHT, VIRTUAL_WIDTH};
use river_crossing_rendering::FrameSummary;
use river_crossing_system_controls::{Config as ControlsConfig, Controls, Input};
use river_crossing_system_frame_clock::{Config as FrameClockConfig, FrameClock};
use river_crossing_world::{self as world, query, Kind, Level, Phase, World};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::CrossingConfig;

/// Command-line flags; every setting overrides `crossing.toml`.
#[derive(Debug, Parser)]
#[command(name = "river-crossing", version, about = "Headless River Crossing driver")]
struct Cli {
    /// Settings file; defaults to `crossing.toml` when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the numbered level files.
    #[arg(long)]
    levels_dir: Option<PathBuf>,
    /// Directory level images are resolved against.
    #[arg(long)]
    images_dir: Option<PathBuf>,
    /// Level to start on.
    #[arg(long)]
    level: Option<usize>,
    /// Simulated seconds to run.
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,
    /// Hero moves issued once play begins, e.g. `forward,forward,left`.
    #[arg(long, value_enum, value_delimiter = ',')]
    moves: Vec<Move>,
    /// Seconds between scripted actions.
    #[arg(long, default_value_t = 0.5)]
    move_interval: f64,
    /// Pointer press in virtual pixels, `x,y`, issued after the moves.
    #[arg(long, value_parser = parse_point)]
    click: Vec<DVec2>,
    /// Disarm cars.
    #[arg(long)]
    road_cheat: bool,
    /// Disarm the river.
    #[arg(long)]
    river_cheat: bool,
    /// Write the final session to this file.
    #[arg(long)]
    save: Option<PathBuf>,
    /// Print events and the summary as JSON lines.
    #[arg(long)]
    json: bool,
}

/// Scripted hero move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Move {
    Forward,
    Backward,
    Left,
    Right,
}

impl From<Move> for Intent {
    fn from(value: Move) -> Self {
        match value {
            Move::Forward => Self::Forward,
            Move::Backward => Self::Backward,
            Move::Left => Self::Left,
            Move::Right => Self::Right,
        }
    }
}

/// Scheduled input, replayed in order while the level is being played.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Action {
    Move(Intent),
    Click(DVec2),
}

fn parse_point(value: &str) -> Result<DVec2, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{value}`"))?;
    let coordinate = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|error| format!("invalid coordinate `{part}`: {error}"))
    };
    Ok(DVec2::new(coordinate(x)?, coordinate(y)?))
}

/// Entry point for the River Crossing command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut config = CrossingConfig::discover(cli.config.as_deref())?;
    if let Some(levels_dir) = &cli.levels_dir {
        config.levels_dir.clone_from(levels_dir);
    }
    if let Some(images_dir) = &cli.images_dir {
        config.images_dir.clone_from(images_dir);
    }
    if let Some(level) = cli.level {
        config.start_level = level;
    }
    config.road_cheat |= cli.road_cheat;
    config.river_cheat |= cli.river_cheat;
    config.validate()?;

    run(&cli, &config)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn run(cli: &Cli, config: &CrossingConfig) -> Result<()> {
    let duration = Duration::try_from_secs_f64(cli.seconds)
        .with_context(|| format!("invalid --seconds {}", cli.seconds))?;
    let interval = Duration::try_from_secs_f64(cli.move_interval)
        .with_context(|| format!("invalid --move-interval {}", cli.move_interval))?;

    let mut world = World::new();
    info!("{}", query::welcome_banner(&world));
    for index in 0..config.level_count {
        let path = config.level_path(index);
        let level = Level::from_path(&path, &config.images_dir)
            .with_context(|| format!("failed to load level {}", path.display()))?;
        for warning in level.warnings() {
            warn!(level = index, "{warning}");
        }
        let _ = world.add_level(level);
    }

    let mut events = Vec::new();
    let mut commands = vec![
        Command::SetRoadCheat {
            enabled: config.road_cheat,
        },
        Command::SetRiverCheat {
            enabled: config.river_cheat,
        },
    ];
    world
        .load_level(config.start_level, &mut events)
        .with_context(|| format!("failed to start level {}", config.start_level))?;

    let mut actions: VecDeque<Action> = cli
        .moves
        .iter()
        .map(|step| Action::Move((*step).into()))
        .chain(cli.click.iter().copied().map(Action::Click))
        .collect();

    let mut clock = FrameClock::new(FrameClockConfig::new(config.max_step()));
    let controls = Controls::new(ControlsConfig::default());
    let frame_length = config.frame();
    let mut elapsed = Duration::ZERO;
    let mut since_action = Duration::ZERO;
    let mut summary = FrameSummary::default();

    while elapsed < duration {
        let frame = world.draw(VIRTUAL_WIDTH, VIRTUAL_HEIGHT);
        summary = frame.summary();

        clock.handle(frame_length, &mut commands);
        elapsed += frame_length;
        since_action += frame_length;

        if world.phase() == Phase::Playing && since_action >= interval {
            if let Some(action) = actions.pop_front() {
                since_action = Duration::ZERO;
                match action {
                    Action::Move(intent) => commands.push(Command::MoveHero { intent }),
                    Action::Click(position) => {
                        let surface = frame.viewport().to_surface(position);
                        controls.handle(
                            &[Input::PointerDown(surface)],
                            frame.viewport(),
                            &mut commands,
                        );
                    }
                }
            }
        }

        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut events);
        }
        report(cli.json, elapsed, &mut events)?;
    }

    if let Some(path) = &cli.save {
        world
            .save(path)
            .with_context(|| format!("failed to save session to {}", path.display()))?;
    }

    print_summary(cli.json, &world, config, &summary, actions.len())
}

fn report(as_json: bool, elapsed: Duration, events: &mut Vec<Event>) -> Result<()> {
    for event in events.drain(..) {
        if matches!(event, Event::TimeAdvanced { .. }) {
            continue;
        }
        if as_json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            println!("{:>8.3}s  {event:?}", elapsed.as_secs_f64());
        }
    }
    Ok(())
}

fn print_summary(
    as_json: bool,
    world: &World,
    config: &CrossingConfig,
    frame: &FrameSummary,
    pending_actions: usize,
) -> Result<()> {
    let panel = query::control_panel(world);
    let phase = query::phase(world);
    if as_json {
        let summary = json!({
            "phase": format!("{phase:?}"),
            "level": panel.level(),
            "timer": panel.timer_display(),
            "vehicles": query::count(world, Kind::Vehicle),
            "cargo": query::count(world, Kind::Cargo),
            "draw_ops": { "images": frame.images, "fills": frame.fills, "texts": frame.texts },
            "pending_actions": pending_actions,
            "config": config,
        });
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }

    println!("level {} {:?} after {}", panel.level(), phase, panel.timer_display());
    if let Some(message) = panel.message(phase) {
        println!("{message}");
    }
    println!(
        "{} vehicles, {} cargo, {} draw ops",
        query::count(world, Kind::Vehicle),
        query::count(world, Kind::Cargo),
        frame.images + frame.fills + frame.texts
    );
    if pending_actions > 0 {
        println!("{pending_actions} scripted actions were not issued");
    }
    Ok(())
}
