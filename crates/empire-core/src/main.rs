//! Agents of Empire headless runner
//!
//! Builds the starting world, then feeds the simulation a fixed frame delta
//! the way a renderer would, optionally logging every event as JSONL and
//! writing a final snapshot.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use empire_core::events::EventLogger;
use empire_core::output::{compute_stats, generate_snapshot, write_snapshot};
use empire_core::setup::{create_world, populate};
use empire_core::{Config, Simulation};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "empire_sim")]
#[command(about = "Headless Agents of Empire simulation")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of rendered frames to simulate
    #[arg(long, default_value_t = 1800)]
    frames: u64,

    /// Wall-clock length of one frame in milliseconds
    #[arg(long, default_value_t = 16.667)]
    frame_ms: f64,

    /// Agents spawned around the Command Center
    #[arg(long, default_value_t = 5)]
    agents: usize,

    /// Dragons spawned next to random agents
    #[arg(long, default_value_t = 1)]
    dragons: usize,

    /// TOML tuning file; `empire.toml` in the working directory if omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write every event to this JSONL file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Write the final world snapshot to this JSON file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Log state transitions and other debug detail
    #[arg(long)]
    verbose: bool,
}

/// Frame length from `--frame-ms`; negative, NaN and overflowing values are errors
fn frame_delta(frame_ms: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(frame_ms / 1000.0)
        .with_context(|| format!("invalid --frame-ms {}", frame_ms))
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_or_default(),
    };
    let frame_delta = frame_delta(args.frame_ms)?;

    tracing::info!(
        "Starting simulation: seed {}, {} frames of {:?}",
        args.seed,
        args.frames,
        frame_delta
    );

    let mut sim = Simulation::new(config, args.seed);
    if let Some(path) = &args.events {
        let logger = EventLogger::new(path)
            .with_context(|| format!("opening event log {}", path.display()))?;
        sim.store_mut().attach_logger(logger);
    }

    create_world(sim.store_mut()).context("creating world")?;
    populate(sim.store_mut(), args.agents, args.dragons).context("spawning agents")?;

    let mut clamped_frames = 0u64;
    let mut event_count = 0usize;
    for frame in 0..args.frames {
        let report = sim.advance_frame(frame_delta);
        if report.clamped {
            clamped_frames += 1;
        }
        event_count += sim.take_events().len();
        if frame > 0 && frame % 600 == 0 {
            let store = sim.store();
            let stats = compute_stats(store);
            tracing::info!(
                "[{}] tick {}: {} active / {} idle agents",
                store.clock().game_clock(),
                store.clock().current_tick,
                stats.active_agents,
                stats.idle_agents
            );
        }
    }

    event_count += sim.take_events().len();
    sim.store_mut()
        .flush_logger()
        .context("flushing event log")?;

    if let Some(path) = &args.snapshot {
        let snapshot = generate_snapshot(sim.store_mut());
        write_snapshot(&snapshot, path)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
        tracing::info!("Wrote {} to {}", snapshot.snapshot_id, path.display());
    }

    let store = sim.store();
    let stats = compute_stats(store);
    tracing::info!(
        "Simulation complete: {} ticks ({}), {} events, {} clamped frames",
        store.clock().current_tick,
        store.clock().game_clock(),
        event_count,
        clamped_frames
    );
    tracing::info!(
        "{} agents ({} active), {} dragons, {} quests completed, average level {:.1}",
        stats.total_agents,
        stats.active_agents,
        stats.total_dragons,
        stats.completed_quests,
        stats.average_level
    );
    Ok(())
}
