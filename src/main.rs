mod action;
mod bend;
mod cli;
mod decoder;
mod dispatch;
mod engine;
mod error;
mod mapping;
mod midi;
mod ports;
mod profile;
mod world;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::action::Position;
use crate::dispatch::{DEFAULT_VELOCITY_THRESHOLD, EngineConfig};
use crate::engine::Engine;
use crate::mapping::LoadMode;
use crate::profile::ProfileStore;
use crate::world::LogSink;

/// Turn MIDI keys, the sustain pedal and the pitch wheel into block
/// interactions around a reference position.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding profile files
    #[arg(long, env = "MIDI_TRIGGER_PROFILE_DIR")]
    profile_dir: Option<PathBuf>,

    /// Only connect to input ports whose name contains this (case-insensitive)
    #[arg(short, long, env = "MIDI_TRIGGER_PORT")]
    port: Option<String>,

    /// Profile to load at start-up
    #[arg(long)]
    profile: Option<String>,

    /// Connect to the first matching input port at start-up
    #[arg(long)]
    connect: bool,

    /// Minimum note-on velocity that triggers anything
    #[arg(long, default_value_t = DEFAULT_VELOCITY_THRESHOLD)]
    velocity_threshold: u8,

    /// Report key and duplicate diagnostics at info level
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let profile_dir = args.profile_dir.unwrap_or_else(ProfileStore::default_dir);
    std::fs::create_dir_all(&profile_dir)
        .with_context(|| format!("create profile dir {:?}", profile_dir))?;
    log::info!("🖖 Using profiles in {:?}", profile_dir);

    let config = EngineConfig {
        velocity_threshold: args.velocity_threshold,
        debug_enabled: args.debug,
        ..EngineConfig::default()
    };
    let sink = Arc::new(LogSink::new(Some(Position::default())));
    let engine = Engine::new(config, ProfileStore::new(profile_dir), sink.clone())
        .with_port_filter(args.port);

    if let Some(name) = &args.profile {
        if let Err(e) = engine.load_profile(name, LoadMode::Replace, false) {
            log::error!("Failed to load profile: {e}");
        }
    }
    if args.connect {
        if let Err(e) = engine.connect() {
            log::warn!("{e}");
        }
    }

    cli::run_repl(&engine, &sink)?;

    if engine.is_connected() {
        engine.disconnect()?;
    }
    Ok(())
}
