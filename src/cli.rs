//! Interactive control surface.

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::action::Position;
use crate::engine::Engine;
use crate::mapping::{LoadMode, TableKind};
use crate::ports;
use crate::world::LogSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Enable,
    Disable,
    Connect,
    Disconnect,
    Load {
        name: String,
        mode: LoadMode,
        secret: bool,
    },
    Profiles,
    Ports,
    Keys,
    Debug(bool),
    Position(Option<Position>),
    Status,
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  connect | disconnect          bind or release the MIDI input device
  enable | disable              start or stop reacting to messages
  load <file> [append|secret]   load a profile (load \"\" secret turns the overlay off)
  secret off                    clear and disable the secret overlay
  profiles | ports              list profile files / MIDI inputs
  keys                          show the loaded mappings
  debug on|off                  show key, controller, bend and duplicate diagnostics
  pos <x> <y> <z> | pos none    set the reference position
  status | help | quit";

pub fn parse_command(line: &str) -> Result<Command, String> {
    let words = split_words(line)?;
    let args: Vec<&str> = words.iter().map(String::as_str).collect();

    Ok(match args.as_slice() {
        ["enable"] => Command::Enable,
        ["disable"] => Command::Disable,
        ["connect"] => Command::Connect,
        ["disconnect"] => Command::Disconnect,
        ["load", name] => load(name, LoadMode::Replace, false),
        ["load", name, "append"] => load(name, LoadMode::Append, false),
        ["load", name, "secret"] => load(name, LoadMode::Append, true),
        ["secret", "off"] => load("", LoadMode::Append, true),
        ["profiles"] => Command::Profiles,
        ["ports"] => Command::Ports,
        ["keys"] => Command::Keys,
        ["debug", "on"] => Command::Debug(true),
        ["debug", "off"] => Command::Debug(false),
        ["pos", "none"] => Command::Position(None),
        ["pos", x, y, z] => {
            let coord = |s: &str| s.parse::<i32>().map_err(|_| format!("bad coordinate {s:?}"));
            Command::Position(Some(Position::new(coord(*x)?, coord(*y)?, coord(*z)?)))
        }
        ["status"] => Command::Status,
        ["help"] | ["?"] => Command::Help,
        ["quit"] | ["exit"] => Command::Quit,
        [] => return Err(String::new()),
        _ => return Err(format!("unknown command: {}", line.trim())),
    })
}

pub fn run_repl(engine: &Engine, sink: &LogSink) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{HELP}");

    loop {
        let line = match rl.readline("midi> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        rl.add_history_entry(line.as_str())?;

        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => execute(engine, sink, command),
            Err(msg) if msg.is_empty() => {}
            Err(msg) => log::warn!("{msg} (try `help`)"),
        }
    }

    Ok(())
}

fn execute(engine: &Engine, sink: &LogSink, command: Command) {
    match command {
        Command::Enable => match engine.set_enabled(true) {
            Ok(()) => log::info!("Enabled"),
            Err(e) => log::warn!("{e}"),
        },
        Command::Disable => match engine.set_enabled(false) {
            Ok(()) => log::info!("Disabled"),
            Err(e) => log::warn!("{e}"),
        },
        Command::Connect => {
            if let Err(e) = engine.connect() {
                log::warn!("{e}");
            }
        }
        Command::Disconnect => {
            if let Err(e) = engine.disconnect() {
                log::warn!("{e}");
            }
        }
        Command::Load { name, mode, secret } => {
            log::info!("Reloading key mappings");
            if let Err(e) = engine.load_profile(&name, mode, secret) {
                log::error!("Failed to load profile: {e}");
            }
        }
        Command::Profiles => match engine.profiles().list() {
            Ok(names) if names.is_empty() => {
                log::info!("No profiles in {}", engine.profiles().dir().display())
            }
            Ok(names) => names.iter().for_each(|n| println!("  {}", quote(n))),
            Err(e) => log::warn!("Cannot list {}: {e}", engine.profiles().dir().display()),
        },
        Command::Ports => match ports::list_input_ports() {
            Ok(names) if names.is_empty() => log::info!("No MIDI input ports"),
            Ok(names) => names.iter().for_each(|n| println!("  {n}")),
            Err(e) => log::warn!("Cannot list ports: {e:#}"),
        },
        Command::Keys => {
            let mappings = engine.mappings();
            for kind in [TableKind::Primary, TableKind::Secret] {
                let table = mappings.table(kind);
                println!("{kind:?}:{}", if table.is_empty() { " (empty)" } else { "" });
                for (key, entry) in table.iter() {
                    let o = entry.offset;
                    let code = entry.action.code();
                    println!("  {key} -> ({}, {}, {}) action {code}", o.dx, o.dy, o.dz);
                }
            }
        }
        Command::Debug(on) => {
            engine.set_debug(on);
            log::info!("Debug messages {}", if on { "on" } else { "off" });
        }
        Command::Position(reference) => {
            sink.set_reference(reference);
            log::info!("Reference position {reference:?}");
        }
        Command::Status => {
            let s = engine.status();
            println!("device: {}", s.device.as_deref().unwrap_or("none"));
            println!("enabled: {}", s.enabled);
            println!("velocity threshold: {}", s.config.velocity_threshold);
            println!("secret: {} ({} keys)", s.config.secret_enabled, s.secret_keys);
            println!("primary: {} keys", s.primary_keys);
            println!("debug: {}", s.config.debug_enabled);
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
}

// ───────────────────────────── helpers ─────────────────────────────────── //

fn load(name: &str, mode: LoadMode, secret: bool) -> Command {
    Command::Load {
        name: name.to_string(),
        mode,
        secret,
    }
}

fn quote(name: &str) -> String {
    if name.contains(' ') {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}

/// Whitespace split that keeps `"quoted words"` together.
fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    words.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if !current.is_empty() || quoted {
        words.push(current);
    }
    Ok(words)
}
