//! Owns everything mutable: decoder state, mapping tables, the enable flag and
//! the device connection.
//!
//! Decode and dispatch for one message run under a single lock, and profile
//! reloads take the same lock, so a message never sees a half-rebuilt table.
//! File reads and port scans happen before that lock is taken.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::Level;
use parking_lot::Mutex;

use crate::action::WorldCommand;
use crate::decoder::{DecoderState, RawMidiEvent, decode};
use crate::dispatch::{EngineConfig, dispatch};
use crate::error::EngineError;
use crate::mapping::{LoadMode, LoadReport, Mappings, TableKind};
use crate::midi::MidiLink;
use crate::ports;
use crate::profile::ProfileStore;
use crate::world::WorldSink;

#[derive(Debug, Default)]
pub struct EngineState {
    pub decoder: DecoderState,
    pub config: EngineConfig,
    pub mappings: Mappings,
}

pub enum ConnectionState {
    Disconnected,
    Connected(MidiLink),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub device: Option<String>,
    pub enabled: bool,
    pub config: EngineConfig,
    pub primary_keys: usize,
    pub secret_keys: usize,
}

/// The part the transport callback holds on to.
struct Shared {
    state: Mutex<EngineState>,
    enabled: AtomicBool,
    sink: Arc<dyn WorldSink>,
}

impl Shared {
    fn on_event(&self, event: RawMidiEvent) -> Vec<WorldCommand> {
        if !self.enabled.load(Ordering::Acquire) {
            return Vec::new();
        }
        let Some(reference) = self.sink.reference_position() else {
            return Vec::new();
        };

        let commands = {
            let mut state = self.state.lock();
            let EngineState {
                decoder,
                config,
                mappings,
            } = &mut *state;

            let diag = diag_level(config.debug_enabled);
            let Some((key, velocity)) = decode(&event, decoder, diag) else {
                return Vec::new();
            };
            log::log!(diag, "Key {key} velocity {velocity} @{}", event.timestamp);
            dispatch(
                key,
                velocity,
                reference,
                config,
                &mappings.primary,
                &mappings.secret,
            )
        };

        for command in &commands {
            self.sink.execute(command);
        }
        commands
    }
}

pub struct Engine {
    shared: Arc<Shared>,
    connection: Mutex<ConnectionState>,
    profiles: ProfileStore,
    port_filter: Option<String>,
}

impl Engine {
    pub fn new(config: EngineConfig, profiles: ProfileStore, sink: Arc<dyn WorldSink>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(EngineState {
                    config,
                    ..EngineState::default()
                }),
                enabled: AtomicBool::new(true),
                sink,
            }),
            connection: Mutex::new(ConnectionState::Disconnected),
            profiles,
            port_filter: None,
        }
    }

    /// Restricts `connect` to ports whose name contains `filter`.
    pub fn with_port_filter(mut self, filter: Option<String>) -> Self {
        self.port_filter = filter;
        self
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Runs one message through decode and dispatch, executing and returning
    /// the resulting commands.
    #[cfg(test)]
    pub fn handle(&self, event: RawMidiEvent) -> Vec<WorldCommand> {
        self.shared.on_event(event)
    }

    pub fn connect(&self) -> Result<String, EngineError> {
        let mut connection = self.connection.lock();
        if let ConnectionState::Connected(link) = &*connection {
            return Err(EngineError::AlreadyConnected(link.name().to_string()));
        }

        let (port, name) = ports::find_input_port(self.port_filter.as_deref())
            .map_err(transport)?
            .ok_or(EngineError::NoDevices)?;
        log::info!("Connecting with {name}");

        let shared = Arc::clone(&self.shared);
        let link = MidiLink::connect(&port, move |event| {
            shared.on_event(event);
        })
        .map_err(transport)?;

        *connection = ConnectionState::Connected(link);
        Ok(name)
    }

    pub fn disconnect(&self) -> Result<String, EngineError> {
        let mut connection = self.connection.lock();
        match std::mem::replace(&mut *connection, ConnectionState::Disconnected) {
            ConnectionState::Connected(link) => {
                let name = link.name().to_string();
                drop(link);
                log::info!("🎹 Disconnected {name}");
                Ok(name)
            }
            ConnectionState::Disconnected => Err(EngineError::NotConnected),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.connection.lock(), ConnectionState::Connected(_))
    }

    /// Soft enable. Disabled messages are dropped, not queued.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), EngineError> {
        if !self.is_connected() {
            return Err(EngineError::NotConnected);
        }
        self.shared.enabled.store(enabled, Ordering::Release);
        Ok(())
    }

    pub fn set_debug(&self, enabled: bool) {
        self.shared.state.lock().config.debug_enabled = enabled;
    }

    /// Loads a profile into the primary table, or into the secret overlay
    /// when `secret` is set.
    ///
    /// A secret load always starts from an empty overlay and turns it on; an
    /// empty name just turns it off. `mode` only applies to primary loads.
    pub fn load_profile(
        &self,
        name: &str,
        mode: LoadMode,
        secret: bool,
    ) -> Result<LoadReport, EngineError> {
        let (target, mode) = if secret {
            let mut state = self.shared.state.lock();
            state.mappings.secret.clear();
            if name.is_empty() {
                state.config.secret_enabled = false;
                log::info!("Secret overlay disabled");
                return Ok(LoadReport::default());
            }
            state.config.secret_enabled = true;
            (TableKind::Secret, LoadMode::Append)
        } else {
            (TableKind::Primary, mode)
        };

        let lines = self.profiles.read(name)?;

        let mut state = self.shared.state.lock();
        let EngineState {
            config, mappings, ..
        } = &mut *state;
        let report = mappings.load(
            lines.iter().map(String::as_str),
            target,
            mode,
            &mut config.velocity_threshold,
        )?;

        let level = diag_level(config.debug_enabled);
        for key in &report.duplicates {
            log::log!(level, "Skipping duplicate key {key}");
        }
        if let Some(threshold) = report.threshold {
            log::info!("Velocity threshold set to {threshold}");
        }
        log::info!(
            "Loaded '{name}' into {target:?} table ({} keys, {} duplicates skipped)",
            report.applied,
            report.duplicates.len()
        );
        Ok(report)
    }

    pub fn mappings(&self) -> Mappings {
        self.shared.state.lock().mappings.clone()
    }

    pub fn status(&self) -> EngineStatus {
        let device = match &*self.connection.lock() {
            ConnectionState::Connected(link) => Some(link.name().to_string()),
            ConnectionState::Disconnected => None,
        };
        let state = self.shared.state.lock();
        EngineStatus {
            device,
            enabled: self.shared.enabled.load(Ordering::Acquire),
            config: state.config,
            primary_keys: state.mappings.primary.len(),
            secret_keys: state.mappings.secret.len(),
        }
    }
}

// ───────────────────────────── helpers ─────────────────────────────────── //

fn diag_level(debug_enabled: bool) -> Level {
    if debug_enabled {
        Level::Info
    } else {
        Level::Debug
    }
}

fn transport(e: anyhow::Error) -> EngineError {
    EngineError::Transport(format!("{e:#}"))
}
