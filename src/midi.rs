//! Input connection: hands every raw MIDI message to a callback as a
//! `RawMidiEvent`.

use anyhow::{Result, anyhow};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};

use crate::decoder::RawMidiEvent;

const CLIENT_NAME: &str = "midi-trigger";

pub struct MidiLink {
    name: String,
    _conn: MidiInputConnection<()>, // RAII – closes the port on drop
}

impl MidiLink {
    pub fn connect<F>(port: &MidiInputPort, mut on_event: F) -> Result<Self>
    where
        F: FnMut(RawMidiEvent) + Send + 'static,
    {
        let mut midi_in = MidiInput::new(CLIENT_NAME)?;
        midi_in.ignore(Ignore::None);

        let name = midi_in.port_name(port)?;
        let conn = midi_in
            .connect(
                port,
                CLIENT_NAME,
                move |stamp, msg, _| {
                    if let Some(ev) = RawMidiEvent::from_bytes(msg, timestamp(stamp)) {
                        on_event(ev);
                    }
                },
                (),
            )
            .map_err(|e| anyhow!("connect {name}: {e}"))?;

        log::info!("🎹 Connected to {name}");
        Ok(Self { name, _conn: conn })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

// ─────────────────── helpers ─────────────────────────────────────────────────

fn timestamp(stamp_us: u64) -> i64 {
    i64::try_from(stamp_us).unwrap_or(i64::MAX)
}
