//! Turns raw channel-voice messages into `(Key, Velocity)` pairs.
//!
//! Note-on and sustain-pedal decoding is stateless; pitch-bend goes through
//! [`crate::bend`] and is edge-triggered on the wheel's zone.

use std::fmt;

use log::Level;

use crate::bend::{self, BendBucket};

pub type Velocity = u8;

/// Velocity attached to synthetic keys so they always clear the gate.
pub const FULL_VELOCITY: Velocity = 127;

const SUSTAIN_PEDAL: u8 = 64;

/// Lookup token derived from a decoded message.
///
/// Note numbers occupy `0..=127`; synthetic keys live at `10_000` and up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(pub i32);

impl Key {
    pub const SUSTAIN_ON: Key = Key(10_001);
    pub const SUSTAIN_OFF: Key = Key(10_002);
    pub const BEND_UP_FULL: Key = Key(10_003);
    pub const BEND_UP_HALF: Key = Key(10_004);
    pub const BEND_ZERO: Key = Key(10_005);
    pub const BEND_DOWN_HALF: Key = Key(10_006);
    pub const BEND_DOWN_FULL: Key = Key(10_007);

    pub fn note(note: u8) -> Self {
        Key(i32::from(note & 0x7F))
    }

    #[cfg(test)]
    pub fn is_synthetic(self) -> bool {
        self.0 >= 10_000
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Key::SUSTAIN_ON => write!(f, "sustain-on ({})", self.0),
            Key::SUSTAIN_OFF => write!(f, "sustain-off ({})", self.0),
            Key::BEND_UP_FULL => write!(f, "bend-up-full ({})", self.0),
            Key::BEND_UP_HALF => write!(f, "bend-up-half ({})", self.0),
            Key::BEND_ZERO => write!(f, "bend-zero ({})", self.0),
            Key::BEND_DOWN_HALF => write!(f, "bend-down-half ({})", self.0),
            Key::BEND_DOWN_FULL => write!(f, "bend-down-full ({})", self.0),
            Key(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NoteOn,
    ControlChange,
    PitchBend,
    Other,
}

impl Status {
    /// Classifies a status byte by its high nibble, on any channel.
    pub fn from_byte(status: u8) -> Self {
        match status & 0xF0 {
            0x90 => Status::NoteOn,
            0xB0 => Status::ControlChange,
            0xE0 => Status::PitchBend,
            _ => Status::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMidiEvent {
    pub status: Status,
    pub data1: u8,
    pub data2: u8,
    pub timestamp: i64,
}

impl RawMidiEvent {
    /// Builds an event from the bytes a transport delivers. Anything shorter
    /// than a full three-byte message is dropped.
    pub fn from_bytes(msg: &[u8], timestamp: i64) -> Option<Self> {
        if msg.len() < 3 {
            return None;
        }
        Some(Self {
            status: Status::from_byte(msg[0]),
            data1: msg[1] & 0x7F,
            data2: msg[2] & 0x7F,
            timestamp,
        })
    }
}

/// Decoder state that outlives a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderState {
    pub last_bend: BendBucket,
}

/// `diag` is the level ignored-controller and bend-transition lines log at.
pub fn decode(
    event: &RawMidiEvent,
    state: &mut DecoderState,
    diag: Level,
) -> Option<(Key, Velocity)> {
    match event.status {
        Status::NoteOn => Some((Key::note(event.data1), event.data2)),
        Status::ControlChange => {
            let controller = event.data1 & 0x7F;
            let value = event.data2 & 0x7F;
            if controller != SUSTAIN_PEDAL {
                log::log!(diag, "Ignoring CC#{controller} with value {value}");
                return None;
            }
            let key = if value == 0 {
                Key::SUSTAIN_OFF
            } else {
                Key::SUSTAIN_ON
            };
            Some((key, FULL_VELOCITY))
        }
        Status::PitchBend => {
            bend::quantize(event.data1, event.data2, state, diag)
                .map(|key| (key, FULL_VELOCITY))
        }
        Status::Other => None,
    }
}
