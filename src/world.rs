//! Outbound side: whatever executes world commands.

use parking_lot::Mutex;

use crate::action::{Position, WorldCommand};

pub trait WorldSink: Send + Sync {
    /// Position offsets are resolved against. `None` drops the message.
    fn reference_position(&self) -> Option<Position>;

    fn execute(&self, command: &WorldCommand);
}

/// Sink that logs every command against a settable reference position.
pub struct LogSink {
    reference: Mutex<Option<Position>>,
}

impl LogSink {
    pub fn new(reference: Option<Position>) -> Self {
        Self {
            reference: Mutex::new(reference),
        }
    }

    pub fn set_reference(&self, reference: Option<Position>) {
        *self.reference.lock() = reference;
    }
}

impl WorldSink for LogSink {
    fn reference_position(&self) -> Option<Position> {
        *self.reference.lock()
    }

    fn execute(&self, command: &WorldCommand) {
        let (verb, face) = match *command {
            WorldCommand::InteractAt { face, .. } => ("interact", face),
            WorldCommand::StrikeAt { face, .. } => ("strike", face),
        };
        let p = command.position();
        log::info!("▶ {verb} ({}, {}, {}) face {face:?}", p.x, p.y, p.z);
    }
}

/// Collects commands instead of executing them.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    pub reference: Mutex<Option<Position>>,
    pub executed: Mutex<Vec<WorldCommand>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn at(reference: Position) -> Self {
        Self {
            reference: Mutex::new(Some(reference)),
            executed: Mutex::default(),
        }
    }

    pub fn take(&self) -> Vec<WorldCommand> {
        std::mem::take(&mut *self.executed.lock())
    }
}

#[cfg(test)]
impl WorldSink for RecordingSink {
    fn reference_position(&self) -> Option<Position> {
        *self.reference.lock()
    }

    fn execute(&self, command: &WorldCommand) {
        self.executed.lock().push(*command);
    }
}
