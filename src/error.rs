use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseReason {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid integer in field `{field}`: {value:?}")]
    BadInteger { field: &'static str, value: String },

    #[error("action {0} is out of range (-1..=4)")]
    ActionOutOfRange(i32),
}

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("profile '{0}' not found")]
    NotFound(String),

    #[error("failed to read profile '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {reason} in {content:?}")]
    Parse {
        line: usize,
        content: String,
        reason: ParseReason,
    },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("no device connected")]
    NotConnected,

    #[error("already connected to {0}")]
    AlreadyConnected(String),

    #[error("no MIDI input devices found")]
    NoDevices,

    #[error("transport: {0}")]
    Transport(String),

    #[error(transparent)]
    Profile(#[from] ProfileError),
}
