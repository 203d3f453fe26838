use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("MIDI device '{name}' not found")]
    DeviceNotFound { name: String },

    #[error("failed to initialise MIDI client: {0}")]
    MidiInit(#[from] midir::InitError),

    #[error("failed to query MIDI port: {0}")]
    PortInfo(#[from] midir::PortInfoError),

    #[error("failed to connect MIDI port: {0}")]
    Connect(String),

    #[error("failed to read config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("connection attempt cancelled")]
    Cancelled,

    #[error("Please provide a midi input name with -i or --input")]
    MissingInput,
}

pub type Result<T, E = RelayError> = std::result::Result<T, E>;
